//! Shared helpers for integration tests
#![allow(dead_code)]

pub mod mocks;

use record_lookup::{Coordinates, Value};
use std::collections::HashMap;
use std::sync::Once;

static TRACING: Once = Once::new();

/// Install a test subscriber honouring `RUST_LOG`
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn coordinates(pairs: &[(&str, Value)]) -> Coordinates {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Lookup context carrying `token` as the correlation token
pub fn context(token: &str) -> HashMap<String, String> {
    HashMap::from([("uuid".to_string(), token.to_string())])
}

/// Fresh random correlation token
pub fn new_token() -> String {
    uuid::Uuid::new_v4().to_string()
}
