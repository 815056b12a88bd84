//! Enable/disable state machine shared by the lookup services

use crate::error::{LookupError, Result};
use crate::service::ServiceState;
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{info, warn};

/// Owns the resources `R` a service holds while enabled
///
/// Lookups hold a read guard for their whole duration. `enable` and `disable`
/// take the write lock, so a transition waits for in-flight lookups and no
/// lookup observes a half-built state.
pub struct Lifecycle<R> {
    name: &'static str,
    resources: RwLock<Option<R>>,
    state: AtomicU8,
}

impl<R> Lifecycle<R> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            resources: RwLock::new(None),
            state: AtomicU8::new(encode(ServiceState::Disabled)),
        }
    }

    pub fn state(&self) -> ServiceState {
        decode(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: ServiceState) {
        self.state.store(encode(state), Ordering::Release);
    }

    /// Read access to the enabled resources
    ///
    /// Fails with [`LookupError::NotReady`] unless the service is enabled.
    pub async fn read(&self) -> Result<RwLockReadGuard<'_, R>> {
        let guard = self.resources.read().await;
        RwLockReadGuard::try_map(guard, Option::as_ref)
            .map_err(|_| LookupError::NotReady(self.state()))
    }

    /// Build fresh resources with `init`, replacing any current ones
    ///
    /// `init` receives the resources of the previous enable, if any, so state
    /// that survives reconfiguration can be carried over. On failure the
    /// service is left disabled.
    pub async fn enable<F, Fut>(&self, init: F) -> Result<()>
    where
        F: FnOnce(Option<R>) -> Fut,
        Fut: Future<Output = Result<R>>,
    {
        let mut resources = self.resources.write().await;
        self.set_state(ServiceState::Enabling);

        match init(resources.take()).await {
            Ok(enabled) => {
                *resources = Some(enabled);
                self.set_state(ServiceState::Enabled);
                info!("{} enabled", self.name);
                Ok(())
            }
            Err(e) => {
                self.set_state(ServiceState::Disabled);
                warn!("{} failed to enable: {}", self.name, e);
                Err(e)
            }
        }
    }

    /// Release the resources through `teardown` and return to disabled
    ///
    /// Disabling an already disabled service is a no-op.
    pub async fn disable<F, Fut>(&self, teardown: F)
    where
        F: FnOnce(R) -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut resources = self.resources.write().await;
        let Some(current) = resources.take() else {
            return;
        };

        self.set_state(ServiceState::Disabling);
        teardown(current).await;
        self.set_state(ServiceState::Disabled);
        info!("{} disabled", self.name);
    }
}

fn encode(state: ServiceState) -> u8 {
    match state {
        ServiceState::Disabled => 0,
        ServiceState::Enabling => 1,
        ServiceState::Enabled => 2,
        ServiceState::Disabling => 3,
    }
}

fn decode(raw: u8) -> ServiceState {
    match raw {
        1 => ServiceState::Enabling,
        2 => ServiceState::Enabled,
        3 => ServiceState::Disabling,
        _ => ServiceState::Disabled,
    }
}
