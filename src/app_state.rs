//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::api::rate_limit::IpRateLimiter;
use crate::config::AppConfig;
use crate::domain::{Clock, FactionSet};
use crate::service::{KingdomRegistry, PetRegistry};
use crate::storage::KeyValueStore;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Pet countdown registry.
    pub pet_registry: Arc<PetRegistry>,
    /// Kingdom signup registry.
    pub kingdom_registry: Arc<KingdomRegistry>,
    /// Storage handle, used by the health check.
    pub store: Arc<dyn KeyValueStore>,
    /// Per-IP request limiter.
    pub rate_limiter: Arc<IpRateLimiter>,
}

impl AppState {
    /// Wires registries and the rate limiter over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, config: &AppConfig) -> Self {
        let pet_registry = Arc::new(PetRegistry::new(
            Arc::clone(&store),
            clock,
            config.pet_ttl_secs,
        ));
        let kingdom_registry = Arc::new(KingdomRegistry::new(
            Arc::clone(&store),
            FactionSet::new(config.kingdom_factions.iter().cloned()),
        ));
        let rate_limiter = Arc::new(IpRateLimiter::new(
            config.rate_limit_burst,
            std::time::Duration::from_secs(config.rate_limit_window_secs),
        ));

        Self {
            pet_registry,
            kingdom_registry,
            store,
            rate_limiter,
        }
    }
}
