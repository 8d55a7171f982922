//! Background task that reclaims expired pet entries on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::pet_registry::{PetRegistry, SweepReport};
use crate::error::AppError;

/// Periodic expiry sweep over a [`PetRegistry`].
#[derive(Debug, Clone)]
pub struct ExpirySweeper {
    registry: Arc<PetRegistry>,
    interval: Duration,
}

impl ExpirySweeper {
    /// Creates a sweeper that runs every `interval`.
    #[must_use]
    pub fn new(registry: Arc<PetRegistry>, interval: Duration) -> Self {
        Self {
            registry,
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    /// Runs a single sweep pass.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] if the registry could not complete the pass.
    pub async fn run_cycle(&self) -> Result<SweepReport, AppError> {
        let report = self.registry.sweep_expired().await?;
        if !report.is_empty() {
            tracing::info!(
                reclaimed = report.reclaimed,
                orphaned = report.orphaned,
                purged = report.purged,
                "expiry sweep reclaimed entries"
            );
        }
        Ok(report)
    }

    /// Spawns the sweep loop. It stops once `shutdown` flips to `true` or
    /// its sender is dropped.
    ///
    /// A failed pass is logged and retried on the next tick.
    #[must_use]
    pub fn start(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(interval_secs = self.interval.as_secs(), "expiry sweeper started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.run_cycle().await {
                            tracing::warn!(error = %e, "expiry sweep failed");
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::info!("expiry sweeper stopped");
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::clock::{Clock, ManualClock};
    use crate::domain::pet::NewPet;
    use crate::storage::{KeyValueStore, MemoryStore};

    fn sweeper(clock: &Arc<ManualClock>) -> (Arc<PetRegistry>, ExpirySweeper) {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let registry = Arc::new(PetRegistry::new(
            store,
            Arc::clone(clock) as Arc<dyn Clock>,
            60,
        ));
        let sweeper = ExpirySweeper::new(Arc::clone(&registry), Duration::from_millis(10));
        (registry, sweeper)
    }

    #[tokio::test]
    async fn cycle_reclaims_expired_pets() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let (registry, sweeper) = sweeper(&clock);
        let Ok(pet) = NewPet::new("Drake", "Amy", "UTC", 1) else {
            panic!("valid pet");
        };
        let _ = registry.add_or_replace_pet(pet).await;

        assert!(matches!(sweeper.run_cycle().await, Ok(r) if r.is_empty()));
        clock.advance(chrono::Duration::seconds(61));
        assert!(matches!(sweeper.run_cycle().await, Ok(r) if r.reclaimed == 1));
    }

    #[tokio::test]
    async fn loop_stops_on_shutdown() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let (_registry, sweeper) = sweeper(&clock);
        let (tx, rx) = watch::channel(false);

        let handle = sweeper.start(rx);
        tokio::time::sleep(Duration::from_millis(30)).await;
        let _ = tx.send(true);

        let joined = tokio::time::timeout(Duration::from_secs(1), handle).await;
        assert!(matches!(joined, Ok(Ok(()))));
    }
}
