//! Service layer: registries and the background expiry sweeper.
//!
//! [`PetRegistry`] and [`KingdomRegistry`] hold no state of their own; they
//! validate input, talk to the [`crate::storage::KeyValueStore`] and log
//! what changed. [`ExpirySweeper`] drives [`PetRegistry::sweep_expired`] on
//! a timer.

pub mod kingdom_registry;
pub mod pet_registry;
pub mod sweeper;

pub use kingdom_registry::KingdomRegistry;
pub use pet_registry::{PetRegistry, SweepReport};
pub use sweeper::ExpirySweeper;
