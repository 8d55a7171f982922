//! Domain layer: pet countdowns, kingdom signups and the clock they read.
//!
//! Nothing here touches storage. Entries convert to and from the flat
//! string field maps the store holds, and remaining time is a pure function
//! of an entry and an instant.

pub mod clock;
pub mod kingdom;
pub mod pet;

pub use clock::{Clock, ManualClock, SystemClock};
pub use kingdom::{FactionSet, KingdomEntry, KingdomSignup, KingdomType};
pub use pet::{NewPet, PetEntry, PetSnapshot, compute_remaining};
