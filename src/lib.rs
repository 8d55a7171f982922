//! # pet-kingdom-board
//!
//! HTTP service behind a community game board: players post timed pets
//! that count down to zero, and kingdoms register in a shared directory.
//!
//! Remaining time is never stored. Each pet records its start time and
//! duration, and every read computes
//! `max(start_time + duration - now, 0)` via
//! [`domain::pet::compute_remaining`]. A background sweeper only reclaims
//! storage for entries that ran out.
//!
//! ## Architecture
//!
//! ```text
//! Browser pages (static/)
//!     │
//!     ├── Handlers + DTOs (api/)
//!     ├── Rate limit, trace, timeout, CORS, panic layers (api/)
//!     │
//!     ├── PetRegistry / KingdomRegistry (service/)
//!     ├── ExpirySweeper (service/)
//!     │
//!     ├── Entries, validation, Clock (domain/)
//!     │
//!     └── KeyValueStore: MemoryStore | PostgresStore (storage/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod shutdown;
pub mod storage;
