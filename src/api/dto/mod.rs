//! Data Transfer Objects for REST request/response serialization.
//!
//! Field names are camelCase on the wire to match the browser pages.

pub mod common_dto;
pub mod kingdom_dto;
pub mod pet_dto;

pub use common_dto::*;
pub use kingdom_dto::*;
pub use pet_dto::*;
