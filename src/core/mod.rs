//! Core types and constants for the landmark anchoring engine

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;
