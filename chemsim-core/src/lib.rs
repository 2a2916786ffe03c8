//! Shared primitives, traits, and utilities for the chemsim similarity engine.
//!
//! `chemsim-core` provides the foundation the other chemsim crates build on:
//!
//! - **Error types** — [`ChemsimError`], [`ErrorKind`], and [`Result`]
//! - **Bit sets** — popcount and bitwise AND/OR over packed byte buffers
//! - **Traits** — Core abstractions like [`Scored`], [`Summarizable`], [`ContentAddressable`]
//! - **Hashing** — SHA-256 content addressing

pub mod bitset;
pub mod error;
pub mod hash;
pub mod traits;

pub use error::{ChemsimError, ErrorKind, Result};
pub use traits::*;
