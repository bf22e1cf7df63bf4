//! Domain types shared across Tessera crates.
//!
//! This crate contains only pure types with no framework dependencies.

pub mod id;
pub mod identity;
