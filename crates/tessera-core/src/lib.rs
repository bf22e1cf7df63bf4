//! Ambient plumbing shared by Tessera binaries: configuration loading and
//! tracing setup.

pub mod config;
pub mod tracing;
