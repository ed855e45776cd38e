//! Common test utilities for pdb-dl integration tests

#[allow(dead_code)]
pub mod fixtures;

pub use fixtures::*;
