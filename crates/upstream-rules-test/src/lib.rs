//! Test harnesses for the upstream-rules tools.
//!
//! Provides fixture helpers and CLI regression tests for the
//! `upstream-rules` binary.

#[cfg(test)]
pub mod cli;
pub mod fixtures;

pub use fixtures::{fixture, fixtures_dir, write_draft, write_rule_set};
