//! Shared utilities.
//!
//! Common utilities used across the crate including hashing, shell quoting,
//! external tool invocation and test helpers.

pub mod cmd;
pub mod hash;
pub mod shell;

#[cfg(test)]
pub mod testutil;
