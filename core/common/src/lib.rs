//! Common utilities shared across Vaultmgr crates.
//!
//! This crate provides the workspace-wide error type and the pure
//! path-string arithmetic used to translate logical secret paths into
//! engine-specific wire paths.

pub mod error;
pub mod path;

pub use error::{Error, Result};
