//! Client for versioned KV secret stores.
//!
//! This crate provides:
//! - Engine version detection (flat KV v1 vs. versioned KV v2)
//! - Version-aware secret reads and writes with envelope handling
//! - Cascading deletion of whole secret subtrees
//! - A blocking HTTP transport plus an in-memory one for testing
//!
//! # Architecture
//! Every operation resolves its mount fresh: a [`mount::Mount`] is a
//! transient value, never cached across calls, so a long-lived client keeps
//! working when an engine is re-mounted or upgraded between calls.

pub mod client;
pub mod config;
pub mod memory;
pub mod mount;
pub mod secret;
pub mod transport;

mod delete;
mod kv;

pub use client::VaultClient;
pub use config::ClientConfig;
pub use memory::MemoryTransport;
pub use mount::{KvVersion, Mount};
pub use secret::Secret;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};
