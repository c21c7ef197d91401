//! Shared types, error model, and configuration for the Blackstar client.
//!
//! This crate is the foundation depended on by all other Blackstar crates.
//! It provides:
//! - [`BlackstarError`] — the unified error type
//! - Domain types ([`Chunk`], [`ChunkId`], [`NewChunk`], [`ErrorReport`])
//! - Configuration ([`AppConfig`], [`ClientConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, AuthConfig, ClientConfig, ServerConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from, parse_base_url, resolve_token,
};
pub use error::{BlackstarError, Result};
pub use types::{Chunk, ChunkId, ErrorReport, NewChunk};
