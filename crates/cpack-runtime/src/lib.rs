//! cpack Runtime - release materialization and metadata persistence
//!
//! This crate owns the on-disk shape of a release:
//! - `writer`: atomically materializes rendered output into
//!   `<base>/<release>/` (compose document + `files/` subtree)
//! - `store`: persists and retrieves the `release.json` provenance record

pub mod error;
pub mod store;
pub mod writer;

pub use error::{Result, RuntimeError};
pub use store::MetadataStore;
pub use writer::{COMPOSE_FILE_NAME, WriteOptions, write_runtime};
