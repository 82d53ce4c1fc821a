//! cpack Core - Core types and utilities for the compose release renderer
//!
//! This crate provides the foundational types used throughout cpack:
//! - `Chart`: The package definition (metadata, values, templates, files)
//! - `Values`: Configuration values with deep merge support
//! - `ReleaseMetadata`: The persisted `release.json` record
//! - `RenderContext`: Template rendering context
//! - Schema validation over merged values

pub mod chart;
pub mod context;
pub mod error;
pub mod fsutil;
pub mod release;
pub mod schema;
pub mod values;

pub use chart::{Chart, ChartMetadata};
pub use context::{ReleaseInfo, RenderContext, StaticFiles};
pub use error::{CoreError, Result};
pub use release::ReleaseMetadata;
pub use schema::validate_values;
pub use values::{Values, merge_layers, parse_set_values};
