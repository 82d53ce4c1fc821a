//! cpack Engine - Jinja2 templating for compose charts
//!
//! This crate provides a MiniJinja-based template engine with:
//! - Compose and file template rendering over a shared helper library
//! - Render-time functions (`env`, `include`, `tpl`) and chart filters
//! - A `Files` object exposing chart static files to templates

pub mod engine;
pub mod error;
pub mod files_object;
pub mod filters;
pub mod functions;

pub use engine::Engine;
pub use error::{EngineError, Result, TemplateError};
