//! Static endpoint alignment between a JavaScript/TypeScript backend and the
//! frontend that calls it.
//!
//! The backend's effective routes are reconstructed from source text by
//! following `router.use(prefix, child)` mounts across files, then compared
//! against the API paths and navigation targets the frontend references.
//! Unmatched references are reported with ranked suggestions.

pub mod analyzer;
pub mod config;
pub mod endpoint_set;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod file_finder;
pub mod formatter;
pub mod imports;
pub mod mount_graph;
pub mod path_normalizer;
pub mod suggest;

pub use config::Config;
pub use engine::{AlignmentReport, analyze_sources, run_alignment};
pub use error::{AlignError, Result};
