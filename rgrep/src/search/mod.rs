//! Concurrent file search: pattern strategies, per-file processing, and the
//! rayon-backed engine that ties them together.
//!
//! The matching core in [`crate::pattern`] is pure and line-oriented; this
//! module layers file I/O, filtering, and parallelism on top. Work is
//! file-grained: every file is processed independently, so rayon can hand
//! chunks of the walked file list to its pool with no shared mutable state
//! beyond the metrics counters.

pub mod engine;
pub mod matcher;
pub mod processor;

pub use engine::search;
pub use matcher::{MatchStrategy, PatternMatcher};
pub use processor::FileProcessor;
