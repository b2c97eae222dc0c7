//! Multi-source profile aggregator
//!
//! Fans one request out to every requested source concurrently, isolates
//! per-source failures, and folds the successes into a merged profile.

mod profile_aggregator;

pub use profile_aggregator::{
    parse_requests, Aggregation, Aggregator, SourceFailure, SourceResult,
};
