//! Profile data model
//!
//! Defines the source identifiers, the enriched per-source `ProfileRecord`,
//! its stable public shape (`PublicProfile`), the cross-source
//! `MergedProfile`, and the frequency-map merge they all share.

mod frequency;
mod merged;
mod record;
mod source_kind;

pub use frequency::{count_labels, merge_frequency_maps, FrequencyMap};
pub use merged::MergedProfile;
pub use record::{Normalize, ProfileRecord, PublicProfile};
pub use source_kind::SourceKind;
