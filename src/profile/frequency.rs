//! Label → count frequency maps

use std::collections::BTreeMap;

/// Mapping from a label (language, topic) to an occurrence count
///
/// A `BTreeMap` keeps serialized output ordered by label.
pub type FrequencyMap = BTreeMap<String, u64>;

/// Merge two frequency maps by summing counts per key.
///
/// The result's key set is the union of both inputs; a key missing from one
/// side counts as zero. Integer addition keeps the merge exactly commutative
/// and associative, with the empty map as identity.
pub fn merge_frequency_maps(a: &FrequencyMap, b: &FrequencyMap) -> FrequencyMap {
    let mut merged = a.clone();
    for (label, count) in b {
        *merged.entry(label.clone()).or_insert(0) += count;
    }
    merged
}

/// Count occurrences of each label.
pub fn count_labels<I, S>(labels: I) -> FrequencyMap
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut counts = FrequencyMap::new();
    for label in labels {
        *counts.entry(label.into()).or_insert(0) += 1;
    }
    counts
}
