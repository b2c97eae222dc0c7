//! Cross-source merged profile

use super::{merge_frequency_maps, FrequencyMap, PublicProfile};
use serde::{Deserialize, Serialize};

/// Sum of several public profiles
///
/// `MergedProfile::default()` is the identity element: absent or failed
/// sources contribute nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedProfile {
    pub public_repos: u64,
    pub followers: u64,
    pub languages: FrequencyMap,
    pub topics: FrequencyMap,
}

impl MergedProfile {
    /// Combine two merged profiles
    pub fn merge(&self, other: &MergedProfile) -> MergedProfile {
        MergedProfile {
            public_repos: self.public_repos + other.public_repos,
            followers: self.followers + other.followers,
            languages: merge_frequency_maps(&self.languages, &other.languages),
            topics: merge_frequency_maps(&self.topics, &other.topics),
        }
    }

    /// Fold one public profile into this aggregate
    pub fn absorb(&mut self, profile: &PublicProfile) {
        *self = self.merge(&MergedProfile::from(profile));
    }
}

impl From<&PublicProfile> for MergedProfile {
    fn from(profile: &PublicProfile) -> Self {
        Self {
            public_repos: profile.public_repos,
            followers: profile.followers,
            languages: profile.languages.clone(),
            topics: profile.topics.clone(),
        }
    }
}

impl<'a> FromIterator<&'a PublicProfile> for MergedProfile {
    fn from_iter<I: IntoIterator<Item = &'a PublicProfile>>(iter: I) -> Self {
        let mut merged = MergedProfile::default();
        for profile in iter {
            merged.absorb(profile);
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(
        public_repos: u64,
        followers: u64,
        languages: &[(&str, u64)],
        topics: &[(&str, u64)],
    ) -> PublicProfile {
        PublicProfile {
            href: "https://example.invalid/acme".to_string(),
            name: "Acme".to_string(),
            public_repos,
            followers,
            languages: languages.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            topics: topics.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    #[test]
    fn test_two_source_example() {
        let a = profile(3, 10, &[("go", 2), ("rust", 1)], &[]);
        let b = profile(2, 5, &[("go", 1)], &[("cli", 1)]);

        let merged: MergedProfile = [&a, &b].into_iter().collect();

        assert_eq!(merged.public_repos, 5);
        assert_eq!(merged.followers, 15);
        assert_eq!(merged.languages.get("go"), Some(&3));
        assert_eq!(merged.languages.get("rust"), Some(&1));
        assert_eq!(merged.languages.len(), 2);
        assert_eq!(merged.topics.get("cli"), Some(&1));
        assert_eq!(merged.topics.len(), 1);
    }

    #[test]
    fn test_order_does_not_matter() {
        let a = profile(3, 10, &[("go", 2), ("rust", 1)], &[("cli", 2)]);
        let b = profile(2, 5, &[("go", 1)], &[("cli", 1)]);
        let c = profile(7, 0, &[("dart", 4)], &[("web", 1)]);

        let forward: MergedProfile = [&a, &b, &c].into_iter().collect();
        let backward: MergedProfile = [&c, &b, &a].into_iter().collect();
        assert_eq!(forward, backward);

        let grouped = MergedProfile::from(&a)
            .merge(&MergedProfile::from(&b).merge(&MergedProfile::from(&c)));
        assert_eq!(forward, grouped);
    }

    #[test]
    fn test_default_is_identity() {
        let a = MergedProfile::from(&profile(3, 10, &[("go", 2)], &[("cli", 1)]));
        assert_eq!(a.merge(&MergedProfile::default()), a);
        assert_eq!(MergedProfile::default().merge(&a), a);

        let nothing: MergedProfile = std::iter::empty::<&PublicProfile>().collect();
        assert_eq!(nothing, MergedProfile::default());
    }
}
