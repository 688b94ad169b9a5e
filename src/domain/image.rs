// Copyright (c) 2025 - Cowboy AI, Inc.
//! Machine Image Selection
//!
//! Value objects for the image-catalog boundary: the filter a synthesis run
//! asks for and the candidates a catalog offers. Selection is "most recent
//! by creation time", with the image id as a final tie-break so the choice
//! never depends on catalog ordering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use wildmatch::WildMatch;

/// Provider image identifier, e.g. `ami-0abcdef1234567890`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One image offered by a catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageCandidate {
    pub id: ImageId,
    pub name: String,
    pub owner: String,
    pub created_at: DateTime<Utc>,
}

/// Owner + name-pattern query against an image catalog
///
/// The pattern supports `*` (any run of characters) and `?` (one character).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFilter {
    pub owner: String,
    pub name_pattern: String,
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self {
            owner: "099720109477".to_string(),
            name_pattern: "ubuntu/images/hvm-ssd/ubuntu-jammy-22.04-amd64-server-*".to_string(),
        }
    }
}

impl ImageFilter {
    pub fn new(owner: impl Into<String>, name_pattern: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name_pattern: name_pattern.into(),
        }
    }

    /// Check whether a candidate satisfies both owner and name pattern
    pub fn matches(&self, candidate: &ImageCandidate) -> bool {
        candidate.owner == self.owner && WildMatch::new(&self.name_pattern).matches(&candidate.name)
    }

    /// Pick the most recent matching candidate
    pub fn select_most_recent<'a, I>(&self, candidates: I) -> Option<&'a ImageCandidate>
    where
        I: IntoIterator<Item = &'a ImageCandidate>,
    {
        candidates
            .into_iter()
            .filter(|candidate| self.matches(candidate))
            .max_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use test_case::test_case;

    fn candidate(id: &str, name: &str, owner: &str, day: u32) -> ImageCandidate {
        ImageCandidate {
            id: ImageId::new(id),
            name: name.to_string(),
            owner: owner.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
        }
    }

    #[test_case("ubuntu-*", "ubuntu-jammy", true)]
    #[test_case("ubuntu-*", "debian-12", false)]
    #[test_case("*-server-*", "ubuntu-jammy-server-20240101", true)]
    #[test_case("img-?", "img-1", true)]
    #[test_case("img-?", "img-12", false)]
    #[test_case("exact", "exact", true)]
    #[test_case("*", "", true)]
    fn test_filter_name_pattern(pattern: &str, name: &str, expected: bool) {
        let filter = ImageFilter::new("owner-a", pattern);
        assert_eq!(filter.matches(&candidate("ami-1", name, "owner-a", 1)), expected);
        assert!(!filter.matches(&candidate("ami-1", name, "owner-b", 1)));
    }

    #[test]
    fn test_select_most_recent() {
        let filter = ImageFilter::new("owner-a", "ubuntu-*");
        let candidates = vec![
            candidate("ami-1", "ubuntu-1", "owner-a", 1),
            candidate("ami-3", "ubuntu-3", "owner-a", 3),
            candidate("ami-9", "ubuntu-9", "owner-b", 9),
            candidate("ami-5", "debian-5", "owner-a", 5),
        ];

        let chosen = filter.select_most_recent(&candidates).unwrap();
        assert_eq!(chosen.id.as_str(), "ami-3");
    }

    #[test]
    fn test_tie_break_is_order_independent() {
        let filter = ImageFilter::new("owner-a", "*");
        let a = candidate("ami-a", "x", "owner-a", 2);
        let b = candidate("ami-b", "y", "owner-a", 2);

        let forward = vec![a.clone(), b.clone()];
        let backward = vec![b, a];

        assert_eq!(
            filter.select_most_recent(&forward).unwrap().id,
            filter.select_most_recent(&backward).unwrap().id
        );
    }

    #[test]
    fn test_no_match() {
        let filter = ImageFilter::default();
        let candidates = vec![candidate("ami-1", "ubuntu-1", "someone-else", 1)];
        assert!(filter.select_most_recent(&candidates).is_none());
    }
}
