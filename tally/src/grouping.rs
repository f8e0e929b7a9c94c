//! Tag re-grouping policy for output-series identity
//!
//! Raw series are tracked at full tag granularity; output series may merge
//! several raw series by dropping or selecting tag keys. The policy is a
//! closed set of modes so that every call site matches exhaustively.

use rustc_hash::FxHashSet;

use crate::metric::Tags;

#[derive(Debug, Clone, PartialEq, Eq)]
/// How an original tag set is reduced to output-series identity.
///
/// At most one of [`By`](GroupingPolicy::By) and
/// [`Without`](GroupingPolicy::Without) may be configured;
/// [`Config::grouping_policy`](crate::Config::grouping_policy) enforces that
/// before any engine is built.
pub enum GroupingPolicy {
    /// Pass through all tags unchanged.
    All,
    /// Copy only tags whose key is in the set.
    By(FxHashSet<String>),
    /// Copy all tags except those whose key is in the set.
    Without(FxHashSet<String>),
}

impl GroupingPolicy {
    /// Produce the tag set used for output-series identity.
    #[must_use]
    pub fn regroup(&self, tags: &Tags) -> Tags {
        match self {
            GroupingPolicy::All => tags.clone(),
            GroupingPolicy::By(keys) => tags
                .iter()
                .filter(|(key, _)| keys.contains(key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            GroupingPolicy::Without(keys) => tags
                .iter()
                .filter(|(key, _)| !keys.contains(key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        }
    }

    /// Short label for diagnostics.
    #[must_use]
    pub fn mode(&self) -> &'static str {
        match self {
            GroupingPolicy::All => "all",
            GroupingPolicy::By(_) => "group_by",
            GroupingPolicy::Without(_) => "group_without",
        }
    }
}
