//! Configuration surface for the aggregation engine
//!
//! Parsing is the host's job; this struct arrives already deserialized and
//! is validated when an engine is built, before any sample is processed.

use std::time::Duration;

use serde::Deserialize;

use crate::grouping::GroupingPolicy;

/// Errors produced by [`Config`] validation.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Both grouping selections were set simultaneously.
    #[error("at most one of group_by_labels and group_without_labels may be set")]
    ConflictingGrouping,
}

/// Default late-series grace period: five minutes.
#[must_use]
pub fn default_grace_period() -> Duration {
    Duration::from_secs(300)
}

/// Default aggregation interval: thirty seconds.
#[must_use]
pub fn default_period() -> Duration {
    Duration::from_secs(30)
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "snake_case")]
/// Configuration for an [`Aggregator`](crate::Aggregator).
pub struct Config {
    /// Tag keys that define output-series identity; all other tags are
    /// dropped. Mutually exclusive with `group_without_labels`.
    #[serde(default)]
    pub group_by_labels: Vec<String>,
    /// Tag keys dropped from output-series identity. Mutually exclusive
    /// with `group_by_labels`.
    #[serde(default)]
    pub group_without_labels: Vec<String>,
    /// Idle duration after which a series' state is evicted.
    #[serde(default = "default_grace_period")]
    pub late_series_grace_period: Duration,
    /// The window length between flushes. Also sets the synthetic
    /// zero-anchor offset, half a period before flush time.
    #[serde(default = "default_period")]
    pub period: Duration,
    /// Optional suffix appended to emitted metric names.
    #[serde(default)]
    pub name_suffix: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            group_by_labels: Vec::new(),
            group_without_labels: Vec::new(),
            late_series_grace_period: default_grace_period(),
            period: default_period(),
            name_suffix: None,
        }
    }
}

impl Config {
    /// Resolve the grouping mode from the two label lists.
    ///
    /// An empty list counts as unset, so declaring a selection with no keys
    /// selects pass-through grouping rather than failing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConflictingGrouping`] if both lists are non-empty.
    pub fn grouping_policy(&self) -> Result<GroupingPolicy, Error> {
        match (
            self.group_by_labels.is_empty(),
            self.group_without_labels.is_empty(),
        ) {
            (false, false) => Err(Error::ConflictingGrouping),
            (false, true) => Ok(GroupingPolicy::By(
                self.group_by_labels.iter().cloned().collect(),
            )),
            (true, false) => Ok(GroupingPolicy::Without(
                self.group_without_labels.iter().cloned().collect(),
            )),
            (true, true) => Ok(GroupingPolicy::All),
        }
    }
}
