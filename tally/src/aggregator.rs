//! Windowed delta-sum aggregation over counter series
//!
//! This module solves the stateful half of counter aggregation. Hosts hand
//! us absolute counter readings in no particular order, possibly sparse,
//! and want the per-window increase per output series. The engine keeps two
//! owned tables: delta state keyed at full tag granularity, sum state keyed
//! at the grouped granularity. Each ingested sample shifts its raw series'
//! reading forward, yields a non-negative delta, and folds that delta into
//! its output series' running total.
//!
//! # Semantics
//!
//! A *window* is the span between two flush/reset cycles; the host drives
//! `flush` then `reset` on its cadence and may interleave any number of
//! `ingest` calls. Deltas obey two rules:
//!
//! * The first reading ever seen for a raw series contributes 0. There is
//!   no prior value to subtract, so nothing is counted.
//! * A reading lower than its predecessor is a counter reset and
//!   contributes 0. The increment lost between the reset and the first
//!   post-reset reading is simply not counted; no recovery is attempted.
//!
//! So the sequence `99, 100, 3, 5` inside one window yields deltas
//! `0, 1, 0, 2` and a flushed sum of `3`.
//!
//! The very first flush of an output series additionally emits a synthetic
//! `0` half an aggregation period before flush time, an explicit anchor so
//! downstream rate calculations have a starting point. Series untouched for
//! longer than the grace period are evicted at reset; a later arrival is a
//! brand-new counter and starts from 0 again.
//!
//! The engine is synchronous and single-owner: the host must not let
//! `ingest`, `flush` and `reset` race. See [`Server`](crate::Server) for a
//! driver that provides that exclusion.

use std::borrow::Cow;
use std::collections::hash_map::Entry;
use std::time::{Duration, SystemTime};

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::config::{Config, Error};
use crate::grouping::GroupingPolicy;
use crate::metric::{Sample, Tags};
use crate::series::series_id;
use crate::sink::Sink;
use crate::{Clock, RealClock};

/// Per raw-series reading state.
///
/// `last_value` is `None` until a second reading arrives; the numeric
/// identity of the raw series (name, tags) is not retained because this
/// table is never emitted from.
#[derive(Debug)]
struct DeltaState {
    last_value: Option<f64>,
    current_value: f64,
    last_update: SystemTime,
}

/// Per output-series accumulation state for the current window.
#[derive(Debug)]
struct SumState {
    name: String,
    tags: Tags,
    accumulated: f64,
    first_observation: bool,
    seen_this_window: bool,
    last_update: SystemTime,
}

/// The delta-sum aggregation engine.
///
/// One instance per configured aggregator; instances share no state and are
/// safe to drive in parallel with one another.
#[derive(Debug)]
pub struct Aggregator<C = RealClock> {
    policy: GroupingPolicy,
    name_suffix: Option<String>,
    grace_period: Duration,
    period: Duration,
    deltas: FxHashMap<u64, DeltaState>,
    sums: FxHashMap<u64, SumState>,
    clock: C,
}

impl Aggregator<RealClock> {
    /// Create a new [`Aggregator`] against the real wall clock.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if both grouping selections are set;
    /// no engine is constructed in that case.
    pub fn new(config: &Config) -> Result<Self, Error> {
        Self::with_clock(config, RealClock)
    }
}

impl<C> Aggregator<C>
where
    C: Clock,
{
    /// Create a new [`Aggregator`] with the given clock.
    ///
    /// # Errors
    ///
    /// See [`Aggregator::new`].
    pub fn with_clock(config: &Config, clock: C) -> Result<Self, Error> {
        let policy = config.grouping_policy()?;
        debug!(
            grouping_mode = policy.mode(),
            "delta-sum aggregator initialized"
        );
        Ok(Self {
            policy,
            name_suffix: config.name_suffix.clone(),
            grace_period: config.late_series_grace_period,
            period: config.period,
            deltas: FxHashMap::default(),
            sums: FxHashMap::default(),
            clock,
        })
    }

    /// Ingest one sample.
    ///
    /// Samples without the aggregatable shape -- exactly one field, named
    /// `value`, of numeric kind -- are discarded without effect. A valid
    /// sample updates its raw series' delta state and folds the resulting
    /// delta into its output series' sum.
    pub fn ingest(&mut self, sample: &Sample) {
        let Some(value) = sample.counter_value() else {
            return;
        };

        let raw_id = series_id(&sample.name, &sample.tags);
        let state = self
            .deltas
            .entry(raw_id)
            .and_modify(|state| {
                state.last_value = Some(state.current_value);
                state.current_value = value;
                state.last_update = sample.timestamp;
            })
            .or_insert_with(|| DeltaState {
                last_value: None,
                current_value: value,
                last_update: sample.timestamp,
            });
        let delta = compute_delta(state.last_value, state.current_value);

        let grouped = self.policy.regroup(&sample.tags);
        let output_id = series_id(&sample.name, &grouped);
        match self.sums.entry(output_id) {
            Entry::Occupied(mut entry) => {
                let state = entry.get_mut();
                state.accumulated += delta;
                state.seen_this_window = true;
                state.last_update = sample.timestamp;
            }
            Entry::Vacant(entry) => {
                entry.insert(SumState {
                    name: sample.name.clone(),
                    tags: grouped,
                    accumulated: delta,
                    first_observation: true,
                    seen_this_window: true,
                    last_update: sample.timestamp,
                });
            }
        }
    }

    /// Emit every output series touched since the last flush.
    ///
    /// Series first observed this window are preceded by a synthetic zero
    /// sample half an aggregation period before flush time. Series not seen
    /// this window are not emitted; there is no gap-filling.
    pub fn flush<S>(&self, sink: &mut S)
    where
        S: Sink,
    {
        let now = self.clock.now();
        let anchor_time = now - self.period / 2;
        for state in self.sums.values() {
            if !state.seen_this_window {
                continue;
            }
            let name: Cow<'_, str> = match self.name_suffix.as_deref() {
                Some(suffix) => Cow::Owned(format!("{}{}", state.name, suffix)),
                None => Cow::Borrowed(state.name.as_str()),
            };
            if state.first_observation {
                sink.emit(&name, 0.0, &state.tags, anchor_time);
            }
            sink.emit(&name, state.accumulated, &state.tags, now);
        }
    }

    /// Close the window: evict stale series, rearm the survivors.
    ///
    /// State untouched for longer than the grace period is dropped from its
    /// table; the two tables are evicted independently. Surviving sum state
    /// starts the next window from zero.
    pub fn reset(&mut self) {
        let now = self.clock.now();
        let grace_period = self.grace_period;
        self.deltas
            .retain(|_, state| age(now, state.last_update) <= grace_period);
        self.sums.retain(|_, state| {
            if age(now, state.last_update) > grace_period {
                return false;
            }
            state.seen_this_window = false;
            state.first_observation = false;
            state.accumulated = 0.0;
            true
        });
    }

    #[cfg(test)]
    fn delta_series(&self) -> usize {
        self.deltas.len()
    }

    #[cfg(test)]
    fn sum_series(&self) -> usize {
        self.sums.len()
    }
}

/// Delta between two consecutive readings.
///
/// `None` and negative operands mean uninitialized and contribute 0; a
/// decrease is a counter reset and also contributes 0 rather than a
/// negative delta.
fn compute_delta(last: Option<f64>, current: f64) -> f64 {
    match last {
        None => 0.0,
        Some(last) if last < 0.0 || current < 0.0 => 0.0,
        Some(last) => (current - last).max(0.0),
    }
}

/// Idle age of a state entry, saturating to zero for future timestamps.
fn age(now: SystemTime, last_update: SystemTime) -> Duration {
    now.duration_since(last_update).unwrap_or_default()
}
