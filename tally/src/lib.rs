//! Windowed delta-sum aggregation for counter telemetry
//!
//! A metrics-collection host feeds this crate absolute counter readings
//! tagged by series identity. On a fixed cadence the engine emits, per
//! output series, the sum of the non-negative deltas accumulated since the
//! previous emission, optionally re-grouping series by dropping or selecting
//! a subset of their tags. See [`aggregator`] for the window semantics.

#![deny(clippy::all)]
#![deny(clippy::cargo)]
#![deny(clippy::perf)]
#![deny(clippy::suspicious)]
#![deny(clippy::complexity)]
#![deny(unused_extern_crates)]
#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]
#![allow(clippy::multiple_crate_versions)]

use std::time::SystemTime;

pub mod aggregator;
pub mod config;
pub mod grouping;
pub mod metric;
pub mod series;
pub mod server;
pub mod sink;

pub use aggregator::Aggregator;
pub use config::Config;
pub use metric::{FieldValue, Sample, Tags};
pub use server::Server;
pub use sink::Sink;

/// The clock used for every aggregation engine.
///
/// Grace-period comparisons and flush timestamps read wall-clock time at the
/// `ingest`/`flush`/`reset` boundaries and nowhere else. Engines are generic
/// over this trait so those boundaries can be driven in tests without
/// sleeping.
pub trait Clock {
    /// The current wall-clock time.
    fn now(&self) -> SystemTime;
}

#[derive(Debug, Clone, Copy, Default)]
/// A clock that reads real wall-clock time.
pub struct RealClock;

impl Clock for RealClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}
