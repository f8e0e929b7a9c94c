//! Drive an [`Aggregator`] from a sample stream on a fixed cadence
//!
//! The engine itself is synchronous and assumes a single owner; this server
//! is that owner. It pulls samples off a channel, ticks on the aggregation
//! period, and runs the flush-then-reset cycle on every tick. The host keeps
//! the sending half of the channel; dropping it is the shutdown signal, at
//! which point the current window is flushed one last time so buffered
//! state is not lost.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tracing::{debug, info};

use crate::aggregator::Aggregator;
use crate::config::{Config, Error};
use crate::metric::Sample;
use crate::sink::Sink;
use crate::{Clock, RealClock};

/// The aggregation server.
///
/// Owns one engine, one sample receiver and one sink. Multiple servers --
/// one per configured aggregator -- share no state and may run on the same
/// runtime.
#[derive(Debug)]
pub struct Server<S, C = RealClock> {
    aggregator: Aggregator<C>,
    period: Duration,
    samples: mpsc::Receiver<Sample>,
    sink: S,
}

impl<S> Server<S, RealClock>
where
    S: Sink,
{
    /// Create a new [`Server`] against the real wall clock.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the config's grouping selections
    /// conflict; no server is constructed in that case.
    pub fn new(config: &Config, samples: mpsc::Receiver<Sample>, sink: S) -> Result<Self, Error> {
        Self::with_clock(config, samples, sink, RealClock)
    }
}

impl<S, C> Server<S, C>
where
    S: Sink,
    C: Clock,
{
    /// Create a new [`Server`] with the given clock.
    ///
    /// # Errors
    ///
    /// See [`Server::new`].
    pub fn with_clock(
        config: &Config,
        samples: mpsc::Receiver<Sample>,
        sink: S,
        clock: C,
    ) -> Result<Self, Error> {
        let aggregator = Aggregator::with_clock(config, clock)?;
        Ok(Self {
            aggregator,
            period: config.period,
            samples,
            sink,
        })
    }

    /// Run this [`Server`] to completion.
    ///
    /// Ingests until the sample channel closes, flushing and resetting on
    /// every period tick. On shutdown the current window is flushed without
    /// a reset and the sink is returned to the caller.
    pub async fn run(mut self) -> S {
        info!(period = ?self.period, "delta-sum aggregation running");

        let mut interval = time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.aggregator.flush(&mut self.sink);
                    self.aggregator.reset();
                }
                sample = self.samples.recv() => {
                    match sample {
                        Some(sample) => self.aggregator.ingest(&sample),
                        None => {
                            debug!("sample channel closed");
                            break;
                        }
                    }
                }
            }
        }

        self.aggregator.flush(&mut self.sink);
        info!("delta-sum aggregation shut down");
        self.sink
    }
}
