// src/pipeline/poll.rs

//! Resident poll loop.
//!
//! Fires a cycle on a fixed interval. At most one cycle runs at a time: the
//! dedup state sits behind an async mutex that a cycle holds for its whole
//! duration, and a tick that finds it held is skipped. Failures and panics end
//! only the current cycle.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;

use crate::error::Result;
use crate::models::{Config, RelayConfig};
use crate::pipeline::{Acquisition, CycleOutcome, DedupState, run_cycle};
use crate::services::DeliverySink;
use crate::utils::http::create_async_client;

/// Timing and result of one cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: CycleOutcome,
}

/// Scheduler driving acquisition cycles.
pub struct PollLoop {
    acquisition: Acquisition,
    sink: Arc<dyn DeliverySink>,
    relay: RelayConfig,
    state: Mutex<DedupState>,
    interval: Duration,
}

impl PollLoop {
    pub fn new(acquisition: Acquisition, sink: Arc<dyn DeliverySink>, relay: RelayConfig) -> Self {
        let interval = Duration::from_secs(relay.poll_interval_secs);
        Self {
            acquisition,
            sink,
            relay,
            state: Mutex::new(DedupState::new()),
            interval,
        }
    }

    /// Wire the loop from configuration: HTTP client, primary probe, mirrors.
    pub fn from_config(config: &Config, sink: Arc<dyn DeliverySink>) -> Result<Self> {
        let client = create_async_client(&config.http)?;
        let acquisition = Acquisition::from_config(config, &client);
        Ok(Self::new(acquisition, sink, config.relay.clone()))
    }

    /// Start from a known dedup state.
    pub fn with_state(self, state: DedupState) -> Self {
        Self {
            state: Mutex::new(state),
            ..self
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Snapshot of the dedup state; waits for a running cycle to finish.
    pub async fn state(&self) -> DedupState {
        self.state.lock().await.clone()
    }

    /// Run one cycle unless another is in flight, in which case `None`.
    pub async fn poll_once(&self) -> Option<CycleReport> {
        let Ok(mut state) = self.state.try_lock() else {
            log::warn!("Previous cycle still running; skipping this tick");
            return None;
        };

        let started_at = Utc::now();
        let cycle = run_cycle(&self.acquisition, &mut state, self.sink.as_ref(), &self.relay);
        let outcome = match AssertUnwindSafe(cycle).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(_) => {
                log::error!("Poll cycle panicked; waiting for next tick");
                CycleOutcome::Aborted
            }
        };
        let finished_at = Utc::now();

        log::debug!(
            "Cycle finished in {}ms: {:?}",
            (finished_at - started_at).num_milliseconds(),
            outcome
        );
        Some(CycleReport {
            started_at,
            finished_at,
            outcome,
        })
    }

    /// Poll on the configured interval until `shutdown` resolves.
    ///
    /// The first cycle runs immediately. Ticks missed while a cycle runs are
    /// dropped rather than replayed. Shutdown also cancels a cycle in flight,
    /// so a mirror backoff does not hold the process open.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        log::info!(
            "Watching @{} every {}s (primary timeline {})",
            self.relay.account,
            self.interval.as_secs(),
            if self.acquisition.has_primary() { "on" } else { "off" }
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }
            tokio::select! {
                _ = &mut shutdown => {
                    log::warn!("Shutdown requested mid-cycle; cycle cancelled");
                    break;
                }
                _ = self.poll_once() => {}
            }
        }
        log::info!("Shutdown requested; poll loop stopped");
    }
}
