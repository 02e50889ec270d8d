//! Scrape orchestrator for the V2Ray `StatsService`.
//!
//! A scrape dials the API, asks for the runtime statistics and then for the
//! named counters, and always finishes with `up`, `scrape_duration_seconds`
//! and `scrapes_total`:
//!
//! ```text
//! lock ─► dial ─► GetSysStats ─► QueryStats(reset=false) ─► up/duration/total ─► unlock
//!          │           │                  │
//!          └───────────┴──── any error ───┴──► up=0, keep samples emitted so far
//! ```
//!
//! The dial and both queries share one deadline of `scrape_timeout`, so a
//! slow `GetSysStats` leaves less time for `QueryStats`.
//!
//! Scrapes are serialized with an async mutex: a request arriving while
//! another scrape is running waits for it instead of opening a second
//! session against the same API.

mod stats;
mod sys_stats;

use crate::collectors::config::ScrapeConfig;
use crate::collectors::descriptors::DescriptorRegistry;
use crate::collectors::error::ScrapeError;
use crate::collectors::sample::{Emitter, Sample};
use crate::v2ray::{Dialer, GrpcDialer, RpcError};
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, instrument, warn};

const LAST_SCRAPE_UNKNOWN: u8 = 0;
const LAST_SCRAPE_UP: u8 = 1;
const LAST_SCRAPE_DOWN: u8 = 2;

#[derive(Debug, Default)]
struct ScrapeState {
    total_scrapes: u64,
}

pub struct V2rayCollector<D = GrpcDialer> {
    config: ScrapeConfig,
    dialer: D,
    descriptors: DescriptorRegistry,
    state: Mutex<ScrapeState>,
    // written under `state`, read lock-free by the health handler
    last_scrape: AtomicU8,
}

impl V2rayCollector<GrpcDialer> {
    #[must_use]
    pub fn new(config: ScrapeConfig) -> Self {
        Self::with_dialer(config, GrpcDialer)
    }
}

impl<D: Dialer> V2rayCollector<D> {
    #[must_use]
    pub fn with_dialer(config: ScrapeConfig, dialer: D) -> Self {
        Self {
            config,
            dialer,
            descriptors: DescriptorRegistry::new(),
            state: Mutex::new(ScrapeState::default()),
            last_scrape: AtomicU8::new(LAST_SCRAPE_UNKNOWN),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    #[must_use]
    pub const fn descriptors(&self) -> &DescriptorRegistry {
        &self.descriptors
    }

    /// Outcome of the last completed scrape, `None` before the first one.
    #[must_use]
    pub fn last_scrape_succeeded(&self) -> Option<bool> {
        match self.last_scrape.load(Ordering::Acquire) {
            LAST_SCRAPE_UP => Some(true),
            LAST_SCRAPE_DOWN => Some(false),
            _ => None,
        }
    }

    /// Run one scrape and return every sample it produced.
    ///
    /// Never fails: upstream errors turn into `up 0` plus a warning, and the
    /// samples emitted before the failure are kept.
    #[instrument(
        skip(self),
        level = "info",
        fields(endpoint = %self.config.endpoint, otel.kind = "internal")
    )]
    #[allow(clippy::cast_precision_loss)]
    pub async fn scrape(&self) -> Vec<Sample> {
        let mut state = self.state.lock().await;
        state.total_scrapes += 1;

        let start = Instant::now();
        let deadline = start + self.config.scrape_timeout;
        let mut emitter = Emitter::new(&self.descriptors);

        let succeeded = match self.scrape_v2ray(deadline, &mut emitter).await {
            Ok(()) => {
                debug!(samples = emitter.len(), "scrape succeeded");
                true
            }
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "Scrape failed");
                false
            }
        };

        emitter.gauge("up", if succeeded { 1.0 } else { 0.0 });
        emitter.gauge("scrape_duration_seconds", start.elapsed().as_secs_f64());
        emitter.counter("scrapes_total", state.total_scrapes as f64, &[]);

        self.last_scrape.store(
            if succeeded { LAST_SCRAPE_UP } else { LAST_SCRAPE_DOWN },
            Ordering::Release,
        );

        drop(state);

        emitter.into_samples()
    }

    async fn scrape_v2ray(
        &self,
        deadline: Instant,
        emitter: &mut Emitter<'_>,
    ) -> Result<(), ScrapeError> {
        let timeout = self.config.scrape_timeout;

        let mut client = within(deadline, timeout, self.dialer.dial(&self.config.endpoint))
            .await
            .map_err(|source| ScrapeError::DialFailed {
                endpoint: self.config.endpoint.clone(),
                timeout,
                source,
            })?;

        sys_stats::scrape(&mut client, deadline, timeout, emitter).await?;
        stats::scrape(&mut client, deadline, timeout, emitter).await?;

        Ok(())
    }
}

/// Await `fut` until `deadline`; `budget` is only used to describe the error.
async fn within<T>(
    deadline: Instant,
    budget: Duration,
    fut: impl Future<Output = Result<T, RpcError>>,
) -> Result<T, RpcError> {
    timeout_at(deadline, fut)
        .await
        .unwrap_or_else(|_| Err(RpcError::DeadlineExceeded(budget)))
}
