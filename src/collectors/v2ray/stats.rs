use super::within;
use crate::collectors::error::{Query, ScrapeError};
use crate::collectors::sample::Emitter;
use crate::collectors::stat_name;
use crate::v2ray::StatsApi;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Emit every named counter as a labeled counter sample.
///
/// Counters are never reset upstream; a malformed name only drops that one
/// counter.
pub(super) async fn scrape<C: StatsApi>(
    client: &mut C,
    deadline: Instant,
    budget: Duration,
    emitter: &mut Emitter<'_>,
) -> Result<(), ScrapeError> {
    let stats = within(deadline, budget, client.query_stats(false))
        .await
        .map_err(|source| ScrapeError::QueryFailed {
            query: Query::Stats,
            source,
        })?;

    let mut skipped = 0_usize;

    for stat in &stats {
        match stat_name::parse(&stat.name, stat.value) {
            Ok(parsed) => emitter.counter(
                &parsed.key,
                parsed.value,
                &[("dimension", parsed.dimension), ("target", parsed.target)],
            ),
            Err(e) => {
                skipped += 1;
                warn!(error = %e, kind = e.kind(), "skipping stat");
            }
        }
    }

    debug!(stats = stats.len(), skipped, "translated v2ray stats");

    Ok(())
}
