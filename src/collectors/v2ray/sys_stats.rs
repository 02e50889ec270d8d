use super::within;
use crate::collectors::error::{Query, ScrapeError};
use crate::collectors::sample::Emitter;
use crate::v2ray::StatsApi;
use std::time::Duration;
use tokio::time::Instant;

/// Emit the V2Ray runtime statistics as gauges.
///
/// Naming follows the Prometheus Go collector (`goroutines`,
/// `memstats_*`). `LiveObjects` is not exported, it equals
/// `memstats_mallocs_total - memstats_frees_total`.
#[allow(clippy::cast_precision_loss)]
pub(super) async fn scrape<C: StatsApi>(
    client: &mut C,
    deadline: Instant,
    budget: Duration,
    emitter: &mut Emitter<'_>,
) -> Result<(), ScrapeError> {
    let stats = within(deadline, budget, client.get_sys_stats())
        .await
        .map_err(|source| ScrapeError::QueryFailed {
            query: Query::SysStats,
            source,
        })?;

    emitter.gauge("uptime_seconds", f64::from(stats.uptime));
    emitter.gauge("goroutines", f64::from(stats.num_goroutine));
    emitter.gauge("memstats_alloc_bytes", stats.alloc as f64);
    emitter.gauge("memstats_alloc_bytes_total", stats.total_alloc as f64);
    emitter.gauge("memstats_sys_bytes", stats.sys as f64);
    emitter.gauge("memstats_mallocs_total", stats.mallocs as f64);
    emitter.gauge("memstats_frees_total", stats.frees as f64);

    // not exposed by the Go collector, only prefixed
    emitter.gauge("memstats_num_gc", f64::from(stats.num_gc));
    emitter.gauge("memstats_pause_total_ns", stats.pause_total_ns as f64);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::descriptors::{DescriptorRegistry, ValueKind};
    use crate::v2ray::RpcError;
    use crate::v2ray::proto::{Stat, SysStatsResponse};
    use futures::future::BoxFuture;

    struct Fake(Option<SysStatsResponse>);

    impl StatsApi for Fake {
        fn get_sys_stats(&mut self) -> BoxFuture<'_, Result<SysStatsResponse, RpcError>> {
            let response = self.0;
            Box::pin(async move {
                response.ok_or_else(|| RpcError::from(tonic::Status::internal("sys stats broke")))
            })
        }

        fn query_stats(&mut self, _reset: bool) -> BoxFuture<'_, Result<Vec<Stat>, RpcError>> {
            Box::pin(async { Ok(Vec::new()) })
        }
    }

    fn deadline() -> Instant {
        Instant::now() + Duration::from_secs(3)
    }

    #[tokio::test]
    async fn test_emits_one_gauge_per_field() {
        let registry = DescriptorRegistry::new();
        let mut emitter = Emitter::new(&registry);
        let mut client = Fake(Some(SysStatsResponse {
            num_goroutine: 42,
            num_gc: 7,
            alloc: 1_000,
            total_alloc: 5_000,
            sys: 9_000,
            mallocs: 300,
            frees: 200,
            live_objects: 100,
            pause_total_ns: 123_456,
            uptime: 3_600,
        }));

        scrape(&mut client, deadline(), Duration::from_secs(3), &mut emitter)
            .await
            .unwrap();

        let samples = emitter.into_samples();
        assert_eq!(samples.len(), 9);
        assert!(samples.iter().all(|s| s.kind() == ValueKind::Gauge));

        let value = |name: &str| {
            samples
                .iter()
                .find(|s| s.name() == name)
                .map(crate::collectors::sample::Sample::value)
        };

        assert_eq!(value("v2ray_uptime_seconds"), Some(3_600.0));
        assert_eq!(value("v2ray_goroutines"), Some(42.0));
        assert_eq!(value("v2ray_memstats_alloc_bytes"), Some(1_000.0));
        assert_eq!(value("v2ray_memstats_alloc_bytes_total"), Some(5_000.0));
        assert_eq!(value("v2ray_memstats_sys_bytes"), Some(9_000.0));
        assert_eq!(value("v2ray_memstats_mallocs_total"), Some(300.0));
        assert_eq!(value("v2ray_memstats_frees_total"), Some(200.0));
        assert_eq!(value("v2ray_memstats_num_gc"), Some(7.0));
        assert_eq!(value("v2ray_memstats_pause_total_ns"), Some(123_456.0));
        assert_eq!(value("v2ray_memstats_live_objects"), None);
    }

    #[tokio::test]
    async fn test_failure_emits_nothing() {
        let registry = DescriptorRegistry::new();
        let mut emitter = Emitter::new(&registry);
        let mut client = Fake(None);

        let err = scrape(&mut client, deadline(), Duration::from_secs(3), &mut emitter)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ScrapeError::QueryFailed {
                query: Query::SysStats,
                ..
            }
        ));
        assert!(emitter.is_empty());
    }
}
