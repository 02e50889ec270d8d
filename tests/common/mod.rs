#![allow(dead_code)]

use futures::future::BoxFuture;
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use v2ray_exporter::{
    collectors::{V2rayCollector, config::ScrapeConfig, sample::Sample},
    exporter,
    v2ray::{
        Dialer, RpcError, StatsApi,
        proto::{Stat, SysStatsResponse},
    },
};

/// Find an available port for testing (returns port > 1024)
pub fn get_available_port() -> u16 {
    use std::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind to random port");
    let port = listener
        .local_addr()
        .expect("Failed to get local addr")
        .port();

    assert!(port > 1024, "Assigned port {} should be > 1024", port);

    port
}

/// Wait for server to be ready on the given port
pub async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    use tokio::time::sleep;

    for _ in 0..max_attempts {
        if tokio::net::TcpStream::connect(format!("127.0.0.1:{}", port))
            .await
            .is_ok()
        {
            return true;
        }

        sleep(Duration::from_millis(100)).await;
    }

    eprintln!(
        "Failed to connect to server on port {} after {} attempts",
        port, max_attempts
    );
    false
}

/// Get base URL for test server
pub fn get_test_url(port: u16) -> String {
    format!("http://127.0.0.1:{}", port)
}

/// Serve `exporter::router` for `collector` on a random local port.
pub async fn spawn_router(
    collector: Arc<V2rayCollector<MockDialer>>,
    metrics_path: &str,
) -> (String, tokio::task::JoinHandle<()>) {
    let app = exporter::router(collector, metrics_path).expect("router");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app.into_make_service())
            .await
            .expect("serve");
    });

    (format!("http://{addr}"), handle)
}

pub fn sys_stats() -> SysStatsResponse {
    SysStatsResponse {
        num_goroutine: 42,
        num_gc: 7,
        alloc: 1_048_576,
        total_alloc: 8_388_608,
        sys: 16_777_216,
        mallocs: 1000,
        frees: 900,
        live_objects: 100,
        pause_total_ns: 123_456,
        uptime: 300,
    }
}

pub fn stat(name: &str, value: i64) -> Stat {
    Stat {
        name: name.to_string(),
        value,
    }
}

pub fn traffic_stats() -> Vec<Stat> {
    vec![
        stat("inbound>>>api>>>traffic>>>uplink", 1234),
        stat("inbound>>>api>>>traffic>>>downlink", 5678),
        stat("user>>>alice@example.com>>>traffic>>>uplink", 42),
    ]
}

/// What the fake V2Ray answers.
#[derive(Clone)]
pub struct MockConfig {
    pub dial_fails: bool,
    pub dial_delay: Duration,
    pub sys_stats: Option<SysStatsResponse>,
    pub stats: Option<Vec<Stat>>,
    pub query_delay: Duration,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            dial_fails: false,
            dial_delay: Duration::ZERO,
            sys_stats: Some(sys_stats()),
            stats: Some(traffic_stats()),
            query_delay: Duration::ZERO,
        }
    }
}

/// What the fake V2Ray observed.
#[derive(Default)]
pub struct Probe {
    pub dials: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub resets: Mutex<Vec<bool>>,
}

impl Probe {
    pub fn dials(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn resets(&self) -> Vec<bool> {
        self.resets.lock().expect("resets lock").clone()
    }
}

#[derive(Clone, Default)]
pub struct MockDialer {
    config: Arc<MockConfig>,
    pub probe: Arc<Probe>,
}

impl MockDialer {
    pub fn new(config: MockConfig) -> Self {
        Self {
            config: Arc::new(config),
            probe: Arc::new(Probe::default()),
        }
    }

    pub fn failing_dial(mut self) -> Self {
        Arc::make_mut(&mut self.config).dial_fails = true;
        self
    }

    pub fn dial_delay(mut self, delay: Duration) -> Self {
        Arc::make_mut(&mut self.config).dial_delay = delay;
        self
    }

    pub fn query_delay(mut self, delay: Duration) -> Self {
        Arc::make_mut(&mut self.config).query_delay = delay;
        self
    }

    pub fn failing_sys_stats(mut self) -> Self {
        Arc::make_mut(&mut self.config).sys_stats = None;
        self
    }

    pub fn failing_stats(mut self) -> Self {
        Arc::make_mut(&mut self.config).stats = None;
        self
    }

    pub fn with_stats(mut self, stats: Vec<Stat>) -> Self {
        Arc::make_mut(&mut self.config).stats = Some(stats);
        self
    }

    pub fn collector(self, timeout: Duration) -> V2rayCollector<Self> {
        let config = ScrapeConfig::new("127.0.0.1:8080", timeout).expect("config");
        V2rayCollector::with_dialer(config, self)
    }
}

pub struct MockClient {
    config: Arc<MockConfig>,
    probe: Arc<Probe>,
}

impl Drop for MockClient {
    fn drop(&mut self) {
        self.probe.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Dialer for MockDialer {
    type Client = MockClient;

    fn dial<'a>(&'a self, _endpoint: &'a str) -> BoxFuture<'a, Result<MockClient, RpcError>> {
        Box::pin(async move {
            self.probe.dials.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.config.dial_delay).await;

            if self.config.dial_fails {
                return Err(RpcError::from(tonic::Status::unavailable(
                    "connection refused",
                )));
            }

            let now = self.probe.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.probe.max_in_flight.fetch_max(now, Ordering::SeqCst);

            Ok(MockClient {
                config: Arc::clone(&self.config),
                probe: Arc::clone(&self.probe),
            })
        })
    }
}

impl StatsApi for MockClient {
    fn get_sys_stats(&mut self) -> BoxFuture<'_, Result<SysStatsResponse, RpcError>> {
        Box::pin(async move {
            tokio::time::sleep(self.config.query_delay).await;
            self.config
                .sys_stats
                .ok_or_else(|| RpcError::from(tonic::Status::internal("sys stats broken")))
        })
    }

    fn query_stats(&mut self, reset: bool) -> BoxFuture<'_, Result<Vec<Stat>, RpcError>> {
        Box::pin(async move {
            self.probe.resets.lock().expect("resets lock").push(reset);
            tokio::time::sleep(self.config.query_delay).await;
            self.config
                .stats
                .clone()
                .ok_or_else(|| RpcError::from(tonic::Status::internal("stats broken")))
        })
    }
}

pub fn find<'a>(samples: &'a [Sample], name: &str) -> Vec<&'a Sample> {
    samples.iter().filter(|s| s.name() == name).collect()
}

pub fn value(samples: &[Sample], name: &str) -> Option<f64> {
    samples.iter().find(|s| s.name() == name).map(Sample::value)
}
