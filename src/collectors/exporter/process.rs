use anyhow::Result;
use prometheus::{Counter, Gauge, IntGauge, Opts, Registry};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use sysinfo::{Pid, ProcessesToUpdate, System};
use tracing::{debug, warn};

/// Resource usage of the exporter process.
///
/// # Metrics Exported
///
/// - `v2ray_exporter_process_cpu_seconds_total` (Counter): user + system CPU
///   time, cumulative across all cores
/// - `v2ray_exporter_process_resident_memory_bytes` (`IntGauge`): RSS
/// - `v2ray_exporter_process_virtual_memory_bytes` (`IntGauge`): VSZ
/// - `v2ray_exporter_process_threads` (`IntGauge`, Linux only)
/// - `v2ray_exporter_process_open_fds` (`IntGauge`, Linux only)
/// - `v2ray_exporter_process_start_time_seconds` (Gauge): unix timestamp
///
/// The `sysinfo::System` is cached behind a mutex and reused across
/// collections; the lock is held only while `/proc` is read.
#[derive(Clone)]
pub struct ProcessCollector {
    cpu_seconds_total: Counter,
    resident_memory_bytes: IntGauge,
    virtual_memory_bytes: IntGauge,
    open_fds: IntGauge,
    threads: IntGauge,
    start_time_seconds: Gauge,
    state: Arc<Mutex<CollectorState>>,
    pid: Pid,
}

struct CollectorState {
    system: System,
    last_cpu_time: Option<Duration>,
}

impl Default for ProcessCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessCollector {
    /// # Panics
    ///
    /// Panics if metric creation fails (should never happen with valid metric names)
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let cpu_seconds_total = Counter::with_opts(Opts::new(
            "v2ray_exporter_process_cpu_seconds_total",
            "Total user and system CPU time spent in seconds",
        ))
        .expect("v2ray_exporter_process_cpu_seconds_total");

        let resident_memory_bytes = IntGauge::with_opts(Opts::new(
            "v2ray_exporter_process_resident_memory_bytes",
            "Resident memory size in bytes",
        ))
        .expect("v2ray_exporter_process_resident_memory_bytes");

        let virtual_memory_bytes = IntGauge::with_opts(Opts::new(
            "v2ray_exporter_process_virtual_memory_bytes",
            "Virtual memory size in bytes",
        ))
        .expect("v2ray_exporter_process_virtual_memory_bytes");

        let open_fds = IntGauge::with_opts(Opts::new(
            "v2ray_exporter_process_open_fds",
            "Number of open file descriptors",
        ))
        .expect("v2ray_exporter_process_open_fds");

        let threads = IntGauge::with_opts(Opts::new(
            "v2ray_exporter_process_threads",
            "Number of OS threads in the process",
        ))
        .expect("v2ray_exporter_process_threads");

        let start_time_seconds = Gauge::with_opts(Opts::new(
            "v2ray_exporter_process_start_time_seconds",
            "Start time of the process since unix epoch in seconds",
        ))
        .expect("v2ray_exporter_process_start_time_seconds");

        start_time_seconds.set(
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs_f64(),
        );

        Self {
            cpu_seconds_total,
            resident_memory_bytes,
            virtual_memory_bytes,
            open_fds,
            threads,
            start_time_seconds,
            state: Arc::new(Mutex::new(CollectorState {
                system: System::new(),
                last_cpu_time: None,
            })),
            pid: Pid::from_u32(std::process::id()),
        }
    }

    /// # Errors
    ///
    /// Returns an error if a metric is already registered in `registry`.
    pub fn register_metrics(&self, registry: &Registry) -> Result<()> {
        registry.register(Box::new(self.cpu_seconds_total.clone()))?;
        registry.register(Box::new(self.resident_memory_bytes.clone()))?;
        registry.register(Box::new(self.virtual_memory_bytes.clone()))?;
        registry.register(Box::new(self.open_fds.clone()))?;
        registry.register(Box::new(self.threads.clone()))?;
        registry.register(Box::new(self.start_time_seconds.clone()))?;
        Ok(())
    }

    /// Refresh this process from the OS and update every gauge. The CPU
    /// counter grows by the CPU time consumed since the previous call.
    #[allow(clippy::cast_possible_wrap)]
    pub fn collect_stats(&self) {
        let started = Instant::now();

        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("process collector mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        };

        state
            .system
            .refresh_processes(ProcessesToUpdate::Some(&[self.pid]), true);

        let Some(process) = state.system.process(self.pid) else {
            warn!(pid = %self.pid, "exporter process not found");
            return;
        };

        let rss = process.memory();
        let vsz = process.virtual_memory();
        let cpu_time = Duration::from_millis(process.accumulated_cpu_time());

        self.resident_memory_bytes.set(rss as i64);
        self.virtual_memory_bytes.set(vsz as i64);

        if let Some(last) = state.last_cpu_time {
            let delta = cpu_time.saturating_sub(last).as_secs_f64();
            if delta > 0.0 {
                self.cpu_seconds_total.inc_by(delta);
            }
        }
        state.last_cpu_time = Some(cpu_time);

        drop(state);

        #[cfg(target_os = "linux")]
        {
            if let Ok(entries) = std::fs::read_dir(format!("/proc/{}/task", self.pid)) {
                self.threads.set(entries.count() as i64);
            }

            if let Ok(entries) = std::fs::read_dir(format!("/proc/{}/fd", self.pid)) {
                self.open_fds.set(entries.count() as i64);
            }
        }

        debug!(
            rss_mb = rss / 1024 / 1024,
            vsz_mb = vsz / 1024 / 1024,
            threads = self.threads.get(),
            fds = self.open_fds.get(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "collected process metrics"
        );
    }
}
