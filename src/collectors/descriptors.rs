//! Metric Descriptor Registry.
//!
//! Static table of every series the exporter knows how to name. It is built
//! once when the collector is constructed and only read afterwards, so it is
//! shared between scrapes without locking.

use std::collections::HashMap;
use std::sync::Arc;

/// Prefix of every V2Ray series.
pub const NAMESPACE: &str = "v2ray";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Gauge,
    Counter,
}

/// Immutable description of one metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub key: String,
    /// Fully qualified exposition name, e.g. `v2ray_uptime_seconds`.
    pub name: String,
    pub help: String,
    pub labels: Vec<String>,
    pub kind: ValueKind,
}

impl Descriptor {
    #[must_use]
    pub fn new(key: &str, help: &str, labels: &[&str], kind: ValueKind) -> Self {
        Self {
            key: key.to_string(),
            name: fq_name(key),
            help: help.to_string(),
            labels: labels.iter().map(ToString::to_string).collect(),
            kind,
        }
    }
}

const TRAFFIC_LABELS: &[&str] = &["dimension", "target"];

const DEFAULT_DESCRIPTORS: &[(&str, &str, &[&str], ValueKind)] = &[
    ("up", "Indicate scrape succeeded or not", &[], ValueKind::Gauge),
    ("scrape_duration_seconds", "Scrape duration in seconds", &[], ValueKind::Gauge),
    ("scrapes_total", "Total number of scrapes performed", &[], ValueKind::Counter),
    ("uptime_seconds", "V2Ray uptime in seconds", &[], ValueKind::Gauge),
    ("goroutines", "Number of goroutines that currently exist", &[], ValueKind::Gauge),
    ("memstats_alloc_bytes", "Number of bytes allocated and still in use", &[], ValueKind::Gauge),
    (
        "memstats_alloc_bytes_total",
        "Total number of bytes allocated, even if freed",
        &[],
        ValueKind::Gauge,
    ),
    ("memstats_sys_bytes", "Number of bytes obtained from system", &[], ValueKind::Gauge),
    ("memstats_mallocs_total", "Total number of mallocs", &[], ValueKind::Gauge),
    ("memstats_frees_total", "Total number of frees", &[], ValueKind::Gauge),
    ("memstats_num_gc", "Number of completed GC cycles", &[], ValueKind::Gauge),
    (
        "memstats_pause_total_ns",
        "Cumulative nanoseconds in GC stop-the-world pauses",
        &[],
        ValueKind::Gauge,
    ),
    (
        "traffic_uplink_bytes_total",
        "Number of transmitted bytes",
        TRAFFIC_LABELS,
        ValueKind::Counter,
    ),
    (
        "traffic_downlink_bytes_total",
        "Number of received bytes",
        TRAFFIC_LABELS,
        ValueKind::Counter,
    ),
];

// V2Ray names traffic counters `...>>>traffic>>>uplink`; the series keep the
// unit suffix.
const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("traffic_uplink", "traffic_uplink_bytes_total"),
    ("traffic_downlink", "traffic_downlink_bytes_total"),
];

#[must_use]
pub fn fq_name(key: &str) -> String {
    format!("{NAMESPACE}_{key}")
}

#[derive(Debug, Clone, Default)]
pub struct DescriptorRegistry {
    descriptors: HashMap<String, Arc<Descriptor>>,
    aliases: HashMap<String, String>,
}

impl DescriptorRegistry {
    /// Registry holding every known V2Ray metric.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();

        for (key, help, labels, kind) in DEFAULT_DESCRIPTORS {
            registry.register(key, help, labels, *kind);
        }

        for (alias, key) in DEFAULT_ALIASES {
            registry.alias(alias, key);
        }

        registry
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: &str, help: &str, labels: &[&str], kind: ValueKind) {
        let previous = self.descriptors.insert(
            key.to_string(),
            Arc::new(Descriptor::new(key, help, labels, kind)),
        );
        debug_assert!(previous.is_none(), "descriptor {key} registered twice");
    }

    /// Let `alias` resolve to the descriptor registered under `key`.
    pub fn alias(&mut self, alias: &str, key: &str) {
        debug_assert!(self.descriptors.contains_key(key), "alias {alias} points to unknown {key}");
        self.aliases.insert(alias.to_string(), key.to_string());
    }

    #[must_use]
    pub fn resolve(&self, key: &str) -> Option<Arc<Descriptor>> {
        self.descriptors
            .get(key)
            .or_else(|| {
                self.aliases
                    .get(key)
                    .and_then(|target| self.descriptors.get(target))
            })
            .cloned()
    }

    /// Ad-hoc descriptor for a key the registry does not know, using the key
    /// as help text.
    #[must_use]
    pub fn synthesize(key: &str, labels: &[&str], kind: ValueKind) -> Descriptor {
        Descriptor::new(key, key, labels, kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Descriptor>> {
        self.descriptors.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
