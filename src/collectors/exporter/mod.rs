//! Exporter self-monitoring, served on `/metrics`.
//!
//! The V2Ray series live on the scrape path; this registry only describes
//! the exporter process itself so both can be scraped as separate jobs.
mod process;

pub use process::ProcessCollector;

use anyhow::Result;
use prometheus::{Encoder, Registry, TextEncoder};

#[derive(Clone)]
pub struct ExporterCollector {
    registry: Registry,
    process: ProcessCollector,
}

impl ExporterCollector {
    /// # Errors
    ///
    /// Returns an error if a process metric cannot be registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let process = ProcessCollector::new();
        process.register_metrics(&registry)?;

        Ok(Self { registry, process })
    }

    /// Refresh process statistics and encode the registry as text.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn gather(&self) -> Result<String> {
        self.process.collect_stats();

        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;

        Ok(String::from_utf8(buffer)?)
    }
}
