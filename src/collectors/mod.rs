//! Scrape-and-translate pipeline.
//!
//! - [`v2ray::V2rayCollector`] owns the scrape lifecycle against one V2Ray API
//! - [`stat_name`] and [`sample`] translate upstream counters into samples
//! - [`descriptors`] names every known series
//! - [`sink`] renders a sample set as Prometheus text
//! - [`exporter`] monitors the exporter process itself

pub mod config;
pub mod descriptors;
pub mod error;
pub mod exporter;
pub mod sample;
pub mod sink;
pub mod stat_name;
pub mod v2ray;

pub use v2ray::V2rayCollector;
