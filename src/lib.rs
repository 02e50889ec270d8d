pub mod cli;
pub mod collectors;
pub mod exporter;
pub mod v2ray;
