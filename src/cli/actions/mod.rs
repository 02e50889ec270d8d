pub mod run;

use crate::collectors::config::ScrapeConfig;

#[derive(Debug)]
pub enum Action {
    Run {
        port: u16,
        listen: Option<String>,
        metrics_path: String,
        config: ScrapeConfig,
    },
}
