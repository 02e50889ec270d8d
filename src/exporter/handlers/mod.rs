mod health;
mod index;
mod metrics;
mod scrape;

pub use health::health;
pub use index::{MetricsPath, index};
pub use metrics::metrics;
pub use scrape::{CONTENT_TYPE_TEXT, scrape};
