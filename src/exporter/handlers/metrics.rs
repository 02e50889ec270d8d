use crate::collectors::exporter::ExporterCollector;
use axum::{
    extract::Extension,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
};
use tracing::{debug, error};

/// Self-monitoring metrics of the exporter process.
pub async fn metrics(Extension(collector): Extension<ExporterCollector>) -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    headers.insert(
        "content-type",
        HeaderValue::from_static(super::CONTENT_TYPE_TEXT),
    );

    match collector.gather() {
        Ok(metrics) => {
            debug!("Successfully gathered exporter metrics");
            (StatusCode::OK, headers, metrics)
        }
        Err(e) => {
            error!("Failed to gather exporter metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                headers,
                format!("Error gathering metrics: {e}"),
            )
        }
    }
}
