use crate::{
    collectors::{V2rayCollector, sink},
    v2ray::Dialer,
};
use axum::{
    extract::Extension,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{Span, debug, error};
use tracing_futures::Instrument as _;

/// Prometheus text exposition format 0.0.4.
pub const CONTENT_TYPE_TEXT: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Run one scrape against V2Ray and render it.
///
/// An unreachable V2Ray still answers 200 with `v2ray_up 0`; only a failure
/// to render the samples is a server error.
///
/// The scrape runs on its own task so a client hanging up does not cancel
/// it; the scrape deadline is the only thing that stops it early.
pub async fn scrape<D: Dialer + 'static>(
    Extension(collector): Extension<Arc<V2rayCollector<D>>>,
) -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    headers.insert("content-type", HeaderValue::from_static(CONTENT_TYPE_TEXT));

    let task = tokio::spawn(async move { collector.scrape().await }.instrument(Span::current()));

    let samples = match task.await {
        Ok(samples) => samples,
        Err(e) => {
            error!("Scrape task failed: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                headers,
                format!("Error running scrape: {e}"),
            );
        }
    };

    match sink::encode(&samples) {
        Ok(body) => {
            debug!(samples = samples.len(), "Successfully encoded scrape");
            (StatusCode::OK, headers, body)
        }
        Err(e) => {
            error!("Failed to encode scrape: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                headers,
                format!("Error encoding metrics: {e}"),
            )
        }
    }
}
