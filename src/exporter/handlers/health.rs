use crate::{collectors::V2rayCollector, exporter::GIT_COMMIT_HASH, v2ray::Dialer};
use axum::{
    body::Body,
    extract::Extension,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

#[derive(Serialize, Deserialize, Debug)]
pub struct Health {
    pub commit: String,
    pub name: String,
    pub version: String,
    pub endpoint: String,
    pub upstream: String,
}

/// Upstream state as seen by the most recent completed scrape.
///
/// Only a failed scrape degrades health; before the first scrape the
/// exporter itself is healthy and the upstream is reported as unknown.
fn upstream_status(last_scrape: Option<bool>) -> (&'static str, StatusCode) {
    match last_scrape {
        Some(true) => ("ok", StatusCode::OK),
        Some(false) => ("error", StatusCode::SERVICE_UNAVAILABLE),
        None => ("unknown", StatusCode::OK),
    }
}

fn create_health_response(endpoint: &str, upstream: &str) -> Health {
    Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoint: endpoint.to_string(),
        upstream: upstream.to_string(),
    }
}

fn create_response_body(method: &Method, health: &Health) -> Body {
    if method == Method::GET {
        Json(health).into_response().into_body()
    } else {
        Body::empty()
    }
}

fn create_app_headers(health: &Health) -> HeaderMap {
    let short_hash = health.commit.get(..7).unwrap_or_default();

    let header_value = format!("{}:{}:{}", health.name, health.version, short_hash);

    let mut headers = HeaderMap::new();

    match header_value.parse::<HeaderValue>() {
        Ok(value) => {
            debug!("X-App header: {:?}", value);
            headers.insert("X-App", value);
        }
        Err(err) => {
            debug!("Failed to parse X-App header: {}", err);
        }
    }

    headers
}

pub async fn health<D: Dialer + 'static>(
    method: Method,
    Extension(collector): Extension<Arc<V2rayCollector<D>>>,
) -> impl IntoResponse {
    let (upstream, status) = upstream_status(collector.last_scrape_succeeded());
    let health = create_health_response(&collector.config().endpoint, upstream);
    let body = create_response_body(&method, &health);
    let headers = create_app_headers(&health);

    debug!(upstream, "health check");

    (status, headers, body)
}
