use crate::{
    cli::telemetry::shutdown_tracer,
    collectors::{V2rayCollector, config::ScrapeConfig, exporter::ExporterCollector},
    v2ray::Dialer,
};
use anyhow::{Context, Result, anyhow};
use axum::{
    Extension, Router,
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::{Next, from_fn},
    response::Response,
    routing::get,
};
use opentelemetry::global;
use opentelemetry::trace::{TraceContextExt, TraceId};
use opentelemetry_http::HeaderExtractor;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{Span, error, info, info_span};
use tracing_opentelemetry::OpenTelemetrySpanExt;
use ulid::Ulid;

mod handlers;
mod shutdown;

pub use handlers::MetricsPath;

pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = if let Some(hash) = built_info::GIT_COMMIT_HASH {
    hash
} else {
    ":-("
};

/// Default path serving the V2Ray scrape.
pub const DEFAULT_METRICS_PATH: &str = "/scrape";

const RESERVED_PATHS: &[&str] = &["/", "/metrics", "/health"];

/// Start the HTTP server and serve until SIGINT/SIGTERM.
///
/// # Errors
///
/// Returns an error if the metrics path is invalid or the listener cannot bind.
pub async fn new(
    port: u16,
    listen: Option<String>,
    metrics_path: String,
    config: ScrapeConfig,
) -> Result<()> {
    let endpoint = config.endpoint.clone();
    let timeout = config.scrape_timeout;
    let collector = Arc::new(V2rayCollector::new(config));

    let app = router(collector, &metrics_path)?;

    let (listener, bind_addr) = bind(port, listen).await?;

    println!(
        "{} {} - Listening on {bind_addr}\n\n  - V2Ray endpoint: {endpoint}\n  - Scrape path: {metrics_path}\n  - Scrape timeout: {}s",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        timeout.as_secs_f64(),
    );

    if let Err(e) = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown::shutdown_signal())
        .await
    {
        error!(error=%e, "server error");
    }

    info!("shutting down");

    shutdown_tracer();

    Ok(())
}

/// Build the application router around `collector`.
///
/// # Errors
///
/// Returns an error if `metrics_path` is invalid or collides with a
/// built-in route, or if the self-monitoring registry cannot be built.
pub fn router<D: Dialer + 'static>(
    collector: Arc<V2rayCollector<D>>,
    metrics_path: &str,
) -> Result<Router> {
    validate_metrics_path(metrics_path)?;

    let self_metrics = ExporterCollector::new()?;

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(make_span)
        .on_response(on_response);

    let app = Router::new()
        .route("/", get(handlers::index))
        .route(metrics_path, get(handlers::scrape::<D>))
        .route("/metrics", get(handlers::metrics))
        .route(
            "/health",
            get(handlers::health::<D>).options(handlers::health::<D>),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(trace_layer)
                .layer(from_fn(add_trace_headers))
                .layer(Extension(collector))
                .layer(Extension(self_metrics))
                .layer(Extension(MetricsPath(Arc::from(metrics_path)))),
        );

    Ok(app)
}

/// Check that `path` can be routed next to `/`, `/metrics` and `/health`.
///
/// # Errors
///
/// Returns an error describing why the path is rejected.
pub fn validate_metrics_path(path: &str) -> Result<()> {
    if !path.starts_with('/') {
        return Err(anyhow!("Invalid metrics path '{path}': must start with '/'"));
    }

    if RESERVED_PATHS.contains(&path) {
        return Err(anyhow!(
            "Invalid metrics path '{path}': reserved for a built-in route"
        ));
    }

    if path.contains(['{', '}', '*', ':']) || path.contains("//") {
        return Err(anyhow!(
            "Invalid metrics path '{path}': must be a plain path"
        ));
    }

    Ok(())
}

async fn bind(port: u16, listen: Option<String>) -> Result<(TcpListener, String)> {
    if let Some(addr) = listen {
        let ip = addr.parse::<std::net::IpAddr>().map_err(|_| {
            anyhow!(
                "Invalid IP address: '{}'. Expected IPv4 (e.g., 0.0.0.0, 127.0.0.1) or IPv6 (e.g., ::, ::1)",
                addr
            )
        })?;

        let bind_addr = std::net::SocketAddr::new(ip, port);
        let listener = TcpListener::bind(bind_addr)
            .await
            .with_context(|| format!("Failed to bind to {bind_addr}"))?;

        return Ok((listener, bind_addr.to_string()));
    }

    // Auto: try IPv6 first, fallback to IPv4
    match TcpListener::bind(format!("::0:{port}")).await {
        Ok(listener) => Ok((listener, format!("[::]:{port}"))),
        Err(_) => Ok((
            TcpListener::bind(format!("0.0.0.0:{port}"))
                .await
                .with_context(|| format!("Failed to bind to 0.0.0.0:{port}"))?,
            format!("0.0.0.0:{port}"),
        )),
    }
}

fn make_span(request: &Request<Body>) -> Span {
    let parent_cx =
        global::get_text_map_propagator(|prop| prop.extract(&HeaderExtractor(request.headers())));

    let method = request.method().as_str();

    let path = request.uri().path();

    let target = request.uri().to_string();

    let scheme = request.uri().scheme_str().unwrap_or("http");

    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none");

    let user_agent = request
        .headers()
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    let span = info_span!(
        "http.server.request",
        otel.kind = "server",
        otel.status_code = tracing::field::Empty,
        http.method = method,
        http.route = path,
        http.target = target,
        http.scheme = scheme,
        http.user_agent = user_agent,
        request_id = request_id,
    );

    let _ = span.set_parent(parent_cx);

    span
}

#[allow(clippy::cast_possible_truncation)]
fn on_response<B>(response: &axum::http::Response<B>, latency: Duration, span: &Span) {
    if response.status().is_server_error() {
        span.record("otel.status_code", "ERROR");
    } else {
        span.record("otel.status_code", "OK");
    }

    let cx = span.context();
    let trace_id = cx.span().span_context().trace_id();

    if trace_id == TraceId::INVALID {
        info!(
            parent: span,
            status = response.status().as_u16(),
            elapsed_ms = latency.as_millis() as u64,
            "request completed"
        );
    } else {
        info!(
            parent: span,
            status = response.status().as_u16(),
            elapsed_ms = latency.as_millis() as u64,
            trace_id = %trace_id,
            "request completed"
        );
    }
}

async fn add_trace_headers(req: Request<Body>, next: Next) -> Response {
    let mut res = next.run(req).await;

    let span = Span::current();

    let cx = span.context();

    let span_context = cx.span().span_context().clone();

    if span_context.is_valid()
        && let Ok(val) = HeaderValue::from_str(&span_context.trace_id().to_string())
    {
        res.headers_mut()
            .insert(HeaderName::from_static("x-trace-id"), val);
    }

    res
}
