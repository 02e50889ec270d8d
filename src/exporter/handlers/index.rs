use axum::{extract::Extension, response::Html};
use std::sync::Arc;

/// Path the V2Ray scrape is served on, shared with the landing page.
#[derive(Clone, Debug)]
pub struct MetricsPath(pub Arc<str>);

fn render(metrics_path: &str) -> String {
    format!(
        r#"<html>
<head><title>V2Ray Exporter</title></head>
<body>
<h1>V2Ray Exporter {version}</h1>
<p><a href="{metrics_path}">Scrape V2Ray</a></p>
<p><a href="/metrics">Exporter metrics</a></p>
<p><a href="/health">Health</a></p>
</body>
</html>
"#,
        version = env!("CARGO_PKG_VERSION"),
    )
}

pub async fn index(Extension(MetricsPath(path)): Extension<MetricsPath>) -> Html<String> {
    Html(render(&path))
}
