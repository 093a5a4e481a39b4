//! Prometheus wiring shared by kit services.
use std::future::Future;
use std::time::Instant;

use axum::{
    body::Body, extract::MatchedPath, http::Request, middleware::Next, response::IntoResponse,
    routing::get, Router,
};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Bind `bind` and serve `router` until `shutdown` resolves.
pub async fn serve<F>(router: Router, bind: &str, shutdown: F) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(bind).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

/// Add the `/metrics` route to an existing router, installing the global recorder with
/// `service` as a label on every series. Routes added before this call are tracked.
pub fn setup_metrics_routes(router: Router, service: &str) -> Result<Router, BuildError> {
    let recorder_handle = setup_metrics_recorder(service)?;

    Ok(router
        .route(
            "/metrics",
            get(move || std::future::ready(recorder_handle.render())),
        )
        .layer(axum::middleware::from_fn(track_metrics)))
}

pub fn setup_metrics_recorder(service: &str) -> Result<PrometheusHandle, BuildError> {
    // Vendor requests give up after 10s, so there is nothing to bucket past that.
    const SECONDS: &[f64] = &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0];

    PrometheusBuilder::new()
        .add_global_label("service", service)
        .set_buckets(SECONDS)?
        .install_recorder()
}

/// Count and time every request by route and status class.
pub async fn track_metrics(req: Request<Body>, next: Next) -> impl IntoResponse {
    let start = Instant::now();

    let route = route_label(&req);
    let method = req.method().to_string();

    let response = next.run(req).await;

    let labels = [
        ("method", method),
        ("route", route),
        ("status", status_class(response.status().as_u16()).to_owned()),
    ];

    metrics::counter!("kit_http_requests_total", &labels).increment(1);
    metrics::histogram!("kit_http_requests_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());

    response
}

/// Unmatched paths share one label instead of one series per probed URL.
fn route_label(req: &Request<Body>) -> String {
    req.extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned())
}

fn status_class(status: u16) -> &'static str {
    match status {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    }
}
