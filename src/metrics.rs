use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;
use tracing::info;

/// Initialize Prometheus metrics exporter
pub fn init_metrics(port: u16) -> Result<PrometheusHandle, Box<dyn std::error::Error + Send + Sync>> {
    let builder = PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .add_global_label("service", "pixelnova");

    let handle = builder.install_recorder()?;

    info!("Metrics server started on :{port}/metrics");
    Ok(handle)
}

/// Middleware to collect HTTP request metrics
pub async fn metrics_middleware(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    gauge!("http_requests_active").increment(1.0);

    let response = next.run(req).await;

    let duration = start.elapsed();
    let status = response.status();

    let labels = [
        ("method", method.to_string()),
        ("path", path),
        ("status", status.as_u16().to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());
    gauge!("http_requests_active").decrement(1.0);

    if status.is_server_error() {
        counter!("http_errors_total", &labels[..2]).increment(1);
    }

    response
}

/// Track a pipeline run's terminal state
pub fn track_generation(outcome: &'static str, duration: std::time::Duration) {
    counter!("generations_total", "outcome" => outcome).increment(1);
    histogram!("generation_duration_seconds", "outcome" => outcome)
        .record(duration.as_secs_f64());
}

/// Track token ledger movements
pub fn track_token_debit(subscription_used: i64, purchased_used: i64) {
    counter!("tokens_debited_total", "pool" => "subscription")
        .increment(subscription_used.max(0) as u64);
    counter!("tokens_debited_total", "pool" => "purchased")
        .increment(purchased_used.max(0) as u64);
}

pub fn track_payment(status: &'static str) {
    counter!("payments_total", "status" => status).increment(1);
}
