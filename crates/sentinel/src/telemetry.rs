//! Observability (C18).
//!
//! Grounded on `management/admin.rs`'s trait/server idiom for the admin
//! surface, and on `agentgateway-app`'s `tracing-subscriber` init for
//! process-wide log formatting. Per-watch `logLevel` gates which fields are
//! attached to the reconcile span (see `reconcile_span`); it never touches
//! the ambient `RUST_LOG` filter, which stays a process-wide concern set
//! up once here.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::Span;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{Config, LogFormat};

pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Pretty => {
            fmt().with_env_filter(filter).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(filter).init();
        }
    }
}

/// Process-wide counters exposed via `/metrics`. Pass-local state (the
/// dedup set, per-pass record buffer) never touches this; only aggregate
/// totals do.
#[derive(Default)]
pub struct Metrics {
    pub certificates_scanned: AtomicU64,
    pub reports_dispatched: AtomicU64,
    pub reconcile_errors: AtomicU64,
}

impl Metrics {
    pub fn render_prometheus_text(&self) -> String {
        format!(
            "# TYPE sentinel_certificates_scanned_total counter\n\
             sentinel_certificates_scanned_total {}\n\
             # TYPE sentinel_reports_dispatched_total counter\n\
             sentinel_reports_dispatched_total {}\n\
             # TYPE sentinel_reconcile_errors_total counter\n\
             sentinel_reconcile_errors_total {}\n",
            self.certificates_scanned.load(Ordering::Relaxed),
            self.reports_dispatched.load(Ordering::Relaxed),
            self.reconcile_errors.load(Ordering::Relaxed),
        )
    }
}

/// Opens a span for one reconcile pass. `log_level` (1..3) gates which
/// additional fields/events the caller attaches within the span; the span
/// itself is always created so ambient `RUST_LOG` filtering still applies.
pub fn reconcile_span(namespace: &str, name: &str, log_level: u8) -> Span {
    tracing::info_span!("reconcile", watch.namespace = namespace, watch.name = name, log_level)
}

/// A tiny hand-rolled HTTP responder for the admin surface (`/healthz`,
/// `/metrics`, `/debug/config`). Three fixed routes don't warrant pulling
/// in a web framework (see DESIGN.md).
pub async fn serve_admin(addr: SocketAddr, metrics: Arc<Metrics>, config: Config) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    loop {
        let (mut socket, _) = listener.accept().await?;
        let metrics = metrics.clone();
        let config = config.clone();
        tokio::spawn(async move {
            let mut buf = [0u8; 1024];
            let n = match socket.read(&mut buf).await {
                Ok(n) => n,
                Err(_) => return,
            };
            let request = String::from_utf8_lossy(&buf[..n]);
            let path = request
                .lines()
                .next()
                .and_then(|line| line.split_whitespace().nth(1))
                .unwrap_or("/");

            let (status, content_type, body) = match path {
                "/healthz" => ("200 OK", "text/plain", "ok".to_string()),
                "/metrics" => ("200 OK", "text/plain", metrics.render_prometheus_text()),
                "/debug/config" => (
                    "200 OK",
                    "application/json",
                    serde_json::to_string_pretty(&config).unwrap_or_default(),
                ),
                _ => ("404 Not Found", "text/plain", "not found".to_string()),
            };

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prometheus_text_reports_all_three_counters() {
        let metrics = Metrics::default();
        metrics.certificates_scanned.fetch_add(5, Ordering::Relaxed);
        let text = metrics.render_prometheus_text();
        assert!(text.contains("sentinel_certificates_scanned_total 5"));
        assert!(text.contains("sentinel_reports_dispatched_total 0"));
        assert!(text.contains("sentinel_reconcile_errors_total 0"));
    }
}
