//! Process-level configuration (C17).
//!
//! Grounded on the `agentgateway-app` CLI/bootstrap idiom: a `clap`-derived
//! struct layered over environment variables, resolved once at startup and
//! threaded immutably through the reconcile context. No global mutable
//! configuration state exists anywhere in this crate.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Resolved process configuration. Built once from CLI flags/env vars and
/// carried immutably by the controller wiring; never mutated after
/// startup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub concurrency: usize,
    pub default_error_backoff_secs: u64,
    pub metrics_addr: std::net::SocketAddr,
    pub log_format: LogFormat,
    pub kubeconfig: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            concurrency: 4,
            default_error_backoff_secs: crate::reconcile::DEFAULT_ERROR_BACKOFF.as_secs(),
            metrics_addr: "0.0.0.0:8080".parse().unwrap(),
            log_format: LogFormat::default(),
            kubeconfig: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_concurrency() {
        let cfg = Config::default();
        assert!(cfg.concurrency > 0);
        assert_eq!(cfg.log_format, LogFormat::Pretty);
    }
}
