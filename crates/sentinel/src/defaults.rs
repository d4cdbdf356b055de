//! Zero-value -> built-in default resolution (C1).
//!
//! Grounded on `controllers/defaults/defaults.go`'s `SetDefault*` helpers:
//! a field that is absent or holds its zero value is replaced by a built-in
//! default. Nothing here mutates a `WatchObject`'s spec; callers merge these
//! into a local, effective-configuration view for the duration of one pass.

use crate::types::{AlertConfig, ReportInterval, SmtpAuthType, Target};

pub const DEFAULT_SCANNING_INTERVAL_SECS: u32 = 60;
pub const DEFAULT_LOG_LEVEL: u8 = 2;
pub const DEFAULT_DAYS_OUT: [u32; 3] = [30, 60, 90];

pub fn scanning_interval_secs(spec: Option<u32>) -> u32 {
    match spec {
        Some(0) | None => DEFAULT_SCANNING_INTERVAL_SECS,
        Some(v) => v,
    }
}

pub fn log_level(spec: Option<u8>) -> u8 {
    match spec {
        Some(v @ 1..=3) => v,
        _ => DEFAULT_LOG_LEVEL,
    }
}

pub fn days_out(target: &Target) -> Vec<u32> {
    if target.days_out.is_empty() {
        DEFAULT_DAYS_OUT.to_vec()
    } else {
        target.days_out.clone()
    }
}

/// An `AlertConfig` with its zero-valued fields resolved. `report_interval`,
/// `smtp_auth_type` already carry `#[serde(default)]` enum defaults; the two
/// SMTP TLS flags default to `true` when unset, matching the source's
/// `SetDefaultBool(true, ...)` calls.
pub struct EffectiveAlertConfig {
    pub report_interval: ReportInterval,
    pub smtp_auth_type: SmtpAuthType,
    pub smtp_use_ssl: bool,
    pub smtp_use_starttls: bool,
}

pub fn merge_alert_config(config: &AlertConfig) -> EffectiveAlertConfig {
    EffectiveAlertConfig {
        report_interval: config.report_interval.clone(),
        smtp_auth_type: config.smtp_auth_type.clone(),
        smtp_use_ssl: config.smtp_auth_use_ssl.unwrap_or(true),
        smtp_use_starttls: config.smtp_auth_use_starttls.unwrap_or(true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TargetKind;

    fn target(days_out: Vec<u32>) -> Target {
        Target {
            name: "t".into(),
            kind: TargetKind::Secret,
            api_version: "v1".into(),
            namespaces: vec![],
            namespace_labels: vec![],
            target_labels: vec![],
            service_account: "sa".into(),
            days_out,
        }
    }

    #[test]
    fn scanning_interval_defaults_on_zero_or_absent() {
        assert_eq!(scanning_interval_secs(None), DEFAULT_SCANNING_INTERVAL_SECS);
        assert_eq!(scanning_interval_secs(Some(0)), DEFAULT_SCANNING_INTERVAL_SECS);
        assert_eq!(scanning_interval_secs(Some(120)), 120);
    }

    #[test]
    fn log_level_clamps_to_one_through_three() {
        assert_eq!(log_level(None), DEFAULT_LOG_LEVEL);
        assert_eq!(log_level(Some(0)), DEFAULT_LOG_LEVEL);
        assert_eq!(log_level(Some(9)), DEFAULT_LOG_LEVEL);
        assert_eq!(log_level(Some(1)), 1);
        assert_eq!(log_level(Some(3)), 3);
    }

    #[test]
    fn days_out_defaults_when_empty() {
        assert_eq!(days_out(&target(vec![])), vec![30, 60, 90]);
        assert_eq!(days_out(&target(vec![7])), vec![7]);
    }

    #[test]
    fn alert_config_tls_flags_default_true() {
        let cfg = AlertConfig::default();
        let effective = merge_alert_config(&cfg);
        assert!(effective.smtp_use_ssl);
        assert!(effective.smtp_use_starttls);
    }
}
