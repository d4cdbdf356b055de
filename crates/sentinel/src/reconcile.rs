//! Reconcile engine (C10).
//!
//! Grounded on `control::caclient::CaClient::run_fetcher`'s backoff-loop
//! idiom (generalized from "refresh a certificate" to "reconcile a watch")
//! and the `other_examples` openbao-pki-controller's `reconcile`/
//! `error_policy` split. Implements the per-pass algorithm of SPEC_FULL §4.9
//! end to end, against the `ObjectStore` seam (C16) rather than a live
//! client, so it is exercised directly by the scenario tests in `tests/`.

use std::sync::atomic::Ordering;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::classify::{build_keystore_record, build_record, RecordContext};
use crate::dedup::DedupSet;
use crate::defaults::{self, merge_alert_config};
use crate::dispatch::{self, DispatchRequest, SmtpCredentials};
use crate::error::ReconcileError;
use crate::report::render_html::render_html_table;
use crate::report::render_text::render_text_table;
use crate::report::state_machine::{effective_last_report_sent, interval_seconds, should_dispatch};
use crate::report::{reportable_rows, ReportPreamble};
use crate::scope::effective_namespaces;
use crate::session::build_session;
use crate::status::{changed, project_cert_status, project_keystore_status};
use crate::store::ObjectStore;
use crate::telemetry::Metrics;
use crate::types::{
    Alert, AlertType, CertWatchStatus, CertificateRecord, KeystoreCertificateRecord,
    KeystorePassword, KeystoreWatchStatus, Selector, Target, TargetKind,
};

/// Default backoff for pass-level failures that aren't governed by the
/// watch's own `scanningInterval` (grounded on the `other_examples`
/// controller's `error_policy` returning `Action::requeue(Duration::from_secs(5))`).
pub const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(5);

pub enum Outcome {
    /// The pass completed (possibly with a status write); requeue after
    /// the effective `scanningInterval`.
    Done { requeue_after: Duration },
    /// A fatal error occurred; requeue after the duration carried on the
    /// error itself, surfaced to the control plane's error policy.
    Error { error: ReconcileError },
}

fn kind_str(kind: &TargetKind) -> &'static str {
    match kind {
        TargetKind::ConfigMap => "ConfigMap",
        TargetKind::Secret => "Secret",
        TargetKind::Unknown => "Unknown",
    }
}

struct ScanOutput {
    cert_records: Vec<CertificateRecord>,
    keystore_records: Vec<KeystoreCertificateRecord>,
    total_keystores_found: i64,
    keystores_at_risk: i64,
}

/// Scans all objects in one namespace for one target, shared by both watch
/// variants. `keystore_password` is `Some` only for keystore-mode targets.
/// Callers must already have rejected `TargetKind::Unknown` (§4.9 step 5c);
/// this never runs against it.
async fn scan_namespace(
    store: &dyn ObjectStore,
    namespace: &str,
    target: &Target,
    target_selector: &Selector,
    thresholds: &[crate::threshold::Threshold],
    keystore_password: Option<&[u8]>,
    dedup: &mut DedupSet,
    metrics: &Metrics,
) -> ScanOutput {
    let objects = match target.kind {
        TargetKind::ConfigMap => store
            .list_config_maps(namespace, target_selector)
            .await
            .map_err(|e| {
                warn!(namespace, "failed to list config maps: {e}");
                e
            })
            .unwrap_or_default(),
        TargetKind::Secret => store
            .list_secrets(namespace, target_selector)
            .await
            .map_err(|e| {
                warn!(namespace, "failed to list secrets: {e}");
                e
            })
            .unwrap_or_default(),
        TargetKind::Unknown => unreachable!("reconcile_cert_watch/reconcile_keystore_watch guard against Unknown kind before scanning"),
    };

    let mut cert_records = Vec::new();
    let mut keystore_records = Vec::new();
    let mut total_keystores_found = 0i64;
    let mut keystores_at_risk = 0i64;

    for object in &objects {
        for (data_key, value) in &object.data {
            let ctx = RecordContext {
                namespace,
                object_name: &object.name,
                kind: kind_str(&target.kind),
                api_version: &target.api_version,
                data_key,
            };

            if let Some(password) = keystore_password {
                let Ok(entries) = crate::decode::decode_keystore_certificates(value, password) else {
                    continue;
                };
                if entries.is_empty() {
                    continue;
                }
                total_keystores_found += 1;
                let mut at_risk = false;
                for (alias, cert) in &entries {
                    let fp = crate::dedup::fingerprint(
                        ctx.kind,
                        ctx.namespace,
                        ctx.object_name,
                        &cert.common_name,
                        &cert.issuer_common_name,
                        &cert.der,
                    );
                    if !dedup.insert_if_new(fp) {
                        continue;
                    }
                    let record = build_keystore_record(&ctx, alias, cert, thresholds);
                    if !record.certificate.triggered_days_out.is_empty() {
                        at_risk = true;
                    }
                    keystore_records.push(record);
                }
                if at_risk {
                    keystores_at_risk += 1;
                }
                continue;
            }

            if !crate::decode::looks_like_pem_certificate(value) {
                continue;
            }
            let Ok(certs) = crate::decode::decode_pem_certificates(value) else {
                continue;
            };
            for cert in &certs {
                let fp = crate::dedup::fingerprint(
                    ctx.kind,
                    ctx.namespace,
                    ctx.object_name,
                    &cert.common_name,
                    &cert.issuer_common_name,
                    &cert.der,
                );
                if !dedup.insert_if_new(fp) {
                    continue;
                }
                cert_records.push(build_record(&ctx, cert, thresholds));
            }
        }
    }

    metrics
        .certificates_scanned
        .fetch_add((cert_records.len() + keystore_records.len()) as u64, Ordering::Relaxed);

    ScanOutput {
        cert_records,
        keystore_records,
        total_keystores_found,
        keystores_at_risk,
    }
}

fn report_preamble(
    namespace: &str,
    name: &str,
    now: DateTime<Utc>,
    api_endpoint: &str,
    total_found: usize,
    expiring_found: usize,
    keystore_counts: Option<(usize, usize)>,
) -> ReportPreamble {
    ReportPreamble {
        watch_namespace: namespace.to_string(),
        watch_name: name.to_string(),
        dispatch_time: now,
        api_endpoint: api_endpoint.to_string(),
        total_certificates_found: total_found,
        expiring_certificates_found: expiring_found,
        total_keystores_found: keystore_counts.map(|(t, _)| t),
        keystores_at_risk: keystore_counts.map(|(_, r)| r),
    }
}

async fn smtp_credentials(
    store: &dyn ObjectStore,
    watch_namespace: &str,
    secret_name: &str,
) -> Option<SmtpCredentials> {
    if secret_name.is_empty() {
        return None;
    }
    let secret = store.get_secret(watch_namespace, secret_name).await.ok()??;
    let username = String::from_utf8_lossy(secret.data.get("username")?).into_owned();
    let password = String::from_utf8_lossy(secret.data.get("password")?).into_owned();
    let identity = secret
        .data
        .get("identity")
        .or_else(|| secret.data.get("cram"))
        .map(|v| String::from_utf8_lossy(v).into_owned());
    Some(SmtpCredentials {
        username,
        password,
        identity,
    })
}

async fn run_dispatch(
    store: &dyn ObjectStore,
    watch_namespace: &str,
    alert: &Alert,
    preamble: &ReportPreamble,
    text: String,
    html: String,
    metrics: &Metrics,
) -> bool {
    let sent = match alert.alert_type {
        AlertType::Smtp => {
            let effective = merge_alert_config(&alert.config);
            let credentials =
                smtp_credentials(store, watch_namespace, &alert.config.smtp_auth_secret_name).await;
            let request = DispatchRequest {
                endpoint: &alert.config.smtp_endpoint,
                sender: &alert.config.smtp_sender_email_address,
                recipients: &alert.config.smtp_destination_email_addresses,
                auth_type: &effective.smtp_auth_type,
                credentials,
                use_ssl: effective.smtp_use_ssl,
                use_starttls: effective.smtp_use_starttls,
                subject: &format!("Certificate expiry report: {}/{}", preamble.watch_namespace, preamble.watch_name),
                html_body: &html,
            };
            match dispatch::dispatch(request).await {
                Ok(()) => true,
                Err(e) => {
                    warn!("SMTP dispatch failed: {e}");
                    false
                }
            }
        }
        AlertType::Logger | AlertType::Other => {
            info!("{}", text);
            true
        }
    };
    if sent {
        metrics.reports_dispatched.fetch_add(1, Ordering::Relaxed);
    }
    sent
}

pub struct CertWatchInputs<'a> {
    pub namespace: &'a str,
    pub name: &'a str,
    pub target: &'a Target,
    pub alert: &'a Alert,
    pub scanning_interval: Option<u32>,
    pub prior_status: &'a CertWatchStatus,
    pub api_endpoint: &'a str,
    pub metrics: &'a Metrics,
}

pub async fn reconcile_cert_watch(
    store: &dyn ObjectStore,
    inputs: CertWatchInputs<'_>,
    now: DateTime<Utc>,
) -> Outcome {
    let scanning_interval = Duration::from_secs(defaults::scanning_interval_secs(inputs.scanning_interval) as u64);

    if inputs.target.kind == TargetKind::Unknown {
        warn!(namespace = inputs.namespace, name = inputs.name, "target has an unrecognized kind; skipping scan");
        return Outcome::Error {
            error: ReconcileError::InvalidKind { backoff: scanning_interval },
        };
    }

    let days_out = defaults::days_out(inputs.target);
    let thresholds = crate::threshold::thresholds(&days_out, now);
    let namespace_selector = Selector::compile(&inputs.target.namespace_labels);
    let target_selector = Selector::compile(&inputs.target.target_labels);

    if let Err(e) = build_session(store, inputs.namespace, &inputs.target.service_account).await {
        return Outcome::Error {
            error: ReconcileError::SessionBuildFailed { source: e, backoff: scanning_interval },
        };
    }

    let namespaces = match effective_namespaces(store, &inputs.target.namespaces, &namespace_selector).await {
        Ok(ns) => ns,
        Err(e) => {
            return Outcome::Error {
                error: ReconcileError::NamespaceListFailed { source: e, backoff: DEFAULT_ERROR_BACKOFF },
            }
        }
    };

    let mut dedup = DedupSet::new();
    let mut all_records = Vec::new();
    for namespace in &namespaces {
        let mut output = scan_namespace(
            store,
            namespace,
            inputs.target,
            &target_selector,
            &thresholds,
            None,
            &mut dedup,
            inputs.metrics,
        )
        .await;
        all_records.append(&mut output.cert_records);
    }

    let mut candidate = project_cert_status(all_records, inputs.prior_status.last_report_sent);

    if candidate.expiring_certificates > 0 {
        let interval = interval_seconds(&merge_alert_config(&inputs.alert.config).report_interval);
        let effective_last = effective_last_report_sent(inputs.prior_status.last_report_sent, now.timestamp());
        if should_dispatch(effective_last, now.timestamp(), interval) {
            let rows = reportable_rows::<CertificateRecord, _>(&candidate.discovered_certificates);
            let preamble = report_preamble(
                inputs.namespace,
                inputs.name,
                now,
                inputs.api_endpoint,
                candidate.discovered_certificates.len(),
                candidate.expiring_certificates as usize,
                None,
            );
            let text = render_text_table(&preamble, &rows);
            let html = render_html_table(&preamble, &rows);
            if run_dispatch(store, inputs.namespace, inputs.alert, &preamble, text, html, inputs.metrics).await {
                candidate.last_report_sent = now.timestamp();
            }
        }
    }

    if changed(inputs.prior_status, &candidate) {
        if let Err(e) = store
            .patch_cert_watch_status(inputs.namespace, inputs.name, &candidate)
            .await
        {
            return Outcome::Error {
                error: ReconcileError::StatusUpdateFailed { source: e, backoff: DEFAULT_ERROR_BACKOFF },
            };
        }
    }

    Outcome::Done {
        requeue_after: scanning_interval,
    }
}

pub struct KeystoreWatchInputs<'a> {
    pub namespace: &'a str,
    pub name: &'a str,
    pub target: &'a Target,
    pub keystore_password: &'a KeystorePassword,
    pub alert: &'a Alert,
    pub scanning_interval: Option<u32>,
    pub prior_status: &'a KeystoreWatchStatus,
    pub api_endpoint: &'a str,
    pub metrics: &'a Metrics,
}

pub async fn reconcile_keystore_watch(
    store: &dyn ObjectStore,
    inputs: KeystoreWatchInputs<'_>,
    now: DateTime<Utc>,
) -> Outcome {
    let scanning_interval = Duration::from_secs(defaults::scanning_interval_secs(inputs.scanning_interval) as u64);

    if inputs.target.kind == TargetKind::Unknown {
        warn!(namespace = inputs.namespace, name = inputs.name, "target has an unrecognized kind; skipping scan");
        return Outcome::Error {
            error: ReconcileError::InvalidKind { backoff: scanning_interval },
        };
    }

    let days_out = defaults::days_out(inputs.target);
    let thresholds = crate::threshold::thresholds(&days_out, now);
    let namespace_selector = Selector::compile(&inputs.target.namespace_labels);
    let target_selector = Selector::compile(&inputs.target.target_labels);

    if let Err(e) = build_session(store, inputs.namespace, &inputs.target.service_account).await {
        return Outcome::Error {
            error: ReconcileError::SessionBuildFailed { source: e, backoff: scanning_interval },
        };
    }

    let namespaces = match effective_namespaces(store, &inputs.target.namespaces, &namespace_selector).await {
        Ok(ns) => ns,
        Err(e) => {
            return Outcome::Error {
                error: ReconcileError::NamespaceListFailed { source: e, backoff: DEFAULT_ERROR_BACKOFF },
            }
        }
    };

    let mut dedup = DedupSet::new();
    let mut all_records = Vec::new();
    let mut total_keystores_found = 0i64;
    let mut keystores_at_risk = 0i64;

    for namespace in &namespaces {
        let password = match crate::keystore_password::resolve_keystore_password(
            store,
            inputs.namespace,
            namespace,
            inputs.keystore_password,
        )
        .await
        {
            Ok(pw) => pw,
            Err(e) => {
                warn!(namespace, "keystore password resolve failed: {e}");
                continue;
            }
        };

        let mut output = scan_namespace(
            store,
            namespace,
            inputs.target,
            &target_selector,
            &thresholds,
            Some(&password),
            &mut dedup,
            inputs.metrics,
        )
        .await;
        all_records.append(&mut output.keystore_records);
        total_keystores_found += output.total_keystores_found;
        keystores_at_risk += output.keystores_at_risk;
    }

    let mut candidate = project_keystore_status(
        all_records,
        total_keystores_found,
        keystores_at_risk,
        inputs.prior_status.last_report_sent,
    );

    if candidate.expiring_certificates > 0 {
        let interval = interval_seconds(&merge_alert_config(&inputs.alert.config).report_interval);
        let effective_last = effective_last_report_sent(inputs.prior_status.last_report_sent, now.timestamp());
        if should_dispatch(effective_last, now.timestamp(), interval) {
            let rows = reportable_rows::<KeystoreCertificateRecord, _>(&candidate.discovered_certificates);
            let preamble = report_preamble(
                inputs.namespace,
                inputs.name,
                now,
                inputs.api_endpoint,
                candidate.discovered_certificates.len(),
                candidate.expiring_certificates as usize,
                Some((candidate.total_keystores_found as usize, candidate.keystores_at_risk as usize)),
            );
            let text = render_text_table(&preamble, &rows);
            let html = render_html_table(&preamble, &rows);
            if run_dispatch(store, inputs.namespace, inputs.alert, &preamble, text, html, inputs.metrics).await {
                candidate.last_report_sent = now.timestamp();
            }
        }
    }

    if changed(inputs.prior_status, &candidate) {
        if let Err(e) = store
            .patch_keystore_watch_status(inputs.namespace, inputs.name, &candidate)
            .await
        {
            return Outcome::Error {
                error: ReconcileError::StatusUpdateFailed { source: e, backoff: DEFAULT_ERROR_BACKOFF },
            };
        }
    }

    Outcome::Done {
        requeue_after: scanning_interval,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fake::{token_secret, FakeObjectStore};
    use crate::store::{DataObject, ServiceAccountInfo};
    use crate::telemetry::Metrics;
    use crate::types::{AlertConfig, AlertType, LabelFilter, LabelOp, TargetKind};
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn base_target(namespaces: Vec<String>) -> Target {
        Target {
            name: "t".into(),
            kind: TargetKind::Secret,
            api_version: "v1".into(),
            namespaces,
            namespace_labels: vec![],
            target_labels: vec![],
            service_account: "reader".into(),
            days_out: vec![30],
        }
    }

    fn logger_alert() -> Alert {
        Alert {
            alert_type: AlertType::Logger,
            name: "a".into(),
            config: AlertConfig::default(),
        }
    }

    fn with_session(fake: &mut FakeObjectStore, namespace: &str) {
        fake.service_accounts.insert(
            (namespace.to_string(), "reader".to_string()),
            ServiceAccountInfo {
                secret_names: vec!["reader-token".into()],
            },
        );
        fake.secrets.push(token_secret(namespace, "reader-token", "tok"));
    }

    fn secret_with_cert(namespace: &str, name: &str, labels: &[(&str, &str)], pem: &str) -> DataObject {
        let mut data = BTreeMap::new();
        data.insert("tls.crt".to_string(), pem.as_bytes().to_vec());
        DataObject {
            name: name.to_string(),
            namespace: namespace.to_string(),
            labels: labels.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            data,
            object_type: Some("kubernetes.io/tls".into()),
        }
    }

    fn self_signed_pem(days_valid: i64) -> String {
        let mut params = rcgen::CertificateParams::new(vec!["example.test".into()]).unwrap();
        params.not_before = time::OffsetDateTime::now_utc() - time::Duration::days(1);
        params.not_after = time::OffsetDateTime::now_utc() + time::Duration::days(days_valid);
        let key_pair = rcgen::KeyPair::generate().unwrap();
        params.self_signed(&key_pair).unwrap().pem()
    }

    #[tokio::test]
    async fn empty_namespaces_yields_empty_inventory_no_error() {
        let mut fake = FakeObjectStore::new();
        with_session(&mut fake, "ns-a");
        let target = base_target(vec![]);
        let alert = logger_alert();
        let prior = CertWatchStatus::default();
        let metrics = Metrics::default();
        let outcome = reconcile_cert_watch(
            &fake,
            CertWatchInputs {
                namespace: "ns-a",
                name: "w1",
                target: &target,
                alert: &alert,
                scanning_interval: None,
                prior_status: &prior,
                api_endpoint: "https://cluster.local",
                metrics: &metrics,
            },
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        )
        .await;
        assert!(matches!(outcome, Outcome::Done { .. }));
        assert!(fake.last_cert_status("ns-a", "w1").is_none());
    }

    #[tokio::test]
    async fn target_label_selector_filters_out_non_matching_secret() {
        let mut fake = FakeObjectStore::new();
        with_session(&mut fake, "ns-a");
        let pem = self_signed_pem(19); // expires before the 30-day threshold
        fake.secrets.push(secret_with_cert("ns-a", "s1", &[("app", "web")], &pem));
        fake.secrets.push(secret_with_cert("ns-a", "s2", &[("app", "db")], &pem));

        let mut target = base_target(vec!["ns-a".to_string()]);
        target.target_labels = vec![LabelFilter {
            key: "app".into(),
            op: LabelOp::Equals,
            values: vec!["web".into()],
        }];
        let alert = logger_alert();
        let prior = CertWatchStatus::default();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let metrics = Metrics::default();
        reconcile_cert_watch(
            &fake,
            CertWatchInputs {
                namespace: "ns-a",
                name: "w1",
                target: &target,
                alert: &alert,
                scanning_interval: None,
                prior_status: &prior,
                api_endpoint: "https://cluster.local",
                metrics: &metrics,
            },
            now,
        )
        .await;

        let status = fake.last_cert_status("ns-a", "w1").unwrap();
        assert_eq!(status.discovered_certificates.len(), 1);
        assert_eq!(status.discovered_certificates[0].name, "s1");
        assert_eq!(status.expiring_certificates, 1);
    }

    #[tokio::test]
    async fn second_pass_with_no_changes_does_not_rewrite_status() {
        let mut fake = FakeObjectStore::new();
        with_session(&mut fake, "ns-a");
        let pem = self_signed_pem(19);
        fake.secrets.push(secret_with_cert("ns-a", "s1", &[], &pem));
        let target = base_target(vec!["ns-a".to_string()]);
        let alert = logger_alert();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let metrics = Metrics::default();

        let prior = CertWatchStatus::default();
        reconcile_cert_watch(
            &fake,
            CertWatchInputs {
                namespace: "ns-a",
                name: "w1",
                target: &target,
                alert: &alert,
                scanning_interval: None,
                prior_status: &prior,
                api_endpoint: "https://cluster.local",
                metrics: &metrics,
            },
            now,
        )
        .await;
        let first_write_count = fake.patched_cert_status.lock().unwrap().len();
        assert_eq!(first_write_count, 1);

        let prior2 = fake.last_cert_status("ns-a", "w1").unwrap();
        reconcile_cert_watch(
            &fake,
            CertWatchInputs {
                namespace: "ns-a",
                name: "w1",
                target: &target,
                alert: &alert,
                scanning_interval: None,
                prior_status: &prior2,
                api_endpoint: "https://cluster.local",
                metrics: &metrics,
            },
            now,
        )
        .await;
        let second_write_count = fake.patched_cert_status.lock().unwrap().len();
        assert_eq!(second_write_count, 1, "unchanged status must not be rewritten");
    }

    #[tokio::test]
    async fn unknown_target_kind_is_an_invalid_kind_error_with_no_status_write() {
        let fake = FakeObjectStore::new();
        let mut target = base_target(vec!["ns-a".to_string()]);
        target.kind = TargetKind::Unknown;
        let alert = logger_alert();
        let prior = CertWatchStatus::default();
        let metrics = Metrics::default();
        let outcome = reconcile_cert_watch(
            &fake,
            CertWatchInputs {
                namespace: "ns-a",
                name: "w1",
                target: &target,
                alert: &alert,
                scanning_interval: Some(120),
                prior_status: &prior,
                api_endpoint: "https://cluster.local",
                metrics: &metrics,
            },
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        )
        .await;
        match outcome {
            Outcome::Error { error } => {
                assert!(matches!(error, ReconcileError::InvalidKind { .. }));
                assert_eq!(error.backoff(), Duration::from_secs(120));
            }
            _ => panic!("expected Outcome::Error for an unrecognized target kind"),
        }
        assert!(fake.patched_cert_status.lock().unwrap().is_empty());
    }
}
