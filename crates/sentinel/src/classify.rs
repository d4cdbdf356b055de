//! Certificate classification (C4).
//!
//! Grounded on `helpers/x509_functions.go`'s `ParseCertificatesIntoLists`:
//! for each decoded certificate, compute the triggered thresholds (C2) and
//! assemble the inventory record the same shape the enclosing object/pass
//! will append to status.

use chrono::Utc;

use crate::decode::ParsedCertificate;
use crate::threshold::{triggered, Threshold};
use crate::types::{CertificateRecord, KeystoreCertificateRecord};

/// `expiration` is rendered as `YYYY-MM-DD HH:MM:SS +0000 UTC`, matching
/// the default time-to-string format of the source language (§6).
pub fn render_expiration(not_after: chrono::DateTime<Utc>) -> String {
    not_after.format("%Y-%m-%d %H:%M:%S +0000 UTC").to_string()
}

pub struct RecordContext<'a> {
    pub namespace: &'a str,
    pub object_name: &'a str,
    pub kind: &'a str,
    pub api_version: &'a str,
    pub data_key: &'a str,
}

pub fn build_record(
    ctx: &RecordContext,
    cert: &ParsedCertificate,
    thresholds: &[Threshold],
) -> CertificateRecord {
    CertificateRecord {
        namespace: ctx.namespace.to_string(),
        name: ctx.object_name.to_string(),
        kind: ctx.kind.to_string(),
        api_version: ctx.api_version.to_string(),
        data_key: ctx.data_key.to_string(),
        common_name: cert.common_name.clone(),
        issuer_common_name: cert.issuer_common_name.clone(),
        is_ca: cert.is_ca,
        expiration: render_expiration(cert.not_after),
        triggered_days_out: triggered(thresholds, cert.not_after),
    }
}

pub fn build_keystore_record(
    ctx: &RecordContext,
    alias: &str,
    cert: &ParsedCertificate,
    thresholds: &[Threshold],
) -> KeystoreCertificateRecord {
    KeystoreCertificateRecord {
        certificate: build_record(ctx, cert, thresholds),
        keystore_alias: alias.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threshold::thresholds;
    use chrono::TimeZone;

    fn cert(not_after: chrono::DateTime<Utc>) -> ParsedCertificate {
        ParsedCertificate {
            der: b"der-bytes".to_vec(),
            common_name: "leaf.example.test".into(),
            issuer_common_name: "ca.example.test".into(),
            is_ca: false,
            not_after,
        }
    }

    #[test]
    fn record_carries_triggered_thresholds_and_identity() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let th = thresholds(&[30, 60, 90], now);
        let not_after = now + chrono::Duration::days(20);
        let ctx = RecordContext {
            namespace: "ns-a",
            object_name: "s1",
            kind: "Secret",
            api_version: "v1",
            data_key: "tls.crt",
        };
        let record = build_record(&ctx, &cert(not_after), &th);
        assert_eq!(record.namespace, "ns-a");
        assert_eq!(record.triggered_days_out, vec![30, 60, 90]);
        assert_eq!(record.common_name, "leaf.example.test");
    }

    #[test]
    fn record_with_no_triggered_threshold_has_empty_vec() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let th = thresholds(&[30], now);
        let not_after = now + chrono::Duration::days(400);
        let ctx = RecordContext {
            namespace: "ns-a",
            object_name: "s1",
            kind: "Secret",
            api_version: "v1",
            data_key: "tls.crt",
        };
        let record = build_record(&ctx, &cert(not_after), &th);
        assert!(record.triggered_days_out.is_empty());
    }
}
