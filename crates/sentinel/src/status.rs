//! Status projection (C14).
//!
//! Grounded on `shared_controller_functions.go` + SPEC_FULL I5: build the
//! candidate status, then let the reconcile engine compare it against the
//! previously stored value by structural equality before writing.

use crate::types::{CertWatchStatus, CertificateRecord, KeystoreCertificateRecord, KeystoreWatchStatus};

pub fn project_cert_status(records: Vec<CertificateRecord>, last_report_sent: i64) -> CertWatchStatus {
    let expiring_certificates = records.iter().filter(|r| !r.triggered_days_out.is_empty()).count() as i64;
    CertWatchStatus {
        discovered_certificates: records,
        expiring_certificates,
        last_report_sent,
    }
}

pub fn project_keystore_status(
    records: Vec<KeystoreCertificateRecord>,
    total_keystores_found: i64,
    keystores_at_risk: i64,
    last_report_sent: i64,
) -> KeystoreWatchStatus {
    let expiring_certificates = records
        .iter()
        .filter(|r| !r.certificate.triggered_days_out.is_empty())
        .count() as i64;
    KeystoreWatchStatus {
        discovered_certificates: records,
        expiring_certificates,
        total_keystores_found,
        keystores_at_risk,
        last_report_sent,
    }
}

/// Status writes only happen when the candidate differs from what's
/// already stored (I5/P4). `CertWatchStatus`/`KeystoreWatchStatus` derive
/// `PartialEq` over exactly the fields I5 names, so this is a direct
/// comparison rather than a field-by-field diff.
pub fn changed<T: PartialEq>(stored: &T, candidate: &T) -> bool {
    stored != candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(triggered: Vec<u32>) -> CertificateRecord {
        CertificateRecord {
            triggered_days_out: triggered,
            ..Default::default()
        }
    }

    #[test]
    fn expiring_count_matches_records_with_triggers() {
        let status = project_cert_status(vec![record(vec![30]), record(vec![])], 0);
        assert_eq!(status.expiring_certificates, 1);
    }

    #[test]
    fn identical_status_is_not_changed() {
        let a = project_cert_status(vec![record(vec![30])], 100);
        let b = project_cert_status(vec![record(vec![30])], 100);
        assert!(!changed(&a, &b));
    }

    #[test]
    fn differing_last_report_sent_is_changed() {
        let a = project_cert_status(vec![], 100);
        let b = project_cert_status(vec![], 200);
        assert!(changed(&a, &b));
    }
}
