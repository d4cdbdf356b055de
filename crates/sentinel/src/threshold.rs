//! Expiry threshold model (C2).
//!
//! Grounded on `helpers/x509_functions.go`'s `ParseCertificatesIntoLists`:
//! a days-out set is converted into absolute future timestamps, and a
//! certificate triggers a threshold iff that timestamp is strictly after
//! the certificate's `notAfter`.

use chrono::{DateTime, Utc};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Threshold {
    pub days: u32,
    pub at: DateTime<Utc>,
}

/// Thresholds are returned in the same order `days_out` was given (I3: no
/// sort).
pub fn thresholds(days_out: &[u32], now: DateTime<Utc>) -> Vec<Threshold> {
    days_out
        .iter()
        .map(|&days| Threshold {
            days,
            at: now + chrono::Duration::days(days as i64),
        })
        .collect()
}

/// Which thresholds a certificate with the given `not_after` triggers,
/// preserving the order of `thresholds`. Equality does not trigger (B3).
pub fn triggered(thresholds: &[Threshold], not_after: DateTime<Utc>) -> Vec<u32> {
    thresholds
        .iter()
        .filter(|t| t.at > not_after)
        .map(|t| t.days)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn thresholds_preserve_input_order() {
        let th = thresholds(&[90, 30, 60], now());
        assert_eq!(th.iter().map(|t| t.days).collect::<Vec<_>>(), vec![90, 30, 60]);
    }

    #[test]
    fn triggers_only_strictly_after() {
        let th = thresholds(&[30], now());
        let exactly_at_threshold = now() + chrono::Duration::days(30);
        assert!(triggered(&th, exactly_at_threshold).is_empty());

        let just_before = exactly_at_threshold - chrono::Duration::seconds(1);
        assert_eq!(triggered(&th, just_before), vec![30]);

        let well_after = now() + chrono::Duration::days(400);
        assert!(triggered(&th, well_after).is_empty());
    }

    #[test]
    fn triggered_subset_preserves_threshold_order() {
        let th = thresholds(&[90, 30, 60], now());
        let not_after = now() + chrono::Duration::days(10);
        assert_eq!(triggered(&th, not_after), vec![90, 30, 60]);
    }
}
