//! Intra-pass deduplication (C5).
//!
//! Grounded on `shared_controller_functions.go`'s
//! `createUniqueCertificateChecksum`: fingerprint = SHA-1 over
//! (kind, namespace, object name, subject CN, issuer CN, DER bytes). The
//! fingerprint set is pass-local and discarded at pass end (I2).

use sha1::{Digest, Sha1};

pub type Fingerprint = [u8; 20];

pub fn fingerprint(
    kind: &str,
    namespace: &str,
    object_name: &str,
    common_name: &str,
    issuer_common_name: &str,
    der: &[u8],
) -> Fingerprint {
    let mut hasher = Sha1::new();
    hasher.update(kind.as_bytes());
    hasher.update(namespace.as_bytes());
    hasher.update(object_name.as_bytes());
    hasher.update(common_name.as_bytes());
    hasher.update(issuer_common_name.as_bytes());
    hasher.update(der);
    hasher.finalize().into()
}

/// A pass-scoped set of seen fingerprints (I2/P3). Not `Clone`: a single
/// instance lives for exactly one reconcile pass and is dropped at its end.
#[derive(Default)]
pub struct DedupSet {
    seen: std::collections::HashSet<Fingerprint>,
}

impl DedupSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time a fingerprint is seen, `false` on
    /// every subsequent occurrence within this pass.
    pub fn insert_if_new(&mut self, fp: Fingerprint) -> bool {
        self.seen.insert(fp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_certificate_bytes_produce_identical_fingerprints() {
        let a = fingerprint("Secret", "ns-a", "s1", "cn", "issuer-cn", b"der-bytes");
        let b = fingerprint("Secret", "ns-a", "s1", "cn", "issuer-cn", b"der-bytes");
        assert_eq!(a, b);
    }

    #[test]
    fn different_der_produces_different_fingerprint() {
        let a = fingerprint("Secret", "ns-a", "s1", "cn", "issuer-cn", b"der-bytes-1");
        let b = fingerprint("Secret", "ns-a", "s1", "cn", "issuer-cn", b"der-bytes-2");
        assert_ne!(a, b);
    }

    #[test]
    fn dedup_set_only_accepts_each_fingerprint_once() {
        let mut set = DedupSet::new();
        let fp = fingerprint("Secret", "ns-a", "s1", "cn", "issuer-cn", b"der");
        assert!(set.insert_if_new(fp));
        assert!(!set.insert_if_new(fp));
    }
}
