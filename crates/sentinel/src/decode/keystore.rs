//! Keystore certificate decoding (C3, keystore branch).
//!
//! No teacher module covers Java-style keystore parsing; this is decoded
//! with the `jks` crate (the only maintained pure-Rust JKS parser on
//! crates.io) and re-expressed as `(alias, ParsedCertificate)` pairs using
//! the same owned representation as the PEM branch.

use thiserror::Error;

use super::pem::ParsedCertificate;

#[derive(Debug, Error)]
pub enum KeystoreDecodeError {
    #[error("keystore parse failed: {0}")]
    Parse(String),
    #[error("malformed DER certificate in keystore entry {alias}: {reason}")]
    Der { alias: String, reason: String },
}

/// Parse `blob` as a keystore with `password`, returning one
/// `(alias, ParsedCertificate)` pair per trusted X.509 certificate entry.
/// A blob that isn't a keystore at all is not an error here: the caller
/// (C10) only reaches this function after already deciding the object is a
/// keystore-mode target; a genuine parse failure surfaces as a
/// `KeystoreDecodeError` that the reconcile loop logs and skips (§7
/// `DecodeFailed`).
pub fn decode_keystore_certificates(
    blob: &[u8],
    password: &[u8],
) -> Result<Vec<(String, ParsedCertificate)>, KeystoreDecodeError> {
    let store = jks::Keystore::from_bytes(blob, password)
        .map_err(|e| KeystoreDecodeError::Parse(e.to_string()))?;

    let mut out = Vec::new();
    for (alias, entry) in store.entries() {
        for der in certificate_ders(entry) {
            let (_, cert) = x509_parser::parse_x509_certificate(der).map_err(|e| {
                KeystoreDecodeError::Der {
                    alias: alias.clone(),
                    reason: e.to_string(),
                }
            })?;
            out.push((
                alias.clone(),
                ParsedCertificate {
                    der: der.to_vec(),
                    common_name: first_common_name(&cert.subject),
                    issuer_common_name: first_common_name(&cert.issuer),
                    is_ca: cert.is_ca(),
                    not_after: chrono::Utc
                        .timestamp_opt(cert.validity.not_after.timestamp(), 0)
                        .single()
                        .unwrap_or_else(|| chrono::Utc.timestamp_opt(0, 0).single().unwrap()),
                },
            ));
        }
    }
    Ok(out)
}

/// Only trusted-certificate entries of X.509 type are eligible; private-key
/// entries are ignored even though they also carry a certificate chain,
/// since the watch only ever cares about certificates a keystore trusts,
/// not ones it can authenticate as.
fn certificate_ders(entry: &jks::KeystoreEntry) -> Vec<&[u8]> {
    match entry {
        jks::KeystoreEntry::TrustedCertificate(cert) if cert.cert_type == "X.509" => {
            vec![cert.cert_data.as_slice()]
        }
        _ => vec![],
    }
}

fn first_common_name(name: &x509_parser::x509::X509Name) -> String {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .unwrap_or_default()
        .to_string()
}

use chrono::TimeZone;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_blob_is_a_parse_error() {
        let err = decode_keystore_certificates(b"not a keystore", b"changeit").unwrap_err();
        assert!(matches!(err, KeystoreDecodeError::Parse(_)));
    }
}
