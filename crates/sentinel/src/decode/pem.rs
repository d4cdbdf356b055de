//! PEM certificate decoding (C3, PEM branch).
//!
//! Grounded on `control::caclient::parse_cert`/`parse_cert_multi`: locate a
//! `CERTIFICATE` PEM block via `rustls_pemfile`, then DER-decode with
//! `x509_parser`. Unlike the teacher (which only ever expects one
//! certificate or key per input), this decodes every consecutive
//! DER-encoded certificate found after the first PEM block, per §4.2's
//! "sequence of DER-encoded X.509 certificates" language.

use std::io::{BufReader, Cursor};

use chrono::{DateTime, TimeZone, Utc};
use rustls_pemfile::Item;
use thiserror::Error;

#[derive(Clone, Debug, Error)]
pub enum DecodeError {
    #[error("malformed PEM block: {0}")]
    Pem(String),
    #[error("malformed DER certificate: {0}")]
    Der(String),
}

/// An owned, self-contained view of a decoded certificate. Holds the full
/// DER encoding (used by the deduplicator's fingerprint, C5) alongside the
/// fields the classifier (C4) needs.
#[derive(Clone, Debug)]
pub struct ParsedCertificate {
    pub der: Vec<u8>,
    pub common_name: String,
    pub issuer_common_name: String,
    pub is_ca: bool,
    pub not_after: DateTime<Utc>,
}

/// Decode every DER-encoded certificate present in the first `CERTIFICATE`
/// PEM block of `data`. Absence of such a block is not an error: it yields
/// an empty list (§4.2).
pub fn decode_pem_certificates(data: &[u8]) -> Result<Vec<ParsedCertificate>, DecodeError> {
    let mut cursor = data.to_vec();
    let mut reader = BufReader::new(Cursor::new(&mut cursor));
    let item = rustls_pemfile::read_one(&mut reader).map_err(|e| DecodeError::Pem(e.to_string()))?;
    let Some(Item::X509Certificate(der)) = item else {
        return Ok(Vec::new());
    };
    decode_der_sequence(der.as_ref())
}

fn decode_der_sequence(mut der: &[u8]) -> Result<Vec<ParsedCertificate>, DecodeError> {
    let mut out = Vec::new();
    while !der.is_empty() {
        let (rest, cert) = x509_parser::parse_x509_certificate(der)
            .map_err(|e| DecodeError::Der(e.to_string()))?;
        let consumed = der.len() - rest.len();
        let raw = der[..consumed].to_vec();

        let common_name = first_common_name(&cert.subject);
        let issuer_common_name = first_common_name(&cert.issuer);
        let is_ca = cert.is_ca();
        let not_after = Utc
            .timestamp_opt(cert.validity.not_after.timestamp(), 0)
            .single()
            .unwrap_or_else(|| Utc.timestamp_opt(0, 0).single().unwrap());

        out.push(ParsedCertificate {
            der: raw,
            common_name,
            issuer_common_name,
            is_ca,
            not_after,
        });
        der = rest;
    }
    Ok(out)
}

fn first_common_name(name: &x509_parser::x509::X509Name) -> String {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Whether `data` (decoded lossily as UTF-8) contains the literal PEM
/// certificate marker. Used as the pre-filter probe in §6 before C3 is
/// invoked on a generic configuration/secret object's data entries.
pub fn looks_like_pem_certificate(data: &[u8]) -> bool {
    String::from_utf8_lossy(data).contains("-----BEGIN CERTIFICATE-----")
}
