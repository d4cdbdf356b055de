pub mod keystore;
pub mod pem;

pub use keystore::{decode_keystore_certificates, KeystoreDecodeError};
pub use pem::{decode_pem_certificates, looks_like_pem_certificate, DecodeError, ParsedCertificate};
