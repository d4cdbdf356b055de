//! Keystore password resolver (C9).
//!
//! Grounded on the source's `KeystorePassword` handling (a secret lookup or
//! an inline literal) generalized to the three-way tagged union SPEC_FULL
//! prescribes. Password bytes are returned wrapped in `zeroize::Zeroizing`,
//! which zeroes the backing buffer on drop — the mechanism behind I7/P6
//! rather than a hand-rolled zeroing loop.

use thiserror::Error;
use zeroize::Zeroizing;

use crate::store::{ObjectStore, StoreError};
use crate::types::{KeystorePassword, Selector};

#[derive(Clone, Debug, Error)]
pub enum PasswordResolveError {
    #[error("secret {0} has no key {1}")]
    MissingKey(String, String),
    #[error("no secret in namespace {0} matched the keystore password label selector")]
    NoLabelMatch(String),
    #[error("{0}")]
    Store(#[from] StoreError),
}

/// `watch_namespace` is the watch object's own namespace (used by
/// `SecretRef`); `scanned_namespace` is the namespace currently being
/// scanned (used by `LabelRef`) — these differ whenever the watch's
/// `namespaces` list names a namespace other than its own.
pub async fn resolve_keystore_password(
    store: &dyn ObjectStore,
    watch_namespace: &str,
    scanned_namespace: &str,
    password: &KeystorePassword,
) -> Result<Zeroizing<Vec<u8>>, PasswordResolveError> {
    match password {
        KeystorePassword::Inline { value } => Ok(Zeroizing::new(value.clone().into_bytes())),
        KeystorePassword::SecretRef { name, key } => {
            let secret = store
                .get_secret(watch_namespace, name)
                .await?
                .ok_or_else(|| PasswordResolveError::MissingKey(name.clone(), key.clone()))?;
            let bytes = secret
                .data
                .get(key)
                .ok_or_else(|| PasswordResolveError::MissingKey(name.clone(), key.clone()))?;
            Ok(Zeroizing::new(bytes.clone()))
        }
        KeystorePassword::LabelRef { label_selector, key } => {
            let selector = Selector::compile(label_selector);
            let candidates = store.list_secrets(scanned_namespace, &selector).await?;
            for secret in candidates {
                if let Some(bytes) = secret.data.get(key) {
                    if !bytes.is_empty() {
                        return Ok(Zeroizing::new(bytes.clone()));
                    }
                }
            }
            Err(PasswordResolveError::NoLabelMatch(scanned_namespace.to_string()))
        }
    }
}
