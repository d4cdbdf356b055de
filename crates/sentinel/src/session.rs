//! Session builder (C8).
//!
//! Grounded on `control::caclient::Error`'s enum idiom and the source's
//! `GetServiceAccount`/`GetSecret` pair: locate the service identity named
//! by `target.serviceAccount` in the watch's own namespace, then the first
//! of its referenced secrets of type `kubernetes.io/service-account-token`.
//!
//! `Session` only carries the resolved token/CA material: the process's
//! single cluster-scoped `ObjectStore` handles the actual API calls under
//! the controller's own RBAC (see DESIGN.md, C8 entry) — this function's
//! job is to enforce the "the named service account must actually resolve
//! to a usable token" contract and its failure policy (§4.7, §7
//! `SessionBuildFailed`), not to mint a second authenticated client.

use thiserror::Error;

use crate::store::{ObjectStore, StoreError, SERVICE_ACCOUNT_TOKEN_TYPE};

#[derive(Clone, Debug, Error)]
pub enum SessionError {
    #[error("service account {0} not found")]
    ServiceAccountNotFound(String),
    #[error("service account {0} has no usable service-account-token secret")]
    NoUsableToken(String),
    #[error("{0}")]
    Store(#[from] StoreError),
}

#[derive(Clone, Debug)]
pub struct Session {
    pub token: String,
    pub ca_bundle: Vec<u8>,
}

pub async fn build_session(
    store: &dyn ObjectStore,
    namespace: &str,
    service_account: &str,
) -> Result<Session, SessionError> {
    let sa = store
        .get_service_account(namespace, service_account)
        .await?
        .ok_or_else(|| SessionError::ServiceAccountNotFound(service_account.to_string()))?;

    for secret_name in &sa.secret_names {
        let Some(secret) = store.get_secret(namespace, secret_name).await? else {
            continue;
        };
        if secret.object_type.as_deref() != Some(SERVICE_ACCOUNT_TOKEN_TYPE) {
            continue;
        }
        let Some(token) = secret.data.get("token") else {
            continue;
        };
        let ca_bundle = secret.data.get("ca.crt").cloned().unwrap_or_default();
        return Ok(Session {
            token: String::from_utf8_lossy(token).into_owned(),
            ca_bundle,
        });
    }

    Err(SessionError::NoUsableToken(service_account.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fake::{token_secret, FakeObjectStore};
    use crate::store::ServiceAccountInfo;

    #[tokio::test]
    async fn resolves_token_from_first_matching_secret() {
        let mut fake = FakeObjectStore::new();
        fake.service_accounts.insert(
            ("ns-a".into(), "reader".into()),
            ServiceAccountInfo {
                secret_names: vec!["reader-token-abc".into()],
            },
        );
        fake.secrets.push(token_secret("ns-a", "reader-token-abc", "tok-123"));

        let session = build_session(&fake, "ns-a", "reader").await.unwrap();
        assert_eq!(session.token, "tok-123");
        assert_eq!(session.ca_bundle, b"fake-ca-bundle".to_vec());
    }

    #[tokio::test]
    async fn missing_service_account_is_fatal() {
        let fake = FakeObjectStore::new();
        let err = build_session(&fake, "ns-a", "ghost").await.unwrap_err();
        assert!(matches!(err, SessionError::ServiceAccountNotFound(_)));
    }

    #[tokio::test]
    async fn service_account_with_no_token_secret_is_fatal() {
        let mut fake = FakeObjectStore::new();
        fake.service_accounts.insert(
            ("ns-a".into(), "reader".into()),
            ServiceAccountInfo {
                secret_names: vec!["unrelated".into()],
            },
        );
        let err = build_session(&fake, "ns-a", "reader").await.unwrap_err();
        assert!(matches!(err, SessionError::NoUsableToken(_)));
    }
}
