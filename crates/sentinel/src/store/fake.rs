//! In-memory `ObjectStore` fixture used by reconcile-engine scenario tests
//! (§8 "Test tooling"). Holds fixtures as plain Rust values; no network, no
//! serialization round-trip.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{
    DataObject, NamespaceInfo, ObjectStore, ServiceAccountInfo, StoreError,
    SERVICE_ACCOUNT_TOKEN_TYPE,
};
use crate::types::{CertWatchStatus, KeystoreWatchStatus, Selector};

#[derive(Default)]
pub struct FakeObjectStore {
    pub namespaces: Vec<NamespaceInfo>,
    pub config_maps: Vec<DataObject>,
    pub secrets: Vec<DataObject>,
    pub service_accounts: BTreeMap<(String, String), ServiceAccountInfo>,
    pub patched_cert_status: Mutex<Vec<((String, String), CertWatchStatus)>>,
    pub patched_keystore_status: Mutex<Vec<((String, String), KeystoreWatchStatus)>>,
}

impl FakeObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_cert_status(&self, namespace: &str, name: &str) -> Option<CertWatchStatus> {
        self.patched_cert_status
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|((ns, n), _)| ns == namespace && n == name)
            .map(|(_, s)| s.clone())
    }
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn list_namespaces(&self) -> Result<Vec<NamespaceInfo>, StoreError> {
        Ok(self.namespaces.clone())
    }

    async fn list_config_maps(
        &self,
        namespace: &str,
        selector: &Selector,
    ) -> Result<Vec<DataObject>, StoreError> {
        Ok(self
            .config_maps
            .iter()
            .filter(|o| o.namespace == namespace && selector.matches(&o.labels))
            .cloned()
            .collect())
    }

    async fn list_secrets(
        &self,
        namespace: &str,
        selector: &Selector,
    ) -> Result<Vec<DataObject>, StoreError> {
        Ok(self
            .secrets
            .iter()
            .filter(|o| o.namespace == namespace && selector.matches(&o.labels))
            .cloned()
            .collect())
    }

    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<DataObject>, StoreError> {
        Ok(self
            .secrets
            .iter()
            .find(|o| o.namespace == namespace && o.name == name)
            .cloned())
    }

    async fn get_service_account(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ServiceAccountInfo>, StoreError> {
        Ok(self
            .service_accounts
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn patch_cert_watch_status(
        &self,
        namespace: &str,
        name: &str,
        status: &CertWatchStatus,
    ) -> Result<(), StoreError> {
        self.patched_cert_status
            .lock()
            .unwrap()
            .push(((namespace.to_string(), name.to_string()), status.clone()));
        Ok(())
    }

    async fn patch_keystore_watch_status(
        &self,
        namespace: &str,
        name: &str,
        status: &KeystoreWatchStatus,
    ) -> Result<(), StoreError> {
        self.patched_keystore_status
            .lock()
            .unwrap()
            .push(((namespace.to_string(), name.to_string()), status.clone()));
        Ok(())
    }
}

/// Convenience constructor matching the service-account-token secret shape
/// the session builder (C8) looks for.
pub fn token_secret(namespace: &str, name: &str, token: &str) -> DataObject {
    let mut data = BTreeMap::new();
    data.insert("token".to_string(), token.as_bytes().to_vec());
    data.insert("ca.crt".to_string(), b"fake-ca-bundle".to_vec());
    DataObject {
        name: name.to_string(),
        namespace: namespace.to_string(),
        labels: BTreeMap::new(),
        data,
        object_type: Some(SERVICE_ACCOUNT_TOKEN_TYPE.to_string()),
    }
}
