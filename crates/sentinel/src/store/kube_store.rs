//! Live cluster-backed `ObjectStore` (C16 production wiring).
//!
//! Built on the `other_examples` openbao-pki-controller's `kube::Client`/
//! `Api` bootstrap idiom. Label filtering happens client-side via the
//! compiled `Selector` (C6) rather than a server-side `labelSelector=`
//! query string, since several of our operators (`greaterThan`,
//! `lessThan`) have no server-side equivalent.

use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Namespace, Secret, ServiceAccount};
use kube::api::{ListParams, Patch, PatchParams};
use kube::{Api, Client};

use super::{DataObject, NamespaceInfo, ObjectStore, ServiceAccountInfo, StoreError};
use crate::types::{CertWatchStatus, KeystoreWatchStatus, Selector};

pub struct KubeObjectStore {
    client: Client,
}

impl KubeObjectStore {
    pub fn new(client: Client) -> Self {
        KubeObjectStore { client }
    }
}

fn labels_of(meta: &k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta) -> BTreeMap<String, String> {
    meta.labels.clone().unwrap_or_default()
}

#[async_trait]
impl ObjectStore for KubeObjectStore {
    async fn list_namespaces(&self) -> Result<Vec<NamespaceInfo>, StoreError> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| StoreError::NamespaceList(e.to_string()))?;
        Ok(list
            .items
            .into_iter()
            .map(|ns| NamespaceInfo {
                name: ns.metadata.name.unwrap_or_default(),
                labels: labels_of(&ns.metadata.clone()).into_iter().collect(),
            })
            .collect())
    }

    async fn list_config_maps(
        &self,
        namespace: &str,
        selector: &Selector,
    ) -> Result<Vec<DataObject>, StoreError> {
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| StoreError::ObjectList(e.to_string()))?;
        Ok(list
            .items
            .into_iter()
            .filter_map(|cm| {
                let labels = labels_of(&cm.metadata);
                if !selector.matches(&labels) {
                    return None;
                }
                let mut data: BTreeMap<String, Vec<u8>> = BTreeMap::new();
                if let Some(string_data) = cm.data {
                    for (k, v) in string_data {
                        data.insert(k, v.into_bytes());
                    }
                }
                if let Some(binary_data) = cm.binary_data {
                    for (k, v) in binary_data {
                        data.insert(k, v.0);
                    }
                }
                Some(DataObject {
                    name: cm.metadata.name.unwrap_or_default(),
                    namespace: namespace.to_string(),
                    labels,
                    data,
                    object_type: None,
                })
            })
            .collect())
    }

    async fn list_secrets(&self, namespace: &str, selector: &Selector) -> Result<Vec<DataObject>, StoreError> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| StoreError::ObjectList(e.to_string()))?;
        Ok(list
            .items
            .into_iter()
            .filter_map(|secret| secret_to_data_object(secret, namespace, selector))
            .collect())
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<DataObject>, StoreError> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        match api.get_opt(name).await {
            Ok(Some(secret)) => Ok(secret_to_data_object(secret, namespace, &Selector::compile(&[]))),
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::SecretGet(e.to_string())),
        }
    }

    async fn get_service_account(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ServiceAccountInfo>, StoreError> {
        let api: Api<ServiceAccount> = Api::namespaced(self.client.clone(), namespace);
        match api.get_opt(name).await {
            Ok(Some(sa)) => Ok(Some(ServiceAccountInfo {
                secret_names: sa
                    .secrets
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|r| r.name)
                    .collect(),
            })),
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::ServiceAccountGet(e.to_string())),
        }
    }

    async fn patch_cert_watch_status(
        &self,
        namespace: &str,
        name: &str,
        status: &CertWatchStatus,
    ) -> Result<(), StoreError> {
        let api: Api<CertWatch> = Api::namespaced(self.client.clone(), namespace);
        let patch = serde_json::json!({ "status": status });
        api.patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|e| StoreError::StatusPatch(e.to_string()))?;
        Ok(())
    }

    async fn patch_keystore_watch_status(
        &self,
        namespace: &str,
        name: &str,
        status: &KeystoreWatchStatus,
    ) -> Result<(), StoreError> {
        let api: Api<KeystoreWatch> = Api::namespaced(self.client.clone(), namespace);
        let patch = serde_json::json!({ "status": status });
        api.patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|e| StoreError::StatusPatch(e.to_string()))?;
        Ok(())
    }
}

fn secret_to_data_object(secret: Secret, namespace: &str, selector: &Selector) -> Option<DataObject> {
    let labels = labels_of(&secret.metadata);
    if !selector.matches(&labels) {
        return None;
    }
    let mut data: BTreeMap<String, Vec<u8>> = BTreeMap::new();
    if let Some(secret_data) = secret.data {
        for (k, v) in secret_data {
            data.insert(k, v.0);
        }
    }
    if let Some(string_data) = secret.string_data {
        for (k, v) in string_data {
            data.insert(k, v.into_bytes());
        }
    }
    Some(DataObject {
        name: secret.metadata.name.unwrap_or_default(),
        namespace: namespace.to_string(),
        labels,
        data,
        object_type: secret.type_,
    })
}
