//! Object store abstraction (C16).
//!
//! Grounded on `control::caclient`'s client/session-builder plumbing,
//! generalized from "talk to a CA over gRPC" to "talk to the orchestrator's
//! declarative API over its typed client"; the trait-seam shape mirrors the
//! `ConfigDumpHandler`/`AdminFallback` trait seams in `management/admin.rs`.
//! Every component that needs cluster data goes through this trait instead
//! of touching a concrete client directly, which is what makes the
//! reconcile engine (C10) unit-testable without a live cluster.

pub mod fake;
pub mod kube_store;

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::Selector;

#[derive(Clone, Debug, Error)]
pub enum StoreError {
    #[error("namespace list failed: {0}")]
    NamespaceList(String),
    #[error("object list failed: {0}")]
    ObjectList(String),
    #[error("secret read failed: {0}")]
    SecretGet(String),
    #[error("service account read failed: {0}")]
    ServiceAccountGet(String),
    #[error("status patch failed: {0}")]
    StatusPatch(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamespaceInfo {
    pub name: String,
    pub labels: BTreeMap<String, String>,
}

/// A generic key/value configuration object or an opaque/TLS secret,
/// reduced to exactly the fields the decoder and classifier need.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataObject {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    pub data: BTreeMap<String, Vec<u8>>,
    /// Set only for secrets; `Opaque`, `kubernetes.io/tls`, or a service
    /// account token type. `None` for configuration objects.
    pub object_type: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceAccountInfo {
    pub secret_names: Vec<String>,
}

pub const SERVICE_ACCOUNT_TOKEN_TYPE: &str = "kubernetes.io/service-account-token";

/// Fetching the watch object itself (by namespace/name) isn't a method
/// here: `kube::runtime::Controller` only calls `reconcile` for objects its
/// reflector already has, and hands it the object directly, so a watch that
/// no longer exists never reaches the engine at all.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn list_namespaces(&self) -> Result<Vec<NamespaceInfo>, StoreError>;

    async fn list_config_maps(
        &self,
        namespace: &str,
        selector: &Selector,
    ) -> Result<Vec<DataObject>, StoreError>;

    async fn list_secrets(
        &self,
        namespace: &str,
        selector: &Selector,
    ) -> Result<Vec<DataObject>, StoreError>;

    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<DataObject>, StoreError>;

    async fn get_service_account(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ServiceAccountInfo>, StoreError>;

    async fn patch_cert_watch_status(
        &self,
        namespace: &str,
        name: &str,
        status: &crate::types::CertWatchStatus,
    ) -> Result<(), StoreError>;

    async fn patch_keystore_watch_status(
        &self,
        namespace: &str,
        name: &str,
        status: &crate::types::KeystoreWatchStatus,
    ) -> Result<(), StoreError>;
}
