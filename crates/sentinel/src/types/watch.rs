use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::selector::LabelFilter;

pub const GROUP: &str = "certwatch.io";
pub const VERSION: &str = "v1";

/// Category of container object a [`Target`] scans. Mirrors the two shapes
/// a reconcile pass knows how to walk: generic key/value configuration
/// objects, and opaque/TLS secret objects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum TargetKind {
    ConfigMap,
    Secret,
    #[serde(other)]
    Unknown,
}

/// The core scan target shared by both watch variants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub name: String,
    pub kind: TargetKind,
    pub api_version: String,
    #[serde(default)]
    pub namespaces: Vec<String>,
    #[serde(default)]
    pub namespace_labels: Vec<LabelFilter>,
    #[serde(default)]
    pub target_labels: Vec<LabelFilter>,
    pub service_account: String,
    #[serde(default)]
    pub days_out: Vec<u32>,
}

/// Password source for a keystore blob (C9). First match wins when more
/// than one secret satisfies `LabelRef`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum KeystorePassword {
    Inline {
        value: String,
    },
    SecretRef {
        name: String,
        key: String,
    },
    LabelRef {
        #[serde(default)]
        label_selector: Vec<LabelFilter>,
        key: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeystoreTarget {
    #[serde(flatten)]
    pub target: Target,
    pub keystore_password: KeystorePassword,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Smtp,
    Logger,
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ReportInterval {
    Daily,
    Weekly,
    Monthly,
    Debug,
    #[serde(other)]
    Unknown,
}

impl Default for ReportInterval {
    fn default() -> Self {
        ReportInterval::Daily
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum SmtpAuthType {
    None,
    Plain,
    Login,
    CramMd5,
    #[serde(other)]
    Unknown,
}

impl Default for SmtpAuthType {
    fn default() -> Self {
        SmtpAuthType::Plain
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertConfig {
    pub report_interval: ReportInterval,
    pub smtp_destination_email_addresses: Vec<String>,
    pub smtp_sender_email_address: String,
    pub smtp_sender_hostname: String,
    pub smtp_endpoint: String,
    pub smtp_auth_secret_name: String,
    pub smtp_auth_type: SmtpAuthType,
    pub smtp_auth_use_ssl: Option<bool>,
    pub smtp_auth_use_starttls: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub name: String,
    #[serde(default)]
    pub config: AlertConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRecord {
    pub namespace: String,
    pub name: String,
    pub kind: String,
    pub api_version: String,
    pub data_key: String,
    pub common_name: String,
    pub issuer_common_name: String,
    pub is_ca: bool,
    pub expiration: String,
    #[serde(default)]
    pub triggered_days_out: Vec<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeystoreCertificateRecord {
    #[serde(flatten)]
    pub certificate: CertificateRecord,
    pub keystore_alias: String,
}

#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "certwatch.io",
    version = "v1",
    kind = "CertWatch",
    namespaced,
    status = "CertWatchStatus",
    shortname = "certwatch"
)]
#[serde(rename_all = "camelCase")]
pub struct CertWatchSpec {
    pub target: Target,
    pub alert: Alert,
    #[serde(default)]
    pub scanning_interval: Option<u32>,
    #[serde(default)]
    pub log_level: Option<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CertWatchStatus {
    pub discovered_certificates: Vec<CertificateRecord>,
    pub expiring_certificates: i64,
    pub last_report_sent: i64,
}

#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "certwatch.io",
    version = "v1",
    kind = "KeystoreWatch",
    namespaced,
    status = "KeystoreWatchStatus",
    shortname = "keystorewatch"
)]
#[serde(rename_all = "camelCase")]
pub struct KeystoreWatchSpec {
    pub target: KeystoreTarget,
    pub alert: Alert,
    #[serde(default)]
    pub scanning_interval: Option<u32>,
    #[serde(default)]
    pub log_level: Option<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct KeystoreWatchStatus {
    pub discovered_certificates: Vec<KeystoreCertificateRecord>,
    pub expiring_certificates: i64,
    pub total_keystores_found: i64,
    pub keystores_at_risk: i64,
    pub last_report_sent: i64,
}
