//! Report rendering and dispatch cadence (C11, C12).

pub mod render_html;
pub mod render_text;
pub mod state_machine;

use chrono::{DateTime, Utc};

use crate::types::{CertificateRecord, KeystoreCertificateRecord};

/// One rendered table row. Built from either watch variant's record type;
/// `keystore_alias` is `None` for PEM-watch reports.
#[derive(Clone, Debug)]
pub struct RenderRow {
    pub api_version: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
    pub data_key: String,
    pub keystore_alias: Option<String>,
    pub common_name: String,
    pub is_ca: bool,
    pub issuer_common_name: String,
    pub expiration: String,
    pub triggered_days_out: Vec<u32>,
}

impl From<&CertificateRecord> for RenderRow {
    fn from(r: &CertificateRecord) -> Self {
        RenderRow {
            api_version: r.api_version.clone(),
            kind: r.kind.clone(),
            namespace: r.namespace.clone(),
            name: r.name.clone(),
            data_key: r.data_key.clone(),
            keystore_alias: None,
            common_name: r.common_name.clone(),
            is_ca: r.is_ca,
            issuer_common_name: r.issuer_common_name.clone(),
            expiration: r.expiration.clone(),
            triggered_days_out: r.triggered_days_out.clone(),
        }
    }
}

impl From<&KeystoreCertificateRecord> for RenderRow {
    fn from(r: &KeystoreCertificateRecord) -> Self {
        let mut row = RenderRow::from(&r.certificate);
        row.keystore_alias = Some(r.keystore_alias.clone());
        row
    }
}

/// Rows with an empty `triggeredDaysOut` are excluded from every report
/// (§4.11).
pub fn reportable_rows<'a, T, I>(records: I) -> Vec<RenderRow>
where
    T: 'a,
    I: IntoIterator<Item = &'a T>,
    RenderRow: From<&'a T>,
{
    records
        .into_iter()
        .map(RenderRow::from)
        .filter(|row| !row.triggered_days_out.is_empty())
        .collect()
}

#[derive(Clone, Debug)]
pub struct ReportPreamble {
    pub watch_namespace: String,
    pub watch_name: String,
    pub dispatch_time: DateTime<Utc>,
    pub api_endpoint: String,
    pub total_certificates_found: usize,
    pub expiring_certificates_found: usize,
    pub total_keystores_found: Option<usize>,
    pub keystores_at_risk: Option<usize>,
}
