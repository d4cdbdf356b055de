//! Fixed-column text-table renderer (C12, text branch).
//!
//! Grounded on `certificatesentinel_controller_reports.go`'s
//! `createTextTableReport`: centered padding per column, header/footer row
//! repeat, and a horizontal rule sized to the full table width.

use super::{RenderRow, ReportPreamble};

const BASE_COLUMNS: &[&str] = &[
    "APIVersion",
    "Kind",
    "Namespace",
    "Name",
    "Data Key",
    "Certificate CN",
    "Is CA",
    "Signing CA CN",
    "Expiration Date",
    "Triggered Days Out",
];

const KEYSTORE_COLUMNS: &[&str] = &[
    "APIVersion",
    "Kind",
    "Namespace",
    "Name",
    "Data Key",
    "Keystore Alias",
    "Certificate CN",
    "Is CA",
    "Signing CA CN",
    "Expiration Date",
    "Triggered Days Out",
];

fn cells(row: &RenderRow) -> Vec<String> {
    let mut out = vec![
        row.api_version.clone(),
        row.kind.clone(),
        row.namespace.clone(),
        row.name.clone(),
        row.data_key.clone(),
    ];
    if let Some(alias) = &row.keystore_alias {
        out.push(alias.clone());
    }
    out.push(row.common_name.clone());
    out.push(row.is_ca.to_string());
    out.push(row.issuer_common_name.clone());
    out.push(row.expiration.clone());
    out.push(
        row.triggered_days_out
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(","),
    );
    out
}

fn centered(value: &str, width: usize) -> String {
    let len = value.chars().count();
    if len >= width {
        return value.to_string();
    }
    let total_pad = width - len;
    let left = total_pad / 2;
    let right = total_pad - left;
    format!("{}{}{}", " ".repeat(left), value, " ".repeat(right))
}

pub fn render_preamble(preamble: &ReportPreamble) -> String {
    let mut lines = vec![
        format!("Watch: {}/{}", preamble.watch_namespace, preamble.watch_name),
        format!("Dispatched: {}", preamble.dispatch_time.to_rfc2822()),
        format!("API endpoint: {}", preamble.api_endpoint),
        format!("Certificates found: {}", preamble.total_certificates_found),
        format!("Certificates expiring: {}", preamble.expiring_certificates_found),
    ];
    if let (Some(total), Some(at_risk)) = (preamble.total_keystores_found, preamble.keystores_at_risk) {
        lines.push(format!("Keystores found: {}", total));
        lines.push(format!("Keystores at risk: {}", at_risk));
    }
    lines.join("\n")
}

/// Renders the full text-table report: preamble, then the table of rows
/// with non-empty `triggeredDaysOut` (callers are expected to have already
/// filtered via [`super::reportable_rows`]).
pub fn render_text_table(preamble: &ReportPreamble, rows: &[RenderRow]) -> String {
    let columns: &[&str] = if rows.iter().any(|r| r.keystore_alias.is_some()) {
        KEYSTORE_COLUMNS
    } else {
        BASE_COLUMNS
    };

    let row_cells: Vec<Vec<String>> = rows.iter().map(cells).collect();
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, header)| {
            row_cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let separator_width: usize = widths.iter().sum::<usize>() + widths.len() * 3 + 1;
    let rule = "-".repeat(separator_width);

    let render_row = |cells: &[String]| -> String {
        let mut line = String::from("|");
        for (cell, width) in cells.iter().zip(&widths) {
            line.push(' ');
            line.push_str(&centered(cell, *width));
            line.push_str(" |");
        }
        line
    };

    let header: Vec<String> = columns.iter().map(|c| c.to_string()).collect();

    let mut out = String::new();
    out.push_str(&render_preamble(preamble));
    out.push_str("\n\n");
    out.push_str(&rule);
    out.push('\n');
    out.push_str(&render_row(&header));
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');
    for cells in &row_cells {
        out.push_str(&render_row(cells));
        out.push('\n');
    }
    out.push_str(&rule);
    out.push('\n');
    out.push_str(&render_row(&header));
    out.push('\n');
    out.push_str(&rule);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn preamble() -> ReportPreamble {
        ReportPreamble {
            watch_namespace: "ns-a".into(),
            watch_name: "watch-1".into(),
            dispatch_time: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            api_endpoint: "https://cluster.local".into(),
            total_certificates_found: 2,
            expiring_certificates_found: 1,
            total_keystores_found: None,
            keystores_at_risk: None,
        }
    }

    fn row() -> RenderRow {
        RenderRow {
            api_version: "v1".into(),
            kind: "Secret".into(),
            namespace: "ns-a".into(),
            name: "s1".into(),
            data_key: "tls.crt".into(),
            keystore_alias: None,
            common_name: "leaf.example.test".into(),
            is_ca: false,
            issuer_common_name: "ca.example.test".into(),
            expiration: "2024-06-20 00:00:00 +0000 UTC".into(),
            triggered_days_out: vec![30],
        }
    }

    #[test]
    fn renders_header_and_footer_with_matching_rule_width() {
        let report = render_text_table(&preamble(), &[row()]);
        let lines: Vec<&str> = report.lines().collect();
        let rule_lines: Vec<&str> = lines.iter().filter(|l| l.starts_with('-')).copied().collect();
        assert!(rule_lines.len() >= 2);
        assert_eq!(rule_lines[0].len(), rule_lines[1].len());
        assert!(report.contains("APIVersion"));
        assert!(report.contains("leaf.example.test"));
    }

    #[test]
    fn keystore_rows_add_the_alias_column() {
        let mut r = row();
        r.keystore_alias = Some("alias-a".into());
        let report = render_text_table(&preamble(), &[r]);
        assert!(report.contains("Keystore Alias"));
        assert!(report.contains("alias-a"));
    }
}
