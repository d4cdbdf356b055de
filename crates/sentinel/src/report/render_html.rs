//! HTML-table renderer (C12, HTML branch).
//!
//! Grounded on `certificatesentinel_controller_reports.go`'s
//! `tableTextReportToBasicHTMLReport`: same column set as the text table,
//! alternating row shading, dates re-rendered per RFC-822 with zone.

use super::{RenderRow, ReportPreamble};

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn rfc2822(expiration: &str) -> String {
    // `expiration` is already rendered per §6 ("YYYY-MM-DD HH:MM:SS ±ZZZZ
    // TZNAME"); parse it back to re-render as RFC-822. A value that fails
    // to parse (should not happen for anything this crate produced itself)
    // is passed through verbatim rather than dropped.
    match chrono::NaiveDateTime::parse_from_str(
        expiration.split(" +0000").next().unwrap_or(expiration),
        "%Y-%m-%d %H:%M:%S",
    ) {
        Ok(naive) => naive.and_utc().to_rfc2822(),
        Err(_) => expiration.to_string(),
    }
}

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
    out.push(rfc2822(&row.expiration));
    out.push(
        row.triggered_days_out
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    );
    out
}

fn columns(keystore: bool) -> Vec<&'static str> {
    let mut cols = vec!["APIVersion", "Kind", "Namespace", "Name", "Data Key"];
    if keystore {
        cols.push("Keystore Alias");
    }
    cols.extend(["Certificate CN", "Is CA", "Signing CA CN", "Expiration Date", "Triggered Days Out"]);
    cols
}

pub fn render_html_table(preamble: &ReportPreamble, rows: &[RenderRow]) -> String {
    let keystore = rows.iter().any(|r| r.keystore_alias.is_some());
    let cols = columns(keystore);

    let mut html = String::new();
    html.push_str("<html><body>\n<p>\n");
    html.push_str(&format!(
        "Watch: {}/{}<br>\n",
        escape(&preamble.watch_namespace),
        escape(&preamble.watch_name)
    ));
    html.push_str(&format!("Dispatched: {}<br>\n", preamble.dispatch_time.to_rfc2822()));
    html.push_str(&format!("API endpoint: {}<br>\n", escape(&preamble.api_endpoint)));
    html.push_str(&format!(
        "Certificates found: {}<br>\n",
        preamble.total_certificates_found
    ));
    html.push_str(&format!(
        "Certificates expiring: {}<br>\n",
        preamble.expiring_certificates_found
    ));
    if let (Some(total), Some(at_risk)) = (preamble.total_keystores_found, preamble.keystores_at_risk) {
        html.push_str(&format!("Keystores found: {}<br>\n", total));
        html.push_str(&format!("Keystores at risk: {}<br>\n", at_risk));
    }
    html.push_str("</p>\n<table border=\"1\" cellpadding=\"4\" cellspacing=\"0\">\n<tr>");
    for col in &cols {
        html.push_str(&format!("<th>{}</th>", escape(col)));
    }
    html.push_str("</tr>\n");

    for (i, row) in rows.iter().enumerate() {
        let shade = if i % 2 == 0 { "#ffffff" } else { "#eeeeee" };
        html.push_str(&format!("<tr style=\"background-color:{}\">", shade));
        for cell in cells(row) {
            html.push_str(&format!("<td>{}</td>", escape(&cell)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n</body></html>\n");
    html
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

    fn row(cn: &str) -> RenderRow {
        RenderRow {
            api_version: "v1".into(),
            kind: "Secret".into(),
            namespace: "ns-a".into(),
            name: "s1".into(),
            data_key: "tls.crt".into(),
            keystore_alias: None,
            common_name: cn.into(),
            is_ca: false,
            issuer_common_name: "ca.example.test".into(),
            expiration: "2024-06-20 00:00:00 +0000 UTC".into(),
            triggered_days_out: vec![30],
        }
    }

    #[test]
    fn alternates_row_shading() {
        let html = render_html_table(&preamble(), &[row("a"), row("b")]);
        assert!(html.contains("#ffffff"));
        assert!(html.contains("#eeeeee"));
    }

    #[test]
    fn escapes_html_special_characters() {
        let html = render_html_table(&preamble(), &[row("<script>")]);
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn expiration_is_re_rendered_as_rfc2822() {
        let html = render_html_table(&preamble(), &[row("a")]);
        assert!(html.contains("2024"));
        assert!(html.contains("+0000"));
    }
}
