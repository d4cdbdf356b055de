//! SMTP dispatcher (C13).
//!
//! Grounded on `helpers/smtp_functions.go`'s `SendSMTPMail`: one connection
//! per dispatch, 10s connect/send timeouts, STARTTLS/TLS toggle, one of
//! four auth modes, HTML body as the sole content.

use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

use crate::types::SmtpAuthType;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug, Error)]
pub enum DispatchError {
    #[error("invalid SMTP endpoint {0:?}: {1}")]
    InvalidEndpoint(String, String),
    #[error("failed to build SMTP transport: {0}")]
    TransportBuild(String),
    #[error("failed to build report message: {0}")]
    MessageBuild(String),
    #[error("SMTP send failed: {0}")]
    Send(String),
}

pub struct SmtpCredentials {
    pub username: String,
    pub password: String,
    /// CRAM-MD5 and XOAUTH2-style identity/token field; unused for
    /// `plain`/`login`.
    pub identity: Option<String>,
}

pub struct DispatchRequest<'a> {
    pub endpoint: &'a str,
    pub sender: &'a str,
    pub recipients: &'a [String],
    pub auth_type: &'a SmtpAuthType,
    pub credentials: Option<SmtpCredentials>,
    pub use_ssl: bool,
    pub use_starttls: bool,
    pub subject: &'a str,
    pub html_body: &'a str,
}

fn split_endpoint(endpoint: &str) -> Result<(&str, u16), DispatchError> {
    let (host, port) = endpoint
        .rsplit_once(':')
        .ok_or_else(|| DispatchError::InvalidEndpoint(endpoint.to_string(), "missing port".into()))?;
    let port: u16 = port
        .parse()
        .map_err(|e: std::num::ParseIntError| DispatchError::InvalidEndpoint(endpoint.to_string(), e.to_string()))?;
    Ok((host, port))
}

fn mechanism(auth_type: &SmtpAuthType) -> Option<Mechanism> {
    match auth_type {
        SmtpAuthType::None => None,
        SmtpAuthType::Plain | SmtpAuthType::Unknown => Some(Mechanism::Plain),
        SmtpAuthType::Login => Some(Mechanism::Login),
        SmtpAuthType::CramMd5 => Some(Mechanism::CramMd5),
    }
}

/// Builds the `TlsParameters` used by either TLS mode. `verify=false` is the
/// documented insecure mode (`useSSL=false`): certificate validation is
/// disabled but the connection is still encrypted, independent of whether
/// STARTTLS or implicit TLS negotiated it.
fn tls_parameters(host: &str, verify: bool) -> Result<TlsParameters, DispatchError> {
    TlsParameters::builder(host.to_string())
        .dangerous_accept_invalid_certs(!verify)
        .build()
        .map_err(|e| DispatchError::TransportBuild(e.to_string()))
}

/// Sends the report. Returns `Ok(())` only when the SMTP server accepted
/// the message; the caller (report state machine, C11) only advances
/// `lastReportSent` on `Ok`.
pub async fn dispatch(req: DispatchRequest<'_>) -> Result<(), DispatchError> {
    let (host, port) = split_endpoint(req.endpoint)?;

    let tls = if req.use_starttls {
        Tls::Required(tls_parameters(host, req.use_ssl)?)
    } else if req.use_ssl {
        Tls::Wrapper(tls_parameters(host, req.use_ssl)?)
    } else {
        Tls::None
    };

    let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        .port(port)
        .tls(tls)
        .timeout(Some(CONNECT_TIMEOUT));

    if let Some(mechanism) = mechanism(req.auth_type) {
        let creds = req
            .credentials
            .as_ref()
            .ok_or_else(|| DispatchError::TransportBuild("auth type requires credentials".into()))?;
        builder = builder
            .credentials(Credentials::new(creds.username.clone(), creds.password.clone()))
            .authentication(vec![mechanism]);
    }

    let transport = builder.build();

    let mut message_builder = Message::builder()
        .from(
            req.sender
                .parse()
                .map_err(|e: lettre::address::AddressError| DispatchError::MessageBuild(e.to_string()))?,
        )
        .subject(req.subject);
    for recipient in req.recipients {
        message_builder = message_builder.to(recipient
            .parse()
            .map_err(|e: lettre::address::AddressError| DispatchError::MessageBuild(e.to_string()))?);
    }
    let message = message_builder
        .header(ContentType::TEXT_HTML)
        .body(req.html_body.to_string())
        .map_err(|e| DispatchError::MessageBuild(e.to_string()))?;

    transport
        .send(message)
        .await
        .map_err(|e| DispatchError::Send(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_host_and_port() {
        let (host, port) = split_endpoint("smtp.example.test:587").unwrap();
        assert_eq!(host, "smtp.example.test");
        assert_eq!(port, 587);
    }

    #[test]
    fn rejects_endpoint_without_port() {
        assert!(split_endpoint("smtp.example.test").is_err());
    }

    #[test]
    fn none_auth_type_has_no_mechanism() {
        assert!(mechanism(&SmtpAuthType::None).is_none());
    }

    #[test]
    fn cram_md5_maps_to_cram_md5_mechanism() {
        assert!(matches!(mechanism(&SmtpAuthType::CramMd5), Some(Mechanism::CramMd5)));
    }
}
