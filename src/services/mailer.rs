//! Notification delivery over SMTP.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use tracing::{debug, info};

use crate::config::{SmtpConfig, SmtpSecurity};
use crate::error::DeliveryError;
use crate::services::renderer::RenderedDocument;

/// Addressing of one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Sender mailbox, e.g. `"Reports" <qa@example.com>`
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
}

/// Acknowledgment returned by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub code: String,
    pub message: String,
}

/// Sends a rendered document.
#[async_trait]
pub trait Deliverer: Send + Sync {
    async fn deliver(
        &self,
        envelope: &Envelope,
        document: &RenderedDocument,
    ) -> Result<DeliveryReceipt, DeliveryError>;
}

/// SMTP deliverer backed by lettre.
///
/// A transport is opened for each delivery and dropped afterwards.
#[derive(Debug, Clone)]
pub struct SmtpDeliverer {
    config: SmtpConfig,
}

impl SmtpDeliverer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, DeliveryError> {
        let host = self.config.host.as_str();
        let builder = match self.config.security {
            SmtpSecurity::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host),
            SmtpSecurity::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| DeliveryError::Transport(e.to_string()))?,
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| DeliveryError::Transport(e.to_string()))?,
        };

        let mut builder = builder.port(self.config.port);
        if let Some(ref username) = self.config.username {
            let password = self
                .config
                .password
                .as_ref()
                .map(|p| p.expose_secret().to_string())
                .unwrap_or_default();
            builder = builder.credentials(Credentials::new(username.clone(), password));
        }

        Ok(builder.build())
    }
}

#[async_trait]
impl Deliverer for SmtpDeliverer {
    async fn deliver(
        &self,
        envelope: &Envelope,
        document: &RenderedDocument,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let message = build_message(envelope, document)?;
        let transport = self.transport()?;

        debug!(
            "Connecting to SMTP server {}:{} ({:?})",
            self.config.host, self.config.port, self.config.security
        );

        let response = transport
            .send(message)
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let receipt = DeliveryReceipt {
            code: response.code().to_string(),
            message: response.message().collect::<Vec<_>>().join(" "),
        };
        info!(
            "SMTP server accepted message for {} recipient(s): {} {}",
            envelope.to.len(),
            receipt.code,
            receipt.message
        );
        Ok(receipt)
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, DeliveryError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| DeliveryError::Address {
            address: address.to_string(),
            message: e.to_string(),
        })
}

/// Assemble a multipart plain/HTML message.
pub fn build_message(
    envelope: &Envelope,
    document: &RenderedDocument,
) -> Result<Message, DeliveryError> {
    if envelope.to.is_empty() {
        return Err(DeliveryError::Message("no recipients".to_string()));
    }

    let mut builder = Message::builder()
        .from(parse_mailbox(&envelope.from)?)
        .subject(envelope.subject.clone());
    for to in &envelope.to {
        builder = builder.to(parse_mailbox(to)?);
    }

    builder
        .multipart(MultiPart::alternative_plain_html(
            document.text.clone(),
            document.html.clone(),
        ))
        .map_err(|e| DeliveryError::Message(e.to_string()))
}
