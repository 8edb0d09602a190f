use std::time::Duration;

use async_trait::async_trait;
use lettre::address::AddressError;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::message::MultiPart;
use lettre::transport::smtp::authentication::Credentials;
use lettre::AsyncSmtpTransport;
use lettre::AsyncTransport;
use lettre::Message;
use lettre::Tokio1Executor;
use secrecy::ExposeSecret;

use crate::configuration::SmtpConfig;
use crate::configuration::TransportSecurity;

/// An outgoing message, independent of the transport that will carry it
#[derive(Debug, Clone)]
pub struct Email {
    pub from: Mailbox,
    pub to: Mailbox,
    pub reply_to: Option<Mailbox>,
    pub subject: String,
    pub html_body: String,
    /// When present, the message is sent as `multipart/alternative`
    pub text_body: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum MailerError {
    #[error("invalid mailbox address {address:?}")]
    Address {
        address: String,
        #[source]
        source: AddressError,
    },
    #[error("failed to build email message")]
    Message(#[source] lettre::error::Error),
    #[error("SMTP transport failed")]
    Transport(#[source] lettre::transport::smtp::Error),
    #[error("SMTP send did not complete within {0:?}")]
    Timeout(Duration),
}

/// Build a mailbox from a display name and an address that has already been
/// validated by the caller (lettre is still stricter in a few corner cases)
pub fn mailbox(
    name: Option<&str>,
    address: &str,
) -> Result<Mailbox, MailerError> {
    let email = address.parse().map_err(|source| MailerError::Address {
        address: address.to_string(),
        source,
    })?;
    Ok(Mailbox::new(name.map(str::to_string), email))
}

impl Email {
    pub(crate) fn into_message(self) -> Result<Message, MailerError> {
        let mut builder = Message::builder()
            .from(self.from)
            .to(self.to)
            .subject(self.subject);
        if let Some(reply_to) = self.reply_to {
            builder = builder.reply_to(reply_to);
        }
        let message = match self.text_body {
            Some(text) => builder.multipart(MultiPart::alternative_plain_html(text, self.html_body)),
            None => builder.header(ContentType::TEXT_HTML).body(self.html_body),
        };
        message.map_err(MailerError::Message)
    }
}

/// Anything that can deliver an `Email` using the resolved SMTP settings.
/// Handlers only see this trait, so tests can swap in a recording fake.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(
        &self,
        smtp: &SmtpConfig,
        email: Email,
    ) -> Result<(), MailerError>;
}

/// Sends over an authenticated SMTP session, opening a new connection for
/// every message.
pub struct SmtpMailer;

impl SmtpMailer {
    fn transport(smtp: &SmtpConfig) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailerError> {
        let builder = match smtp.security {
            TransportSecurity::ImplicitTls => AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host),
            TransportSecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
            }
        }
        .map_err(MailerError::Transport)?;

        Ok(builder
            .port(smtp.port)
            .credentials(Credentials::new(
                smtp.username.clone(),
                smtp.password.expose_secret().clone(),
            ))
            .timeout(Some(smtp.timeout))
            .build())
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    #[tracing::instrument(
        name = "Sending email over SMTP",
        skip_all,
        fields(
            smtp_host = %smtp.host,
            smtp_security = %smtp.security,
            recipient = %email.to.email,
        )
    )]
    async fn send(
        &self,
        smtp: &SmtpConfig,
        email: Email,
    ) -> Result<(), MailerError> {
        let message = email.into_message()?;
        let transport = Self::transport(smtp)?;

        // lettre's own timeout applies to each command; this bounds the
        // whole exchange
        tokio::time::timeout(smtp.timeout, transport.send(message))
            .await
            .map_err(|_| MailerError::Timeout(smtp.timeout))?
            .map_err(MailerError::Transport)?;
        Ok(())
    }
}
