use htmlescape::encode_minimal;
use serde::Serialize;

use crate::configuration::ContactSettings;
use crate::configuration::SmtpConfig;
use crate::domain::ContactInquiry;
use crate::email_client::mailbox;
use crate::email_client::Email;
use crate::email_client::MailTransport;
use crate::email_client::MailerError;

/// How far a contact inquiry got. Only reported to the client when delivery
/// stopped half-way.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReport {
    pub owner_notified: bool,
    pub confirmation_sent: bool,
}

#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    /// Nothing was sent
    #[error("could not notify the site owner")]
    OwnerNotification(#[source] MailerError),
    /// The owner has the inquiry; the submitter was not told
    #[error("could not send the confirmation to the submitter")]
    Confirmation(#[source] MailerError),
}

impl DeliveryError {
    pub fn report(&self) -> DeliveryReport {
        match self {
            Self::OwnerNotification(_) => DeliveryReport {
                owner_notified: false,
                confirmation_sent: false,
            },
            Self::Confirmation(_) => DeliveryReport {
                owner_notified: true,
                confirmation_sent: false,
            },
        }
    }
}

/// User text destined for a header, not HTML: lettre encodes it, but line
/// breaks would still start a new header
fn header_text(text: &str) -> String {
    text.split(char::is_control)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// The message for the site owner. Every user-supplied value is escaped before
/// being placed in the HTML.
pub fn owner_notification(
    inquiry: &ContactInquiry,
    smtp: &SmtpConfig,
    contact: &ContactSettings,
) -> Result<Email, MailerError> {
    let name = encode_minimal(inquiry.full_name.as_ref());
    let email = encode_minimal(inquiry.email.as_ref());
    let phone = encode_minimal(inquiry.phone.as_deref().unwrap_or_default());
    let enquiry_type = encode_minimal(&inquiry.enquiry_type);
    let subject = encode_minimal(&inquiry.subject);
    let message = encode_minimal(&inquiry.message);

    let html_body = format!(
        r#"<strong>Name:</strong> {name}<br>
<strong>Email:</strong> {email}<br>
<strong>Phone:</strong> {phone}<br>
<strong>Enquiry Type:</strong> {enquiry_type}<br>
<strong>Subject:</strong> {subject}<br>
<strong>Message:</strong><br>{message}"#
    );

    Ok(Email {
        from: mailbox(Some(&contact.notification_sender_name), &smtp.username)?,
        to: mailbox(None, contact.owner_address(smtp))?,
        reply_to: Some(mailbox(
            Some(inquiry.full_name.as_ref()),
            inquiry.email.as_ref(),
        )?),
        subject: format!(
            "New Contact Form Submission - {}",
            header_text(&inquiry.subject)
        ),
        html_body,
        text_body: None,
    })
}

/// The acknowledgement sent back to the submitter
pub fn confirmation(
    inquiry: &ContactInquiry,
    smtp: &SmtpConfig,
    contact: &ContactSettings,
) -> Result<Email, MailerError> {
    let site = &contact.site_name;
    let name = inquiry.full_name.as_ref();

    let html_body = format!(
        r#"<p>Dear {},</p>
<p>Thank you for contacting {}.</p>
<p>We have received your enquiry and our team will review it shortly. A member of our team will be in touch with you as soon as possible.</p>
<p>Kind regards,<br>{} Team</p>"#,
        encode_minimal(name),
        encode_minimal(site),
        encode_minimal(site),
    );
    let text_body = format!(
        "Dear {name},\n\nThank you for contacting {site}.\n\nWe have received your enquiry and our team will review it shortly. A member of our team will be in touch with you as soon as possible.\n\nKind regards,\n{site} Team"
    );

    Ok(Email {
        from: mailbox(Some(site), &smtp.username)?,
        to: mailbox(Some(name), inquiry.email.as_ref())?,
        reply_to: None,
        subject: format!("Thanks for contacting {site}"),
        html_body,
        text_body: Some(text_body),
    })
}

/// Notify the site owner, then acknowledge the submitter. The second send is
/// only attempted once the first has succeeded.
#[tracing::instrument(
    name = "Delivering contact inquiry",
    skip_all,
    fields(submitter = %inquiry.email)
)]
pub async fn deliver_inquiry(
    transport: &dyn MailTransport,
    smtp: &SmtpConfig,
    contact: &ContactSettings,
    inquiry: &ContactInquiry,
) -> Result<(), DeliveryError> {
    let notification =
        owner_notification(inquiry, smtp, contact).map_err(DeliveryError::OwnerNotification)?;
    transport
        .send(smtp, notification)
        .await
        .map_err(DeliveryError::OwnerNotification)?;
    tracing::info!("site owner notified");

    let ack = confirmation(inquiry, smtp, contact).map_err(DeliveryError::Confirmation)?;
    transport
        .send(smtp, ack)
        .await
        .map_err(DeliveryError::Confirmation)?;
    tracing::info!("submitter acknowledged");

    Ok(())
}
