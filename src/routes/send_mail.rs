use std::fmt::Debug;

use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::HttpResponse;
use actix_web::ResponseError;

use super::error_chain_fmt;
use super::ApiResponse;
use super::SubmissionFields;
use crate::configuration::ConfigurationError;
use crate::configuration::ContactSettings;
use crate::configuration::SmtpSettings;
use crate::delivery::deliver_inquiry;
use crate::delivery::DeliveryError;
use crate::domain::ContactInquiry;
use crate::domain::EmailAddress;
use crate::domain::PersonName;
use crate::domain::ValidationError;
use crate::email_client::MailTransport;

/// `fullName` is what the current front end sends; older forms used `name`
const NAME_FIELDS: [&str; 2] = ["fullName", "name"];

impl TryFrom<&SubmissionFields> for ContactInquiry {
    type Error = ValidationError;
    fn try_from(fields: &SubmissionFields) -> Result<Self, Self::Error> {
        let name = fields.first_of(&NAME_FIELDS);
        let required = [
            name,
            fields.get("email"),
            fields.get("subject"),
            fields.get("enquiryType"),
            fields.get("message"),
        ];
        if required.iter().any(|value| value.is_empty()) {
            return Err(ValidationError::MissingFields);
        }

        let email = EmailAddress::parse(fields.get("email").to_string())
            .map_err(|_| ValidationError::InvalidEmail)?;
        let full_name = PersonName::parse(name.to_string())?;

        Ok(Self {
            full_name,
            email,
            phone: fields.optional("phone"),
            subject: fields.get("subject").to_string(),
            enquiry_type: fields.get("enquiryType").to_string(),
            message: fields.get("message").to_string(),
        })
    }
}

#[derive(thiserror::Error)]
pub enum SendMailError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("mail transport configuration is incomplete")]
    Configuration(#[source] ConfigurationError),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl Debug for SendMailError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)?;
        Ok(())
    }
}

impl ResponseError for SendMailError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Configuration(_) | Self::Delivery(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // transport errors are logged (see `Debug`), never echoed
    fn error_response(&self) -> HttpResponse {
        let resp = match self {
            Self::Validation(e) => ApiResponse::failure(e.to_string()),
            Self::Configuration(_) => ApiResponse::failure("Server email configuration is missing."),
            Self::Delivery(e @ DeliveryError::OwnerNotification(_)) => {
                tracing::error!(error.cause_chain = ?e, "contact inquiry was not delivered");
                ApiResponse::failure(
                    "Mailer Error: your message could not be sent. Please try again later.",
                )
            }
            Self::Delivery(e @ DeliveryError::Confirmation(_)) => {
                tracing::warn!(
                    error.cause_chain = ?e,
                    "contact inquiry delivered, but the submitter was not acknowledged"
                );
                ApiResponse::failure(
                    "Your message was received, but the confirmation email could not be sent.",
                )
                .with_delivery(e.report())
            }
        };
        resp.respond(self.status_code())
    }
}

/// `POST /send-mail`
///
/// Forwards a contact form to the site owner, then sends the submitter an
/// acknowledgement. All fields but `phone` are required.
///
/// # Request example
///
/// ```sh
///     curl --json '{"fullName": "John", "email": "john@foo.com", "subject": "Hi", "enquiryType": "General", "message": "Hello"}' \
///         http://127.0.0.1:8000/send-mail
/// ```
#[tracing::instrument(
    name = "Sending contact inquiry",
    skip(body, smtp, contact, mailer),
    fields(submitter_email = tracing::field::Empty)
)]
pub async fn send_mail(
    body: web::Bytes,
    smtp: web::Data<SmtpSettings>,
    contact: web::Data<ContactSettings>,
    mailer: web::Data<dyn MailTransport>,
) -> Result<HttpResponse, SendMailError> {
    let fields = SubmissionFields::parse(&body);
    let inquiry: ContactInquiry = (&fields).try_into()?;
    tracing::Span::current().record(
        "submitter_email",
        tracing::field::display(&inquiry.email),
    );

    let cfg = smtp.resolve().map_err(SendMailError::Configuration)?;
    deliver_inquiry(mailer.get_ref(), &cfg, &contact, &inquiry).await?;

    Ok(ApiResponse::success("Message sent successfully.").respond(StatusCode::OK))
}
