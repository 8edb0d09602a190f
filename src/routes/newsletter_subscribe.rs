use std::fmt::Debug;

use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::HttpResponse;
use actix_web::ResponseError;

use super::error_chain_fmt;
use super::upstream_status;
use super::ApiResponse;
use super::SubmissionFields;
use crate::configuration::ConfigurationError;
use crate::configuration::MailchimpSettings;
use crate::domain::EmailAddress;
use crate::domain::NewsletterSubscription;
use crate::domain::ValidationError;
use crate::mailing_list::DispatchError;
use crate::mailing_list::MailingListClient;

impl TryFrom<&SubmissionFields> for NewsletterSubscription {
    type Error = ValidationError;
    fn try_from(fields: &SubmissionFields) -> Result<Self, Self::Error> {
        let email = EmailAddress::parse(fields.get("email").to_string())
            .map_err(|_| ValidationError::InvalidSubscriberEmail)?;
        Ok(Self {
            email,
            first_name: fields.optional("firstName"),
        })
    }
}

#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("list API configuration is incomplete")]
    Configuration(#[source] ConfigurationError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl Debug for SubscribeError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)?;
        Ok(())
    }
}

impl SubscribeError {
    /// What the client is allowed to see. Only validation messages and the
    /// upstream's own `detail` are passed through.
    fn client_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Configuration(_) => "Mailchimp configuration is missing on the server.".to_string(),
            Self::Dispatch(DispatchError::Unreachable(_)) => {
                "Unable to reach Mailchimp. Please try again later.".to_string()
            }
            Self::Dispatch(DispatchError::Rejected { detail, .. }) => detail
                .clone()
                .unwrap_or("Subscription failed. Please try again.".to_string()),
        }
    }
}

impl ResponseError for SubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Dispatch(DispatchError::Unreachable(_)) => StatusCode::BAD_GATEWAY,
            Self::Dispatch(DispatchError::Rejected { status, .. }) => upstream_status(*status),
        }
    }

    fn error_response(&self) -> HttpResponse {
        ApiResponse::failure(self.client_message()).respond(self.status_code())
    }
}

/// `POST /newsletter-subscribe`
///
/// Adds (or re-subscribes) `email` to the configured audience, with
/// `firstName` as a merge field when given.
///
/// # Request example
///
/// ```sh
///     curl --data 'email=john@foo.com&firstName=John' http://127.0.0.1:8000/newsletter-subscribe
///     curl --json '{"email": "john@foo.com"}' http://127.0.0.1:8000/newsletter-subscribe
/// ```
#[tracing::instrument(
    name = "Subscribing to newsletter",
    skip(body, settings, client),
    fields(subscriber_email = tracing::field::Empty)
)]
pub async fn newsletter_subscribe(
    body: web::Bytes,
    settings: web::Data<MailchimpSettings>,
    client: web::Data<MailingListClient>,
) -> Result<HttpResponse, SubscribeError> {
    let fields = SubmissionFields::parse(&body);
    let subscription: NewsletterSubscription = (&fields).try_into()?;
    tracing::Span::current().record(
        "subscriber_email",
        tracing::field::display(&subscription.email),
    );

    let cfg = settings.resolve().map_err(SubscribeError::Configuration)?;
    client.upsert_member(&cfg, &subscription).await?;

    Ok(ApiResponse::success("Thanks you're on the list!").respond(StatusCode::OK))
}
