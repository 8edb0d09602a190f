use std::time::Duration;

use md5::Digest;
use md5::Md5;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::Serialize;

use crate::configuration::MailchimpConfig;
use crate::domain::NewsletterSubscription;

/// Why an upsert did not succeed. Neither variant is shown to the client as is;
/// see `SubscribeError`.
#[derive(thiserror::Error, Debug)]
pub enum DispatchError {
    #[error("list API rejected the request with status {status}")]
    Rejected {
        status: u16,
        /// Human-readable `detail` from the upstream problem document, if any
        detail: Option<String>,
    },
    #[error("list API could not be reached")]
    Unreachable(#[source] reqwest::Error),
}

/// Client for the list membership API. One instance is shared by all workers
/// so that connections are reused; credentials are passed per call.
pub struct MailingListClient {
    http_client: Client,
}

#[derive(Serialize)]
struct MemberUpsert<'a> {
    email_address: &'a str,
    status: &'a str,
    status_if_new: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    merge_fields: Option<MergeFields<'a>>,
}

#[derive(Serialize)]
struct MergeFields<'a> {
    #[serde(rename = "FNAME")]
    first_name: &'a str,
}

/// The subset of the upstream error body we care about
#[derive(Deserialize)]
struct ProblemDetail {
    detail: Option<String>,
}

/// Members are addressed by the MD5 of their lower-cased address, which makes
/// `PUT` on that path an upsert: resubmitting an address updates the existing
/// member instead of creating a duplicate.
pub fn subscriber_hash(email: &str) -> String {
    hex::encode(Md5::digest(email.to_lowercase().as_bytes()))
}

impl MailingListClient {
    /// `timeout` bounds each request as a whole (connect, send, and read)
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self { http_client })
    }

    /// Subscribe a new member, or re-subscribe an existing one. The submitted
    /// address is sent as is; only the path segment is lower-cased.
    #[tracing::instrument(
        name = "Upserting list member",
        skip_all,
        fields(subscriber_hash = tracing::field::Empty)
    )]
    pub async fn upsert_member(
        &self,
        cfg: &MailchimpConfig,
        subscription: &NewsletterSubscription,
    ) -> Result<(), DispatchError> {
        let hash = subscriber_hash(subscription.email.as_ref());
        tracing::Span::current().record("subscriber_hash", tracing::field::display(&hash));

        let url = format!(
            "{}/3.0/lists/{}/members/{}",
            cfg.base_url, cfg.audience_id, hash
        );
        let body = MemberUpsert {
            email_address: subscription.email.as_ref(),
            status: "subscribed",
            status_if_new: "subscribed",
            merge_fields: subscription
                .first_name
                .as_deref()
                .map(|first_name| MergeFields { first_name }),
        };

        let response = self
            .http_client
            .put(&url)
            // the username is ignored upstream
            .basic_auth("anystring", Some(cfg.api_key.expose_secret()))
            .json(&body)
            .send()
            .await
            .map_err(DispatchError::Unreachable)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        // a missing or malformed body is not an error in itself; the status
        // alone is enough to report the failure
        let detail = response
            .json::<ProblemDetail>()
            .await
            .ok()
            .and_then(|p| p.detail)
            .filter(|d| !d.trim().is_empty());

        Err(DispatchError::Rejected {
            status: status.as_u16(),
            detail,
        })
    }
}
