use super::EmailAddress;

/// A validated `/newsletter-subscribe` request
#[derive(Debug)]
pub struct NewsletterSubscription {
    pub email: EmailAddress,
    /// `None` when blank; only sent upstream when present
    pub first_name: Option<String>,
}
