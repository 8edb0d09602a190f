mod contact_inquiry;
mod email_address;
mod newsletter_subscription;
mod person_name;
mod validation_error;
// allow external `use` statements to skip `email_address` etc
pub use contact_inquiry::ContactInquiry;
pub use email_address::EmailAddress;
pub use newsletter_subscription::NewsletterSubscription;
pub use person_name::PersonName;
pub use validation_error::ValidationError;
