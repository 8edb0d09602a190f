use super::EmailAddress;
use super::PersonName;

/// A validated `/send-mail` request. All text is stored as submitted (trimmed,
/// but not escaped); escaping happens when the text is placed into HTML.
#[derive(Debug)]
pub struct ContactInquiry {
    pub full_name: PersonName,
    pub email: EmailAddress,
    pub phone: Option<String>,
    pub subject: String,
    pub enquiry_type: String,
    pub message: String,
}
