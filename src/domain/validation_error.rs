/// The first unmet requirement of a submission. The message is shown to the
/// client verbatim.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required fields.")]
    MissingFields,
    /// Newsletter signups only have one required field, so a missing email and
    /// a malformed one are reported alike
    #[error("Please provide a valid email address.")]
    InvalidSubscriberEmail,
    #[error("Invalid email address.")]
    InvalidEmail,
    #[error("{0} is too long.")]
    TooLong(&'static str),
    #[error("{0} contains invalid characters.")]
    InvalidCharacters(&'static str),
}
