use std::fmt::Display;

use lettre::Address;
use validator::ValidateEmail;

#[derive(Debug, Clone)]
/// A syntactically valid email address, used for both senders and
/// recipients. Nothing is checked beyond syntax (no mailbox probing).
pub struct EmailAddress(String);

impl EmailAddress {
    /// On top of the usual `local@domain` rules, the domain must contain a dot:
    /// `john@localhost` may be valid for RFC 5322, but not for a web form.
    ///
    /// The address must also be usable as a mailbox, which rules out a few
    /// local parts `validator` lets through (`.john`, `john..doe`).
    pub fn parse(email: String) -> Result<Self, String> {
        let dotted_domain = email
            .rsplit_once('@')
            .is_some_and(|(_, domain)| domain.contains('.'));
        let mailbox = email.parse::<Address>().is_ok();
        match dotted_domain && mailbox && ValidateEmail::validate_email(&email) {
            true => Ok(Self(email)),
            false => Err(format!("Invalid email: {email:?}")),
        }
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str { &self.0 }
}

impl Display for EmailAddress {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
