use std::fmt::Display;

use unicode_segmentation::UnicodeSegmentation;

use super::ValidationError;

const MAX_GRAPHEMES: usize = 256;

/// The submitter's name: non-blank, at most 256 graphemes, no control
/// characters. Markup characters are allowed; the name is escaped wherever it
/// is rendered as HTML.
///
/// Must be instantiated with `PersonName::parse`.
#[derive(Debug, Clone)]
pub struct PersonName(String);

impl PersonName {
    pub fn parse(name: String) -> Result<Self, ValidationError> {
        if name.trim().is_empty() {
            return Err(ValidationError::MissingFields);
        }
        if name.graphemes(true).count() > MAX_GRAPHEMES {
            return Err(ValidationError::TooLong("Name"));
        }
        // the name becomes a mail header display name, where a line break
        // cannot be represented
        match name.chars().any(char::is_control) {
            true => Err(ValidationError::InvalidCharacters("Name")),
            false => Ok(Self(name)),
        }
    }
}

impl AsRef<str> for PersonName {
    fn as_ref(&self) -> &str { &self.0 }
}

impl Display for PersonName {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
