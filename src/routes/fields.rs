use std::collections::HashMap;

use serde_json::Value;

/// A request body flattened to `field name -> trimmed string`, before any
/// validation. A missing field and a blank one look the same (`""`), so
/// validators only have to check for emptiness.
#[derive(Debug, Default)]
pub struct SubmissionFields(HashMap<String, String>);

/// Scalars are kept as text; anything else cannot be a form field
fn json_text(value: Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

impl SubmissionFields {
    /// Accepts a JSON object or, if the body is not JSON at all, a
    /// urlencoded form. The `Content-Type` header is not consulted, since
    /// some front ends send JSON as `text/plain` to avoid CORS preflight.
    pub fn parse(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => Self(
                map.into_iter()
                    .map(|(name, value)| (name, json_text(value)))
                    .collect(),
            ),
            // valid JSON, but not something with fields
            Ok(_) => Self::default(),
            Err(_) => Self::from_form(body),
        }
    }

    fn from_form(body: &[u8]) -> Self {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body).unwrap_or_default();
        let mut fields = HashMap::new();
        for (name, value) in pairs {
            // first occurrence wins
            fields
                .entry(name)
                .or_insert_with(|| value.trim().to_string());
        }
        Self(fields)
    }

    /// `""` if absent
    pub fn get(
        &self,
        name: &str,
    ) -> &str {
        self.0.get(name).map(String::as_str).unwrap_or_default()
    }

    /// The first non-blank value among several aliases of the same field
    pub fn first_of(
        &self,
        names: &[&str],
    ) -> &str {
        names
            .iter()
            .map(|name| self.get(name))
            .find(|value| !value.is_empty())
            .unwrap_or_default()
    }

    /// `None` if absent or blank
    pub fn optional(
        &self,
        name: &str,
    ) -> Option<String> {
        Some(self.get(name))
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }
}
