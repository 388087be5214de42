//! Field validation shared by every form.
//!
//! A `Validator` is a list of `FieldRule`s. Validating a field is a pure
//! function of the field name and the full value map, so cross-field checks
//! (confirm password) see the same inputs no matter which field changed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field name → current string value.
pub type FormValues = BTreeMap<String, String>;

/// Inclusive character-count range for a trimmed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthBounds {
    pub min: usize,
    pub max: usize,
}

impl LengthBounds {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, len: usize) -> bool {
        (self.min..=self.max).contains(&len)
    }
}

impl Default for LengthBounds {
    fn default() -> Self {
        Self { min: 10, max: 1000 }
    }
}

/// Metadata for one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    pub name: String,
    pub label: String,
    pub required: bool,
    pub length: Option<LengthBounds>,
    pub must_match: Option<String>,
}

impl FieldRule {
    pub fn required(name: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            required: true,
            length: None,
            must_match: None,
        }
    }

    pub fn optional(name: &str, label: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, label)
        }
    }

    pub fn with_length(mut self, bounds: LengthBounds) -> Self {
        self.length = Some(bounds);
        self
    }

    /// The value must equal the value of `other`.
    pub fn matching(mut self, other: &str) -> Self {
        self.must_match = Some(other.to_string());
        self
    }

    fn check(&self, values: &FormValues) -> String {
        let raw = values.get(&self.name).map(String::as_str).unwrap_or("");
        let value = raw.trim();

        if self.required && value.is_empty() {
            return format!("{} is required.", self.label);
        }
        if let Some(bounds) = self.length {
            if !value.is_empty() && !bounds.contains(value.chars().count()) {
                return format!(
                    "{} must be between {} and {} characters.",
                    self.label, bounds.min, bounds.max
                );
            }
        }
        if let Some(other) = &self.must_match {
            let other = values.get(other).map(String::as_str).unwrap_or("");
            if raw != other {
                return "Passwords do not match.".to_string();
            }
        }
        String::new()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validator {
    rules: Vec<FieldRule>,
}

impl Validator {
    pub fn new(rules: Vec<FieldRule>) -> Self {
        Self { rules }
    }

    /// Title, author, genre, publication date, optional image URL and a
    /// summary bounded by `summary`.
    pub fn book(summary: LengthBounds) -> Self {
        Self::new(vec![
            FieldRule::required("title", "Title"),
            FieldRule::required("author", "Author"),
            FieldRule::required("genre", "Genre"),
            FieldRule::required("date", "Publication Date"),
            FieldRule::optional("imageUrl", "Image URL (Optional)"),
            FieldRule::required("summary", "Summary").with_length(summary),
        ])
    }

    pub fn login() -> Self {
        Self::new(vec![
            FieldRule::required("email", "Email"),
            FieldRule::required("password", "Password"),
        ])
    }

    pub fn register() -> Self {
        Self::new(vec![
            FieldRule::required("username", "Username"),
            FieldRule::required("email", "Email"),
            FieldRule::required("password", "Password"),
            FieldRule::required("confirmPassword", "Confirm Password").matching("password"),
        ])
    }

    pub fn comment() -> Self {
        Self::new(vec![FieldRule::required("comment", "Comment")])
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    pub fn rule(&self, field: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|r| r.name == field)
    }

    /// Error message for `field`, or an empty string when it is valid.
    /// Fields without a rule are always valid.
    pub fn validate(&self, field: &str, values: &FormValues) -> String {
        self.rule(field).map(|r| r.check(values)).unwrap_or_default()
    }

    /// Initial value map with an empty string for every rule.
    pub fn blank_values(&self) -> FormValues {
        self.rules
            .iter()
            .map(|r| (r.name.clone(), String::new()))
            .collect()
    }
}
