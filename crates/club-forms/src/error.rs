//! Error types for the form engine.

use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

/// Form engine errors.
///
/// Failed validation is not an error; it is reported through [`FieldErrors`].
#[derive(Debug, Error)]
pub enum FormError {
    /// A serialized rule list is not valid JSON or not a JSON array.
    #[error("malformed validation rules: {0}")]
    MalformedRules(#[from] serde_json::Error),

    /// A rule entry names an unknown rule type.
    #[error("unknown rule type: {0}")]
    UnknownRuleType(String),

    /// A rule entry lacks the value its type needs.
    #[error("rule '{kind}' needs a value")]
    MissingValue {
        /// Rule type name.
        kind: &'static str,
    },

    /// A pattern does not compile.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Compilation error.
        #[source]
        source: regex::Error,
    },

    /// A custom rule names a predicate that is not registered.
    #[error("unknown custom predicate: {0}")]
    UnknownPredicate(String),

    /// No form with the given id exists on the page.
    #[error("form not found: {0}")]
    FormNotFound(String),

    /// No field with the given id exists on the page.
    #[error("field not found: {0}")]
    FieldNotFound(String),
}

/// Per-field error messages, kept in the order fields were validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    entries: Vec<(String, Vec<String>)>,
}

impl FieldErrors {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an error for a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        if let Some((_, messages)) = self.entries.iter_mut().find(|(name, _)| name == field) {
            messages.push(message.into());
            return;
        }
        self.entries.push((field.to_string(), vec![message.into()]));
    }

    /// Replaces a field's errors. An empty list removes the entry.
    pub fn replace(&mut self, field: &str, messages: Vec<String>) {
        self.remove(field);
        if !messages.is_empty() {
            self.entries.push((field.to_string(), messages));
        }
    }

    /// Removes a field's errors.
    pub fn remove(&mut self, field: &str) -> Option<Vec<String>> {
        let position = self.entries.iter().position(|(name, _)| name == field)?;
        Some(self.entries.remove(position).1)
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns whether there are any errors.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of fields with errors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns errors for a specific field.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, messages)| messages.as_slice())
    }

    /// Iterates over fields and their messages.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, messages)| (name.as_str(), messages.as_slice()))
    }

    /// Returns all errors as a flat list.
    pub fn all_errors(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(field, messages)| {
                messages
                    .iter()
                    .map(move |msg| (field.as_str(), msg.as_str()))
            })
            .collect()
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (field, messages) in &self.entries {
            for message in messages {
                writeln!(f, "{field}: {message}")?;
            }
        }
        Ok(())
    }
}

impl Serialize for FieldErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (field, messages) in &self.entries {
            map.serialize_entry(field, messages)?;
        }
        map.end()
    }
}

/// Result type alias for form engine operations.
pub type Result<T> = std::result::Result<T, FormError>;
