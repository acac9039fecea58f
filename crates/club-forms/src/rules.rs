//! Validation rules and their declarative serialization.
//!
//! A [`ValidationRule`] pairs a [`RuleKind`] with the message reported when the
//! rule fails. Fields carry their rules either as HTML constraint attributes or
//! as a serialized rule list, a JSON array of `{type, value?, message?}`
//! objects:
//!
//! ```
//! use club_forms::rules::{parse_rule_list, CustomRegistry};
//!
//! let rules = parse_rule_list(
//!     r#"[{"type": "minlength", "value": 3, "message": "Muy corto"},
//!         {"type": "custom", "value": "trackingNumber"}]"#,
//!     &CustomRegistry::with_builtins(),
//! )
//! .unwrap();
//! assert_eq!(rules.len(), 2);
//! assert_eq!(rules[0].message(), "Muy corto");
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::dom::{Document, Element, ElementRef, Form};
use crate::error::{FormError, Result};

/// Default message of the `required` rule.
pub const REQUIRED_MESSAGE: &str = "Este campo es requerido";
/// Default message of the `email` rule.
pub const EMAIL_MESSAGE: &str = "El email no es válido";
/// Default message of the `phone` rule.
pub const PHONE_MESSAGE: &str = "El teléfono no es válido";
/// Default message of the `pattern` rule.
pub const PATTERN_MESSAGE: &str = "El formato no es válido";

/// The field a rule is being evaluated for, plus its owning form.
#[derive(Debug, Clone, Copy)]
pub struct FieldContext<'a> {
    /// Owning form, if the field is inside one.
    pub form: Option<&'a Form>,
    /// The field itself.
    pub field: &'a Element,
}

impl<'a> FieldContext<'a> {
    /// Creates a context for a field of a form.
    #[must_use]
    pub const fn new(form: &'a Form, field: &'a Element) -> Self {
        Self {
            form: Some(form),
            field,
        }
    }

    /// Creates a context for a field outside every form.
    #[must_use]
    pub const fn detached(field: &'a Element) -> Self {
        Self { form: None, field }
    }

    /// Resolves an element of a page together with its owning form.
    #[must_use]
    pub fn locate(doc: &'a Document, at: ElementRef) -> Option<Self> {
        let field = doc.element(at)?;
        Some(Self {
            form: at.form.and_then(|f| doc.form_at(f)),
            field,
        })
    }

    /// Returns the raw value of a sibling field, by id or name.
    #[must_use]
    pub fn value_of(&self, key: &str) -> Option<&'a str> {
        self.form.and_then(|form| form.value_of(key))
    }
}

/// A custom predicate. Returning `true` means the value is INVALID.
pub type Predicate = Arc<dyn Fn(&str, &FieldContext<'_>) -> bool + Send + Sync>;

/// Builds a rule from the optional argument of a serialized custom entry.
pub type RuleFactory = Arc<dyn Fn(Option<&str>) -> Option<ValidationRule> + Send + Sync>;

/// What a rule checks.
#[derive(Clone)]
pub enum RuleKind {
    /// Value must not be empty.
    Required,
    /// Value must look like `local@domain.tld`.
    Email,
    /// Value must look like a phone number.
    Phone,
    /// Value must have at least this many characters.
    MinLength(usize),
    /// Value must have at most this many characters.
    MaxLength(usize),
    /// Value must match the expression.
    Pattern(Regex),
    /// Value is invalid when the predicate returns `true`.
    Custom(Predicate),
}

impl std::fmt::Debug for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required => f.write_str("Required"),
            Self::Email => f.write_str("Email"),
            Self::Phone => f.write_str("Phone"),
            Self::MinLength(n) => f.debug_tuple("MinLength").field(n).finish(),
            Self::MaxLength(n) => f.debug_tuple("MaxLength").field(n).finish(),
            Self::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A rule and the message reported when it fails.
#[derive(Debug, Clone)]
pub struct ValidationRule {
    kind: RuleKind,
    message: String,
}

impl ValidationRule {
    /// Creates a rule with an explicit message.
    pub fn new(kind: RuleKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// A `required` rule with the default message.
    #[must_use]
    pub fn required() -> Self {
        Self::new(RuleKind::Required, REQUIRED_MESSAGE)
    }

    /// An `email` rule with the default message.
    #[must_use]
    pub fn email() -> Self {
        Self::new(RuleKind::Email, EMAIL_MESSAGE)
    }

    /// A `phone` rule with the default message.
    #[must_use]
    pub fn phone() -> Self {
        Self::new(RuleKind::Phone, PHONE_MESSAGE)
    }

    /// A minimum length rule with the default message.
    #[must_use]
    pub fn min_length(length: usize) -> Self {
        Self::new(
            RuleKind::MinLength(length),
            format!("Debe tener al menos {length} caracteres"),
        )
    }

    /// A maximum length rule with the default message.
    #[must_use]
    pub fn max_length(length: usize) -> Self {
        Self::new(
            RuleKind::MaxLength(length),
            format!("No puede tener más de {length} caracteres"),
        )
    }

    /// A pattern rule with the default message.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::InvalidPattern`] if the pattern does not compile.
    pub fn pattern(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| FormError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self::new(RuleKind::Pattern(regex), PATTERN_MESSAGE))
    }

    /// A custom rule. The predicate returns `true` when the value is invalid.
    pub fn custom<F>(message: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&str, &FieldContext<'_>) -> bool + Send + Sync + 'static,
    {
        Self::new(RuleKind::Custom(Arc::new(predicate)), message)
    }

    /// Replaces the failure message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Returns the rule kind.
    #[must_use]
    pub const fn kind(&self) -> &RuleKind {
        &self.kind
    }

    /// Returns the failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the serialized type name of the rule.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            RuleKind::Required => "required",
            RuleKind::Email => "email",
            RuleKind::Phone => "phone",
            RuleKind::MinLength(_) => "minlength",
            RuleKind::MaxLength(_) => "maxlength",
            RuleKind::Pattern(_) => "pattern",
            RuleKind::Custom(_) => "custom",
        }
    }
}

/// Named custom rules that serialized rule lists may refer to.
#[derive(Clone, Default)]
pub struct CustomRegistry {
    factories: HashMap<String, RuleFactory>,
}

impl std::fmt::Debug for CustomRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("CustomRegistry")
            .field("names", &names)
            .finish()
    }
}

impl CustomRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in predicates.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::custom::register_builtins(&mut registry);
        registry
    }

    /// Registers a rule factory under a name, replacing any previous one.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(Option<&str>) -> Option<ValidationRule> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Builder method to register a rule factory.
    #[must_use]
    pub fn with<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(Option<&str>) -> Option<ValidationRule> + Send + Sync + 'static,
    {
        self.register(name, factory);
        self
    }

    /// Returns whether a name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Builds the rule registered under `name`.
    pub fn build(&self, name: &str, argument: Option<&str>) -> Option<ValidationRule> {
        self.factories.get(name).and_then(|factory| factory(argument))
    }
}

#[derive(Debug, Deserialize)]
struct RuleEntry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

/// Parses the integer prefix of a length attribute (`"6"`, `" 12px"`).
/// Bounds too large for `usize` saturate.
pub(crate) fn parse_length(raw: &str) -> Option<usize> {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    if digits.is_empty() {
        return None;
    }
    Some(digits.parse().unwrap_or(usize::MAX))
}

fn length_value(value: Option<&Value>, kind: &'static str) -> Result<usize> {
    let length = match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .map(|n| usize::try_from(n).unwrap_or(usize::MAX)),
        Some(Value::String(s)) => parse_length(s),
        _ => None,
    };
    length.ok_or(FormError::MissingValue { kind })
}

fn rule_from_entry(entry: Value, registry: &CustomRegistry) -> Result<ValidationRule> {
    let entry: RuleEntry = serde_json::from_value(entry)?;

    let rule = match entry.kind.as_str() {
        "required" => ValidationRule::required(),
        "email" => ValidationRule::email(),
        "phone" => ValidationRule::phone(),
        "minlength" => {
            ValidationRule::min_length(length_value(entry.value.as_ref(), "minlength")?)
        }
        "maxlength" => {
            ValidationRule::max_length(length_value(entry.value.as_ref(), "maxlength")?)
        }
        "pattern" => {
            let pattern = entry
                .value
                .as_ref()
                .and_then(Value::as_str)
                .ok_or(FormError::MissingValue { kind: "pattern" })?;
            ValidationRule::pattern(pattern)?
        }
        "custom" => {
            let spec = entry
                .value
                .as_ref()
                .and_then(Value::as_str)
                .ok_or(FormError::MissingValue { kind: "custom" })?;
            let (name, argument) = match spec.split_once(':') {
                Some((name, argument)) => (name, Some(argument)),
                None => (spec, None),
            };
            registry
                .build(name, argument)
                .ok_or_else(|| FormError::UnknownPredicate(spec.to_string()))?
        }
        other => return Err(FormError::UnknownRuleType(other.to_string())),
    };

    Ok(match entry.message {
        Some(message) => rule.with_message(message),
        None => rule,
    })
}

/// Parses a serialized rule list.
///
/// Entries that cannot be turned into a rule are skipped with a warning.
///
/// # Errors
///
/// Returns [`FormError::MalformedRules`] if the input is not a JSON array.
pub fn parse_rule_list(json: &str, registry: &CustomRegistry) -> Result<Vec<ValidationRule>> {
    let entries: Vec<Value> = serde_json::from_str(json)?;

    Ok(entries
        .into_iter()
        .filter_map(|entry| match rule_from_entry(entry, registry) {
            Ok(rule) => Some(rule),
            Err(error) => {
                warn!(%error, "skipping validation rule");
                None
            }
        })
        .collect())
}
