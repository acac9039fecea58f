//! Rule evaluation.
//!
//! Every rule except `required` accepts an empty value, so a blank field only
//! ever reports that it is required.

use std::sync::LazyLock;

use regex::Regex;

use crate::rules::{FieldContext, RuleKind, ValidationRule};

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex compiles"));

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9\s\-()]{7,}$").expect("phone regex compiles"));

/// Returns whether a value looks like `local@domain.tld`.
pub fn is_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

/// Returns whether a value looks like a phone number.
pub fn is_phone(value: &str) -> bool {
    PHONE.is_match(value)
}

/// Applies one rule to a trimmed value, returning the failure message.
pub fn evaluate<'r>(
    value: &str,
    rule: &'r ValidationRule,
    ctx: &FieldContext<'_>,
) -> Option<&'r str> {
    let failed = match rule.kind() {
        RuleKind::Required => value.is_empty(),
        RuleKind::Email => !value.is_empty() && !is_email(value),
        RuleKind::Phone => !value.is_empty() && !is_phone(value),
        RuleKind::MinLength(min) => !value.is_empty() && value.chars().count() < *min,
        RuleKind::MaxLength(max) => !value.is_empty() && value.chars().count() > *max,
        RuleKind::Pattern(pattern) => !value.is_empty() && !pattern.is_match(value),
        RuleKind::Custom(predicate) => predicate(value, ctx),
    };

    failed.then(|| rule.message())
}

/// Applies every rule in order and collects the failure messages.
pub fn evaluate_all(value: &str, rules: &[ValidationRule], ctx: &FieldContext<'_>) -> Vec<String> {
    rules
        .iter()
        .filter_map(|rule| evaluate(value, rule, ctx))
        .map(str::to_string)
        .collect()
}
