//! Built-in custom rules.
//!
//! | name | argument | message |
//! |------|----------|---------|
//! | `matchFields` | id or name of the field to match | `Los campos no coinciden` |
//! | `trackingNumber` | - | `El número de guía no es válido` |
//! | `colombianPhone` | - | `El teléfono colombiano no es válido` |
//! | `colombianId` | - | `La cédula no es válida` |

use std::sync::LazyLock;

use regex::Regex;

use crate::rules::{CustomRegistry, ValidationRule};

static TRACKING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]{6,20}$").expect("tracking regex compiles"));

static COLOMBIAN_PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\+57|57)?[0-9]{10}$").expect("phone regex compiles"));

static COLOMBIAN_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{6,12}$").expect("id regex compiles"));

/// Fails when the field's raw value differs from the raw value of `other`.
/// A missing `other` field counts as a mismatch.
pub fn match_fields(other: impl Into<String>) -> ValidationRule {
    let other = other.into();
    ValidationRule::custom("Los campos no coinciden", move |_, ctx| {
        ctx.value_of(&other) != Some(ctx.field.value.as_str())
    })
}

/// Fails on a non-empty value that is not 6 to 20 upper-case letters or digits.
pub fn tracking_number() -> ValidationRule {
    ValidationRule::custom("El número de guía no es válido", |value, _| {
        !value.is_empty() && !TRACKING_NUMBER.is_match(value)
    })
}

/// Fails on a non-empty value that is not a ten-digit Colombian number,
/// optionally prefixed with `+57` or `57`. Whitespace is ignored.
pub fn colombian_phone() -> ValidationRule {
    ValidationRule::custom("El teléfono colombiano no es válido", |value, _| {
        let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
        !value.is_empty() && !COLOMBIAN_PHONE.is_match(&compact)
    })
}

/// Fails on a non-empty value that is not a 6 to 12 digit national id.
pub fn colombian_id() -> ValidationRule {
    ValidationRule::custom("La cédula no es válida", |value, _| {
        !value.is_empty() && !COLOMBIAN_ID.is_match(value)
    })
}

pub(crate) fn register_builtins(registry: &mut CustomRegistry) {
    registry.register("matchFields", |other| other.map(match_fields));
    registry.register("trackingNumber", |_| Some(tracking_number()));
    registry.register("colombianPhone", |_| Some(colombian_phone()));
    registry.register("colombianId", |_| Some(colombian_id()));
}
