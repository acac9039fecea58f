//! Phone number normalization, Colombia (`+57`) by default.

use crate::dom::{Element, Form, Tag};

/// Placeholder given to telephone inputs that have none.
pub const DEFAULT_PLACEHOLDER: &str = "+573001234567 o 3001234567";

const COLOMBIA: &str = "57";
const VALID_CLASS: &str = "border-green-500";
const INVALID_CLASS: &str = "border-red-500";

/// Normalizes a phone number to `+<country><number>`.
///
/// Spaces, hyphens and parentheses are removed. A number that already starts
/// with `+` is kept as is; otherwise `+57` is prepended unless the number
/// already begins with `57` and is long enough to carry it.
///
/// ```
/// use club_forms::phone::normalize_phone;
///
/// assert_eq!(normalize_phone("300 123 4567"), "+573001234567");
/// assert_eq!(normalize_phone("573001234567"), "+573001234567");
/// assert_eq!(normalize_phone("+1 (555) 010-9999"), "+15550109999");
/// ```
pub fn normalize_phone(phone: &str) -> String {
    let cleaned: String = phone
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')'))
        .collect();

    if cleaned.is_empty() {
        return cleaned;
    }
    if cleaned.starts_with('+') {
        return cleaned;
    }

    let digits = cleaned.replace('+', "");
    if digits.starts_with(COLOMBIA) && digits.len() >= 12 {
        format!("+{digits}")
    } else {
        format!("+{COLOMBIA}{digits}")
    }
}

/// Returns whether a phone number is valid once normalized.
///
/// Numbers need 10 to 15 digits; Colombian numbers need exactly ten national
/// digits starting with `3` (mobile) or `6` (landline).
pub fn validate_phone(phone: &str) -> bool {
    let normalized = normalize_phone(phone);
    let Some(digits) = normalized.strip_prefix('+') else {
        return false;
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if !(10..=15).contains(&digits.len()) {
        return false;
    }

    match digits.strip_prefix(COLOMBIA) {
        Some(national) => national.len() == 10 && matches!(national.as_bytes()[0], b'3' | b'6'),
        None => true,
    }
}

/// Formats a number for display: the normalized form.
pub fn format_phone_display(phone: &str) -> String {
    normalize_phone(phone)
}

/// Formats a number for `tel:` and messaging links: normalized, without `+`.
pub fn format_phone_link(phone: &str) -> String {
    let normalized = normalize_phone(phone);
    match normalized.strip_prefix('+') {
        Some(rest) => rest.to_string(),
        None => normalized,
    }
}

/// Formats a Colombian number as `+57 300 123 4567`. Other numbers are
/// returned normalized.
pub fn format_phone_grouped(phone: &str) -> String {
    let normalized = normalize_phone(phone);
    let national = normalized
        .strip_prefix("+57")
        .filter(|n| n.len() == 10 && n.bytes().all(|b| b.is_ascii_digit()));

    match national {
        Some(n) => format!("+57 {} {} {}", &n[..3], &n[3..6], &n[6..]),
        None => normalized,
    }
}

/// Drops every character a phone number cannot contain while typing.
pub fn sanitize_phone_input(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_digit() || c.is_whitespace() || matches!(c, '+' | '-' | '(' | ')'))
        .collect()
}

/// Normalizes a telephone input when it loses focus and marks it valid or
/// invalid. An empty input is left alone and counts as valid.
pub fn normalize_on_blur(input: &mut Element) -> bool {
    if input.value.trim().is_empty() {
        return true;
    }

    input.value = normalize_phone(&input.value);
    let valid = validate_phone(&input.value);
    let (add, remove) = if valid {
        (VALID_CLASS, INVALID_CLASS)
    } else {
        (INVALID_CLASS, VALID_CLASS)
    };
    input.attrs.remove_class(remove);
    input.attrs.add_class(add);
    valid
}

/// Gives every telephone input of a form the default placeholder (when it has
/// none) and length bounds. Returns how many inputs were updated.
pub fn apply_phone_defaults(form: &mut Form) -> usize {
    let mut updated = 0;
    for input in &mut form.elements {
        if input.tag != Tag::Input || input.input_type() != "tel" {
            continue;
        }
        if input.placeholder_text().map_or(true, str::is_empty) {
            input.attrs.set("placeholder", DEFAULT_PLACEHOLDER);
        }
        input.attrs.set("minlength", "10");
        input.attrs.set("maxlength", "20");
        updated += 1;
    }
    updated
}
