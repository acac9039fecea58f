//! Rule extraction from a field's declared constraints.

use tracing::warn;

use crate::dom::Element;
use crate::rules::{parse_length, parse_rule_list, CustomRegistry, ValidationRule};

/// Attribute holding a field's serialized rule list.
pub const RULES_ATTRIBUTE: &str = "data-validation-rules";

/// Returns the rules declared by a field, in evaluation order:
/// `required`, the type rule (`email` or `tel`), `minlength`, `maxlength`,
/// `pattern`, then the entries of the serialized rule list.
///
/// The field is never modified. Constraints that cannot be turned into a rule
/// are logged and skipped.
pub fn extract_rules(field: &Element, registry: &CustomRegistry) -> Vec<ValidationRule> {
    let mut rules = Vec::new();

    if field.is_required() {
        rules.push(ValidationRule::required());
    }

    match field.input_type().as_str() {
        "email" => rules.push(ValidationRule::email()),
        "tel" => rules.push(ValidationRule::phone()),
        _ => {}
    }

    if let Some(raw) = field.attrs.get("minlength") {
        match parse_length(raw) {
            Some(length) => rules.push(ValidationRule::min_length(length)),
            None => warn!(field = field.key(), minlength = raw, "ignoring unparseable minlength"),
        }
    }

    if let Some(raw) = field.attrs.get("maxlength") {
        match parse_length(raw) {
            Some(length) => rules.push(ValidationRule::max_length(length)),
            None => warn!(field = field.key(), maxlength = raw, "ignoring unparseable maxlength"),
        }
    }

    if let Some(pattern) = field.attrs.get("pattern") {
        match ValidationRule::pattern(pattern) {
            Ok(rule) => rules.push(rule),
            Err(error) => warn!(field = field.key(), %error, "ignoring pattern"),
        }
    }

    if let Some(json) = field.attrs.get(RULES_ATTRIBUTE).filter(|j| !j.is_empty()) {
        match parse_rule_list(json, registry) {
            Ok(custom) => rules.extend(custom),
            Err(error) => warn!(field = field.key(), %error, "error parsing validation rules"),
        }
    }

    rules
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_names(rules: &[ValidationRule]) -> Vec<&'static str> {
        rules.iter().map(ValidationRule::type_name).collect()
    }

    #[test]
    fn test_precedence_order() {
        let field = Element::input("code")
            .rules(r#"[{"type": "custom", "value": "trackingNumber"}]"#)
            .pattern("^[A-Z]+$")
            .max_length(20)
            .min_length(6)
            .kind("email")
            .required();

        let rules = extract_rules(&field, &CustomRegistry::with_builtins());
        assert_eq!(
            type_names(&rules),
            vec!["required", "email", "minlength", "maxlength", "pattern", "custom"]
        );
    }

    #[test]
    fn test_tel_gets_phone_rule() {
        let field = Element::input("phone").kind("tel");
        let rules = extract_rules(&field, &CustomRegistry::new());
        assert_eq!(type_names(&rules), vec!["phone"]);
    }

    #[test]
    fn test_plain_field_has_no_rules() {
        let field = Element::input("notes");
        assert!(extract_rules(&field, &CustomRegistry::new()).is_empty());
        assert!(extract_rules(&Element::select("s"), &CustomRegistry::new()).is_empty());
    }

    #[test]
    fn test_malformed_rule_list_contributes_nothing() {
        let field = Element::input("name").required().rules("[{oops");
        let rules = extract_rules(&field, &CustomRegistry::new());
        assert_eq!(type_names(&rules), vec!["required"]);
    }

    #[test]
    fn test_bad_constraints_are_skipped() {
        let field = Element::input("name")
            .attr("minlength", "many")
            .pattern("([")
            .max_length(4);
        let rules = extract_rules(&field, &CustomRegistry::new());
        assert_eq!(type_names(&rules), vec!["maxlength"]);
    }

    #[test]
    fn test_extraction_does_not_touch_field() {
        let field = Element::input("email").kind("email").required().value(" a ");
        let before = field.clone();
        let _ = extract_rules(&field, &CustomRegistry::new());
        assert_eq!(field, before);
    }
}
