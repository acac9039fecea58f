#![allow(dead_code)]

use club_forms::dom::{Document, Element, Form};
use club_forms::panel::PANEL_CONTAINER_ID;
use club_forms::{FieldErrors, FormValidator};

/// The package announcement page: guide number, customer name, phone and
/// email, with a submit button.
pub fn announce_page() -> Document {
    Document::new()
        .form(
            Form::new("announce-form")
                .element(
                    Element::input("guide_number")
                        .id("guide_number")
                        .required()
                        .rules(r#"[{"type": "custom", "value": "trackingNumber"}]"#),
                )
                .element(
                    Element::input("customer_name")
                        .id("customer_name")
                        .required()
                        .min_length(3),
                )
                .element(Element::input("phone").id("phone").kind("tel"))
                .element(Element::input("email").id("email").kind("email"))
                .element(Element::button("Anunciar").id("announce-submit")),
        )
        .label("guide_number", "Número de guía *")
        .label("customer_name", "Nombre del cliente *")
        .container(PANEL_CONTAINER_ID)
}

/// A two-field registration form with a password confirmation rule.
pub fn register_page(password: &str, confirm: &str) -> Document {
    Document::new().form(
        Form::new("register")
            .element(
                Element::input("password")
                    .id("password")
                    .kind("password")
                    .required()
                    .value(password),
            )
            .element(
                Element::input("confirm")
                    .id("confirm")
                    .kind("password")
                    .value(confirm)
                    .rules(r#"[{"type": "custom", "value": "matchFields:password"}]"#),
            ),
    )
}

/// Sets the value of a field found by id.
pub fn set_value(doc: &mut Document, id: &str, value: &str) {
    let at = doc
        .find_by_id(id)
        .unwrap_or_else(|| panic!("no element with id {id}"));
    doc.element_mut(at)
        .unwrap_or_else(|| panic!("dangling reference for {id}"))
        .value = value.to_string();
}

/// Validates a form of the page and returns its errors.
pub fn errors_of(doc: &Document, form_id: &str) -> FieldErrors {
    FormValidator::new(form_id)
        .validate_in(doc)
        .unwrap_or_else(|e| panic!("validation of {form_id} failed: {e}"))
        .into_errors()
}

/// Messages of a field, or an empty list.
pub fn messages(errors: &FieldErrors, field: &str) -> Vec<String> {
    errors.get(field).map(<[String]>::to_vec).unwrap_or_default()
}
