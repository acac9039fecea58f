//! Page document model.
//!
//! A page is a list of forms whose elements are kept in document order, the
//! elements that live outside any form, the `<label for>` table and the ids of
//! the static containers the front-ends render into. Everything is plain owned
//! data so a page can be built in code or loaded from a JSON fixture.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Fallback display name for a field with no label, placeholder, name or id.
pub const DEFAULT_FIELD_NAME: &str = "Campo";

/// Element tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    /// `<input>`
    #[default]
    Input,
    /// `<select>`
    Select,
    /// `<textarea>`
    Textarea,
    /// `<button>`
    Button,
    /// Any other tag.
    #[serde(other)]
    Other,
}

impl Tag {
    /// Returns whether elements with this tag are subject to validation.
    #[must_use]
    pub const fn is_field(self) -> bool {
        matches!(self, Self::Input | Self::Select | Self::Textarea)
    }
}

/// HTML attributes of an element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes {
    /// Attribute values keyed by attribute name.
    pub attrs: HashMap<String, String>,
}

impl Attributes {
    /// Creates an empty attribute set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an attribute.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(key.into(), value.into());
    }

    /// Gets an attribute.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// Returns whether the attribute is present (boolean attributes have any value).
    pub fn has(&self, key: &str) -> bool {
        self.attrs.contains_key(key)
    }

    /// Returns whether no attribute is set.
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Removes an attribute, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.attrs.remove(key)
    }

    /// Builder method to set an attribute.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Returns whether the `class` attribute lists `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.get("class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }

    /// Adds a class to the `class` attribute if not already present.
    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let current = self.get("class").unwrap_or_default();
        let updated = format!("{current} {class}");
        self.set("class", updated.trim());
    }

    /// Removes every occurrence of a class from the `class` attribute.
    pub fn remove_class(&mut self, class: &str) {
        if let Some(current) = self.attrs.get_mut("class") {
            *current = current
                .split_whitespace()
                .filter(|c| *c != class)
                .collect::<Vec<_>>()
                .join(" ");
        }
    }
}

/// A single element of the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Element tag.
    #[serde(default)]
    pub tag: Tag,
    /// `id` attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// `name` attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Current value (button text for buttons).
    #[serde(default)]
    pub value: String,
    /// Remaining attributes.
    #[serde(default)]
    pub attrs: Attributes,
}

impl Element {
    /// Creates an element with the given tag.
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            ..Self::default()
        }
    }

    /// Creates a named `<input>`.
    pub fn input(name: impl Into<String>) -> Self {
        Self::new(Tag::Input).name(name)
    }

    /// Creates a named `<select>`.
    pub fn select(name: impl Into<String>) -> Self {
        Self::new(Tag::Select).name(name)
    }

    /// Creates a named `<textarea>`.
    pub fn textarea(name: impl Into<String>) -> Self {
        Self::new(Tag::Textarea).name(name)
    }

    /// Creates a `<button>` with the given caption.
    pub fn button(caption: impl Into<String>) -> Self {
        Self::new(Tag::Button).value(caption)
    }

    /// Sets the id.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the current value.
    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Sets an attribute.
    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.set(key, value);
        self
    }

    /// Sets the `type` attribute.
    #[must_use]
    pub fn kind(self, input_type: &str) -> Self {
        self.attr("type", input_type)
    }

    /// Marks the element as required.
    #[must_use]
    pub fn required(self) -> Self {
        self.attr("required", "required")
    }

    /// Sets `minlength`.
    #[must_use]
    pub fn min_length(self, length: usize) -> Self {
        self.attr("minlength", length.to_string())
    }

    /// Sets `maxlength`.
    #[must_use]
    pub fn max_length(self, length: usize) -> Self {
        self.attr("maxlength", length.to_string())
    }

    /// Sets `pattern`.
    #[must_use]
    pub fn pattern(self, pattern: &str) -> Self {
        self.attr("pattern", pattern)
    }

    /// Sets `placeholder`.
    #[must_use]
    pub fn placeholder(self, text: &str) -> Self {
        self.attr("placeholder", text)
    }

    /// Attaches a serialized rule list (`data-validation-rules`).
    #[must_use]
    pub fn rules(self, json: &str) -> Self {
        self.attr("data-validation-rules", json)
    }

    /// Disables the element.
    #[must_use]
    pub fn disabled(self) -> Self {
        self.attr("disabled", "disabled")
    }

    /// Checks a checkbox or radio input.
    #[must_use]
    pub fn checked(self) -> Self {
        self.attr("checked", "checked")
    }

    /// Returns the effective input type, lower-cased.
    pub fn input_type(&self) -> String {
        match self.tag {
            Tag::Input => self
                .attrs
                .get("type")
                .map_or_else(|| "text".to_string(), str::to_ascii_lowercase),
            Tag::Button => self
                .attrs
                .get("type")
                .map_or_else(|| "submit".to_string(), str::to_ascii_lowercase),
            Tag::Select => "select-one".to_string(),
            Tag::Textarea => "textarea".to_string(),
            Tag::Other => String::new(),
        }
    }

    /// Returns the key the field's errors are recorded under: name, else id.
    pub fn key(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or_else(|| self.id.as_deref().filter(|id| !id.is_empty()))
            .unwrap_or_default()
    }

    /// Returns whether activating this element submits its form.
    pub fn is_submit_control(&self) -> bool {
        self.tag == Tag::Button || (self.tag == Tag::Input && self.input_type() == "submit")
    }

    /// Returns whether the element carries the `required` attribute.
    pub fn is_required(&self) -> bool {
        self.attrs.has("required")
    }

    /// Returns whether the element is disabled.
    pub fn is_disabled(&self) -> bool {
        self.attrs.has("disabled")
    }

    /// Returns whether a checkbox or radio is checked.
    pub fn is_checked(&self) -> bool {
        self.attrs.has("checked")
    }

    /// Returns the placeholder text.
    pub fn placeholder_text(&self) -> Option<&str> {
        self.attrs.get("placeholder")
    }

    /// Returns a `data-*` attribute.
    pub fn data(&self, name: &str) -> Option<&str> {
        self.attrs.get(&format!("data-{name}"))
    }
}

/// A form and its elements in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    /// `id` attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Other attributes of the `<form>` tag.
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attrs: Attributes,
    /// Descendant elements in document order.
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl Form {
    /// Creates an empty form with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            attrs: Attributes::new(),
            elements: Vec::new(),
        }
    }

    /// Sets an attribute of the `<form>` tag.
    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.set(key, value);
        self
    }

    /// Returns a `data-*` attribute of the `<form>` tag.
    pub fn data(&self, name: &str) -> Option<&str> {
        self.attrs.get(&format!("data-{name}"))
    }

    /// Appends an element.
    #[must_use]
    pub fn element(mut self, element: Element) -> Self {
        self.elements.push(element);
        self
    }

    /// Iterates over field elements (input, select, textarea) in document order.
    pub fn fields(&self) -> impl Iterator<Item = (usize, &Element)> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, el)| el.tag.is_field())
    }

    /// Returns the element at `index`.
    pub fn get(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    /// Returns the element at `index` mutably.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Element> {
        self.elements.get_mut(index)
    }

    /// Finds an element by id.
    pub fn find_by_id(&self, id: &str) -> Option<usize> {
        self.elements
            .iter()
            .position(|el| el.id.as_deref() == Some(id))
    }

    /// Finds a field by id, then by name.
    pub fn find_field(&self, key: &str) -> Option<usize> {
        self.find_by_id(key).or_else(|| {
            self.elements
                .iter()
                .position(|el| el.name.as_deref() == Some(key))
        })
    }

    /// Returns the raw value of the field with the given id or name.
    pub fn value_of(&self, key: &str) -> Option<&str> {
        self.find_field(key)
            .and_then(|i| self.elements.get(i))
            .map(|el| el.value.as_str())
    }
}

/// A `<label for="...">` association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Id of the labelled element.
    #[serde(rename = "for")]
    pub for_id: String,
    /// Label text as rendered.
    pub text: String,
}

/// Address of an element within a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementRef {
    /// Owning form index, `None` for elements outside every form.
    pub form: Option<usize>,
    /// Index within the form (or within the loose elements).
    pub index: usize,
}

impl ElementRef {
    /// Refers to an element of a form.
    #[must_use]
    pub const fn in_form(form: usize, index: usize) -> Self {
        Self {
            form: Some(form),
            index,
        }
    }

    /// Refers to an element outside every form.
    #[must_use]
    pub const fn loose(index: usize) -> Self {
        Self { form: None, index }
    }
}

/// A rendered page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Forms in document order.
    #[serde(default)]
    pub forms: Vec<Form>,
    /// Elements that are not inside any form.
    #[serde(default)]
    pub loose: Vec<Element>,
    /// `<label for>` table.
    #[serde(default)]
    pub labels: Vec<Label>,
    /// Ids of static non-form nodes present on the page.
    #[serde(default)]
    pub containers: Vec<String>,
    #[serde(skip)]
    focused: Option<ElementRef>,
}

impl Document {
    /// Creates an empty page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a form.
    #[must_use]
    pub fn form(mut self, form: Form) -> Self {
        self.forms.push(form);
        self
    }

    /// Appends an element outside every form.
    #[must_use]
    pub fn loose_element(mut self, element: Element) -> Self {
        self.loose.push(element);
        self
    }

    /// Adds a label for an element id.
    #[must_use]
    pub fn label(mut self, for_id: impl Into<String>, text: impl Into<String>) -> Self {
        self.labels.push(Label {
            for_id: for_id.into(),
            text: text.into(),
        });
        self
    }

    /// Adds a static container node.
    #[must_use]
    pub fn container(mut self, id: impl Into<String>) -> Self {
        self.containers.push(id.into());
        self
    }

    /// Parses a page fixture from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a page.
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Returns the index of the form with the given id.
    pub fn form_by_id(&self, id: &str) -> Option<usize> {
        self.forms.iter().position(|f| f.id.as_deref() == Some(id))
    }

    /// Returns the form at `index`.
    pub fn form_at(&self, index: usize) -> Option<&Form> {
        self.forms.get(index)
    }

    /// Returns the form at `index` mutably.
    pub fn form_at_mut(&mut self, index: usize) -> Option<&mut Form> {
        self.forms.get_mut(index)
    }

    /// Resolves an element reference.
    pub fn element(&self, at: ElementRef) -> Option<&Element> {
        match at.form {
            Some(form) => self.forms.get(form)?.get(at.index),
            None => self.loose.get(at.index),
        }
    }

    /// Resolves an element reference mutably.
    pub fn element_mut(&mut self, at: ElementRef) -> Option<&mut Element> {
        match at.form {
            Some(form) => self.forms.get_mut(form)?.get_mut(at.index),
            None => self.loose.get_mut(at.index),
        }
    }

    /// Finds an element anywhere on the page by id.
    pub fn find_by_id(&self, id: &str) -> Option<ElementRef> {
        self.forms
            .iter()
            .enumerate()
            .find_map(|(f, form)| form.find_by_id(id).map(|i| ElementRef::in_form(f, i)))
            .or_else(|| {
                self.loose
                    .iter()
                    .position(|el| el.id.as_deref() == Some(id))
                    .map(ElementRef::loose)
            })
    }

    /// Returns the form that contains the element, if any.
    pub fn closest_form(&self, at: ElementRef) -> Option<usize> {
        at.form.filter(|f| *f < self.forms.len())
    }

    /// Returns the text of the label attached to an element id.
    pub fn label_for(&self, id: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.for_id == id)
            .map(|l| l.text.as_str())
    }

    /// Returns whether any node on the page carries the id.
    pub fn contains_id(&self, id: &str) -> bool {
        self.containers.iter().any(|c| c == id)
            || self.forms.iter().any(|f| f.id.as_deref() == Some(id))
            || self.find_by_id(id).is_some()
    }

    /// Moves keyboard focus to an element.
    pub fn focus(&mut self, at: ElementRef) {
        if self.element(at).is_some() {
            self.focused = Some(at);
        }
    }

    /// Returns the focused element.
    pub const fn focused(&self) -> Option<ElementRef> {
        self.focused
    }

    /// Returns the human-readable name of a field: its label (without the
    /// required marker), else its placeholder, else its name or id.
    pub fn display_name(&self, at: ElementRef) -> String {
        let Some(element) = self.element(at) else {
            return DEFAULT_FIELD_NAME.to_string();
        };

        if let Some(label) = element.id.as_deref().and_then(|id| self.label_for(id)) {
            return label.replacen('*', "", 1).trim().to_string();
        }

        if let Some(placeholder) = element.placeholder_text().filter(|p| !p.is_empty()) {
            return placeholder.to_string();
        }

        match element.key() {
            "" => DEFAULT_FIELD_NAME.to_string(),
            key => key.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::new()
            .form(
                Form::new("announce")
                    .element(Element::input("name").id("customer_name").required())
                    .element(Element::input("phone").kind("tel"))
                    .element(Element::button("Enviar")),
            )
            .loose_element(Element::input("search").id("global_search"))
            .label("customer_name", "Nombre *")
            .container("validation-override-container")
    }

    #[test]
    fn test_fields_skip_buttons() {
        let doc = sample();
        let keys: Vec<_> = doc.forms[0].fields().map(|(_, el)| el.key()).collect();
        assert_eq!(keys, vec!["name", "phone"]);
    }

    #[test]
    fn test_input_type_defaults() {
        assert_eq!(Element::input("a").input_type(), "text");
        assert_eq!(Element::input("a").kind("EMAIL").input_type(), "email");
        assert_eq!(Element::button("Ok").input_type(), "submit");
        assert_eq!(Element::select("s").input_type(), "select-one");
    }

    #[test]
    fn test_key_prefers_name() {
        assert_eq!(Element::input("n").id("i").key(), "n");
        assert_eq!(Element::new(Tag::Input).id("i").key(), "i");
        assert_eq!(Element::new(Tag::Input).name("").id("i").key(), "i");
        assert_eq!(Element::new(Tag::Input).key(), "");
    }

    #[test]
    fn test_submit_controls() {
        assert!(Element::button("Enviar").is_submit_control());
        assert!(Element::input("go").kind("submit").is_submit_control());
        assert!(!Element::input("go").kind("text").is_submit_control());
    }

    #[test]
    fn test_find_by_id() {
        let doc = sample();
        assert_eq!(
            doc.find_by_id("customer_name"),
            Some(ElementRef::in_form(0, 0))
        );
        assert_eq!(doc.find_by_id("global_search"), Some(ElementRef::loose(0)));
        assert_eq!(doc.find_by_id("missing"), None);
        assert_eq!(doc.closest_form(ElementRef::loose(0)), None);
    }

    #[test]
    fn test_display_name_fallbacks() {
        let doc = sample();
        assert_eq!(doc.display_name(ElementRef::in_form(0, 0)), "Nombre");
        assert_eq!(doc.display_name(ElementRef::in_form(0, 1)), "phone");

        let doc = Document::new().form(
            Form::new("f")
                .element(Element::input("x").placeholder("Su correo"))
                .element(Element::new(Tag::Input)),
        );
        assert_eq!(doc.display_name(ElementRef::in_form(0, 0)), "Su correo");
        assert_eq!(doc.display_name(ElementRef::in_form(0, 1)), DEFAULT_FIELD_NAME);
    }

    #[test]
    fn test_class_helpers() {
        let mut attrs = Attributes::new().with("class", "form-control");
        attrs.add_class("border-red-500");
        attrs.add_class("border-red-500");
        assert_eq!(attrs.get("class"), Some("form-control border-red-500"));
        attrs.remove_class("form-control");
        assert_eq!(attrs.get("class"), Some("border-red-500"));
    }

    #[test]
    fn test_fixture_from_json() {
        let doc = Document::from_json_str(
            r#"{
                "forms": [{
                    "id": "login",
                    "attrs": {"data-validation": "true"},
                    "elements": [
                        {"tag": "input", "name": "username", "attrs": {"required": ""}},
                        {"tag": "button", "value": "Entrar"},
                        {"tag": "span"}
                    ]
                }],
                "labels": [{"for": "username", "text": "Usuario"}]
            }"#,
        )
        .unwrap();
        assert_eq!(doc.form_by_id("login"), Some(0));
        assert_eq!(doc.forms[0].data("validation"), Some("true"));
        assert_eq!(doc.forms[0].data("validate-on-change"), None);
        assert!(doc.forms[0].elements[0].is_required());
        assert_eq!(doc.forms[0].elements[2].tag, Tag::Other);
        assert!(doc.contains_id("login"));
    }
}
