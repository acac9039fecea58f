//! Per-form validation front-end.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::dom::{Document, Form};
use crate::error::{FieldErrors, FormError, Result};
use crate::evaluate::evaluate_all;
use crate::event::{Event, EventKind, EventTarget};
use crate::extract::extract_rules;
use crate::feedback::{Feedback, ToastKind};
use crate::rules::{CustomRegistry, FieldContext, ValidationRule};

/// Notification shown when a submitted form passes validation.
pub const SUCCESS_MESSAGE: &str = "Formulario enviado correctamente";

/// Submitted form data, field name to value.
pub type FormData = HashMap<String, String>;

/// Callback run with the form data after a successful submit.
pub type SuccessCallback = Box<dyn FnMut(&FormData)>;

/// Callback run with the errors after a failed submit.
pub type ErrorCallback = Box<dyn FnMut(&FieldErrors)>;

/// Behaviour switches of a [`FormValidator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorOptions {
    /// Show per-field errors after a failed submit.
    pub show_errors: bool,
    /// Show a notification after a successful submit.
    pub show_success: bool,
    /// Validate when the form is submitted.
    pub validate_on_submit: bool,
    /// Re-validate a field when it loses focus.
    pub validate_on_change: bool,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            show_errors: true,
            show_success: true,
            validate_on_submit: true,
            validate_on_change: false,
        }
    }
}

/// Outcome of a validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    errors: FieldErrors,
}

impl ValidationResult {
    /// Returns whether no field reported an error.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the per-field errors.
    #[must_use]
    pub const fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Consumes the result, returning the per-field errors.
    #[must_use]
    pub fn into_errors(self) -> FieldErrors {
        self.errors
    }
}

/// Validates one form of a page.
pub struct FormValidator {
    form_id: String,
    options: ValidatorOptions,
    registry: CustomRegistry,
    errors: FieldErrors,
    on_success: Option<SuccessCallback>,
    on_error: Option<ErrorCallback>,
}

impl std::fmt::Debug for FormValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormValidator")
            .field("form_id", &self.form_id)
            .field("options", &self.options)
            .field("registry", &self.registry)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

impl FormValidator {
    /// Creates a validator for the form with the given id, using the
    /// built-in custom rules.
    pub fn new(form_id: impl Into<String>) -> Self {
        Self {
            form_id: form_id.into(),
            options: ValidatorOptions::default(),
            registry: CustomRegistry::with_builtins(),
            errors: FieldErrors::new(),
            on_success: None,
            on_error: None,
        }
    }

    /// Creates a validator for every form flagged `data-validation="true"`.
    ///
    /// Blur re-validation follows `data-validate-on-change="true"`. Flagged
    /// forms without an id are skipped.
    pub fn attach_all(doc: &Document, registry: &CustomRegistry) -> Vec<Self> {
        doc.forms
            .iter()
            .filter(|form| form.data("validation") == Some("true"))
            .filter_map(|form| {
                let Some(id) = form.id.as_deref() else {
                    warn!("form flagged for validation has no id");
                    return None;
                };
                let options = ValidatorOptions {
                    validate_on_change: form.data("validate-on-change") == Some("true"),
                    ..ValidatorOptions::default()
                };
                debug!(form = %id, on_change = options.validate_on_change, "validator attached");
                Some(Self::new(id).options(options).registry(registry.clone()))
            })
            .collect()
    }

    /// Sets the options.
    #[must_use]
    pub const fn options(mut self, options: ValidatorOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the custom rule registry.
    #[must_use]
    pub fn registry(mut self, registry: CustomRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Sets the success callback.
    #[must_use]
    pub fn on_success(mut self, callback: impl FnMut(&FormData) + 'static) -> Self {
        self.on_success = Some(Box::new(callback));
        self
    }

    /// Sets the error callback.
    #[must_use]
    pub fn on_error(mut self, callback: impl FnMut(&FieldErrors) + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    /// Returns the id of the validated form.
    #[must_use]
    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    /// Returns the current options.
    #[must_use]
    pub const fn current_options(&self) -> &ValidatorOptions {
        &self.options
    }

    /// Returns the errors recorded so far.
    #[must_use]
    pub const fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Validates every field of `form` in document order.
    ///
    /// Starts from an empty mapping, so repeated passes over unchanged values
    /// yield identical results.
    pub fn validate(&mut self, form: &Form) -> ValidationResult {
        self.errors.clear();
        for (index, _) in form.fields() {
            self.validate_field(form, index);
        }
        ValidationResult {
            errors: self.errors.clone(),
        }
    }

    /// Finds this validator's form on the page and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::FormNotFound`] if the page has no such form.
    pub fn validate_in(&mut self, doc: &Document) -> Result<ValidationResult> {
        let index = doc
            .form_by_id(&self.form_id)
            .ok_or_else(|| FormError::FormNotFound(self.form_id.clone()))?;
        Ok(self.validate(&doc.forms[index]))
    }

    /// Validates one field, replacing only that field's recorded errors.
    pub fn validate_field(&mut self, form: &Form, index: usize) -> Vec<String> {
        let Some(field) = form.get(index) else {
            return Vec::new();
        };

        let rules = extract_rules(field, &self.registry);
        let messages = evaluate_all(field.value.trim(), &rules, &FieldContext::new(form, field));
        self.errors.replace(field.key(), messages.clone());
        messages
    }

    /// Handles a submit of this validator's form.
    ///
    /// The native submission is always blocked. Returns whether the form is
    /// valid.
    pub fn handle_submit(
        &mut self,
        doc: &Document,
        event: &mut Event,
        feedback: &mut dyn Feedback,
    ) -> bool {
        event.prevent_default();

        let Some(index) = doc.form_by_id(&self.form_id) else {
            warn!(form = %self.form_id, "submit for a form that is not on the page");
            return false;
        };
        let form = &doc.forms[index];

        feedback.clear_field_errors();
        let result = self.validate(form);

        if result.is_valid() {
            debug!(form = %self.form_id, "form is valid");
            if self.options.show_success {
                feedback.notify(ToastKind::Success, SUCCESS_MESSAGE);
            }
            if let Some(callback) = self.on_success.as_mut() {
                callback(&form_data(form));
            }
            true
        } else {
            debug!(form = %self.form_id, fields = self.errors.len(), "form is invalid");
            if self.options.show_errors {
                feedback.show_field_errors(&self.errors);
            }
            if let Some(callback) = self.on_error.as_mut() {
                callback(&self.errors);
            }
            false
        }
    }

    /// Routes a page event according to the options.
    ///
    /// Returns `None` for events this validator does not handle, otherwise
    /// whether the form (on submit) or the field (on blur) is valid.
    pub fn handle_event(
        &mut self,
        doc: &Document,
        event: &mut Event,
        feedback: &mut dyn Feedback,
    ) -> Option<bool> {
        let form_index = doc.form_by_id(&self.form_id)?;
        let kind = event.kind.clone();

        match (kind, event.target) {
            (EventKind::Submit, EventTarget::Form(f))
                if f == form_index && self.options.validate_on_submit =>
            {
                Some(self.handle_submit(doc, event, feedback))
            }
            (EventKind::Blur, EventTarget::Element(at))
                if at.form == Some(form_index) && self.options.validate_on_change =>
            {
                let form = &doc.forms[form_index];
                let is_field = form.get(at.index).is_some_and(|el| el.tag.is_field());
                is_field.then(|| self.validate_field(form, at.index).is_empty())
            }
            _ => None,
        }
    }

    /// Records an error for a field from outside the rule engine.
    pub fn set_field_error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.add(field, message);
    }

    /// Forgets a field's errors.
    pub fn clear_field_error(&mut self, field: &str) {
        self.errors.remove(field);
    }

    /// Forgets every recorded error.
    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }
}

/// Collects the submittable values of a form.
///
/// Unnamed, disabled, unchecked checkbox/radio and button-like controls are
/// left out.
pub fn form_data(form: &Form) -> FormData {
    form.fields()
        .filter(|(_, el)| !el.is_disabled())
        .filter(|(_, el)| {
            match el.input_type().as_str() {
                "submit" | "button" | "reset" | "image" => false,
                "checkbox" | "radio" => el.is_checked(),
                _ => true,
            }
        })
        .filter_map(|(_, el)| {
            el.name
                .as_deref()
                .filter(|n| !n.is_empty())
                .map(|name| (name.to_string(), el.value.clone()))
        })
        .collect()
}

/// Validates the form with the given id. A missing form is reported invalid.
pub fn validate_form(doc: &Document, form_id: &str, registry: &CustomRegistry) -> bool {
    match FormValidator::new(form_id)
        .registry(registry.clone())
        .validate_in(doc)
    {
        Ok(result) => result.is_valid(),
        Err(error) => {
            warn!(%error, "cannot validate form");
            false
        }
    }
}

/// Applies `rules` to the field with the given id and returns its messages.
/// An unknown field yields no messages.
pub fn validate_field(doc: &Document, field_id: &str, rules: &[ValidationRule]) -> Vec<String> {
    let Some(at) = doc.find_by_id(field_id) else {
        return Vec::new();
    };
    let Some(ctx) = FieldContext::locate(doc, at) else {
        return Vec::new();
    };
    evaluate_all(ctx.field.value.trim(), rules, &ctx)
}
