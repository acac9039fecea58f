//! Page-level interception of form submission.
//!
//! A [`FormGuard`] blocks every native submission path of a page (submit
//! events, clicks on submit controls, Enter inside inputs), validates the
//! target form with the same extractor and evaluator as
//! [`FormValidator`](crate::validator::FormValidator), and reports the first
//! problem in a single blocking [`ValidationPanel`].
//!
//! Each guard owns its panel state, so independent pages (or tests) never
//! share it.

use std::time::{Duration, Instant};

use tracing::{debug, error};

use crate::dom::{Document, ElementRef, Tag};
use crate::evaluate::evaluate;
use crate::event::{Event, EventKind, EventTarget};
use crate::extract::extract_rules;
use crate::panel::{ValidationPanel, PANEL_CONTAINER_ID};
use crate::rules::{CustomRegistry, FieldContext};

/// Settings of a [`FormGuard`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardConfig {
    /// Id of the node the panel is rendered into.
    pub panel_container_id: String,
    /// How long the panel stays up on its own.
    pub auto_dismiss: Duration,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            panel_container_id: PANEL_CONTAINER_ID.to_string(),
            auto_dismiss: Duration::from_secs(8),
        }
    }
}

/// What the guard did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// The event is none of the guard's business.
    Ignored,
    /// The event was blocked but its target is not inside a form.
    NoForm,
    /// The event was blocked and the form is valid.
    Valid {
        /// Index of the validated form.
        form: usize,
    },
    /// The event was blocked and a field is invalid.
    Invalid {
        /// The first invalid field.
        field: ElementRef,
        /// Its first message.
        message: String,
    },
    /// An edit made the panel go away.
    Dismissed,
}

/// Blocks native submission on one page and shows the first validation error.
#[derive(Debug, Clone)]
pub struct FormGuard {
    config: GuardConfig,
    registry: CustomRegistry,
    panel: ValidationPanel,
}

impl Default for FormGuard {
    fn default() -> Self {
        Self::new(CustomRegistry::with_builtins())
    }
}

impl FormGuard {
    /// Creates a guard with the default settings.
    pub fn new(registry: CustomRegistry) -> Self {
        let config = GuardConfig::default();
        Self {
            panel: ValidationPanel::new(config.auto_dismiss),
            config,
            registry,
        }
    }

    /// Replaces the settings. Hides the panel.
    #[must_use]
    pub fn with_config(mut self, config: GuardConfig) -> Self {
        self.panel = ValidationPanel::new(config.auto_dismiss);
        self.config = config;
        self
    }

    /// Returns the settings.
    #[must_use]
    pub const fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Returns the panel.
    #[must_use]
    pub const fn panel(&self) -> &ValidationPanel {
        &self.panel
    }

    /// Handles a page event.
    ///
    /// Submission paths are blocked before anything else happens, whatever
    /// the validation result.
    pub fn intercept(
        &mut self,
        doc: &mut Document,
        event: &mut Event,
        now: Instant,
    ) -> GuardOutcome {
        let kind = event.kind.clone();

        match (kind, event.target) {
            (EventKind::Submit, EventTarget::Form(form)) => {
                debug!(form, "submit intercepted");
                block(event);
                self.check_form(doc, form, now)
            }
            (EventKind::Click, EventTarget::Element(at))
                if doc.element(at).is_some_and(|el| el.is_submit_control()) =>
            {
                debug!(?at, "click on submit control intercepted");
                block(event);
                self.check_enclosing(doc, at, now)
            }
            (EventKind::KeyDown { key }, EventTarget::Element(at))
                if key == "Enter" && doc.element(at).is_some_and(|el| el.tag == Tag::Input) =>
            {
                debug!(?at, "enter intercepted");
                block(event);
                self.check_enclosing(doc, at, now)
            }
            (EventKind::Input, EventTarget::Element(at)) => self.on_input(doc, at),
            _ => GuardOutcome::Ignored,
        }
    }

    /// Validates the form at `form` and reports its first invalid field.
    pub fn check_form(&mut self, doc: &mut Document, form: usize, now: Instant) -> GuardOutcome {
        let Some(target) = doc.form_at(form) else {
            return GuardOutcome::NoForm;
        };

        let first = target.fields().find_map(|(index, field)| {
            let ctx = FieldContext::new(target, field);
            let value = field.value.trim();
            extract_rules(field, &self.registry)
                .iter()
                .find_map(|rule| evaluate(value, rule, &ctx).map(str::to_string))
                .map(|message| (index, message))
        });

        match first {
            None => {
                debug!(form, "form is valid");
                GuardOutcome::Valid { form }
            }
            Some((index, message)) => {
                let field = ElementRef::in_form(form, index);
                debug!(form, index, %message, "form is invalid");
                self.report(doc, field, message.clone(), now);
                doc.focus(field);
                GuardOutcome::Invalid { field, message }
            }
        }
    }

    /// Validates the form with the given id.
    pub fn check_form_by_id(
        &mut self,
        doc: &mut Document,
        form_id: &str,
        now: Instant,
    ) -> GuardOutcome {
        match doc.form_by_id(form_id) {
            Some(form) => self.check_form(doc, form, now),
            None => GuardOutcome::NoForm,
        }
    }

    /// Shows `message` for `field` in the panel. Returns whether the panel
    /// could be shown.
    pub fn report(
        &mut self,
        doc: &Document,
        field: ElementRef,
        message: impl Into<String>,
        now: Instant,
    ) -> bool {
        if !doc.contains_id(&self.config.panel_container_id) {
            error!(
                container = %self.config.panel_container_id,
                "validation panel container not found"
            );
            return false;
        }

        self.panel.show(field, doc.display_name(field), message.into(), now);
        true
    }

    /// Hides the panel. Returns whether it was visible.
    pub fn dismiss(&mut self) -> bool {
        self.panel.dismiss()
    }

    /// Applies the auto-dismiss delay. Returns whether the panel was hidden.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.panel.tick(now)
    }

    fn check_enclosing(
        &mut self,
        doc: &mut Document,
        at: ElementRef,
        now: Instant,
    ) -> GuardOutcome {
        match doc.closest_form(at) {
            Some(form) => self.check_form(doc, form, now),
            None => GuardOutcome::NoForm,
        }
    }

    fn on_input(&mut self, doc: &Document, at: ElementRef) -> GuardOutcome {
        if !self.panel.is_visible() {
            return GuardOutcome::Ignored;
        }
        let Some(ctx) = FieldContext::locate(doc, at).filter(|c| c.field.tag == Tag::Input) else {
            return GuardOutcome::Ignored;
        };

        let value = ctx.field.value.trim();
        let valid = extract_rules(ctx.field, &self.registry)
            .iter()
            .all(|rule| evaluate(value, rule, &ctx).is_none());

        if valid && self.panel.dismiss() {
            GuardOutcome::Dismissed
        } else {
            GuardOutcome::Ignored
        }
    }
}

fn block(event: &mut Event) {
    event.prevent_default();
    event.stop_propagation();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Element, Form};

    fn page() -> Document {
        Document::new()
            .form(
                Form::new("announce")
                    .element(Element::input("guide").id("guide").value("PKG123"))
                    .element(Element::input("name").id("customer_name").required())
                    .element(Element::input("email").id("email").kind("email").required())
                    .element(Element::button("Anunciar").id("submit")),
            )
            .loose_element(Element::button("Buscar").id("search"))
            .label("customer_name", "Nombre del cliente *")
            .container(PANEL_CONTAINER_ID)
    }

    #[test]
    fn test_submit_blocked_and_first_field_reported() {
        let mut doc = page();
        let mut guard = FormGuard::default();
        let mut event = Event::submit(0);

        let outcome = guard.intercept(&mut doc, &mut event, Instant::now());
        assert!(event.default_prevented());
        assert!(event.propagation_stopped());
        assert_eq!(
            outcome,
            GuardOutcome::Invalid {
                field: ElementRef::in_form(0, 1),
                message: "Este campo es requerido".into(),
            }
        );

        let content = guard.panel().content().unwrap();
        assert_eq!(content.field_label, "Nombre del cliente");
        assert_eq!(doc.focused(), Some(ElementRef::in_form(0, 1)));
    }

    #[test]
    fn test_valid_form_still_blocked() {
        let mut doc = page();
        doc.forms[0].elements[1].value = "Ana".into();
        doc.forms[0].elements[2].value = "ana@club.co".into();
        let mut guard = FormGuard::default();
        let mut event = Event::submit(0);
        assert_eq!(
            guard.intercept(&mut doc, &mut event, Instant::now()),
            GuardOutcome::Valid { form: 0 }
        );
        assert!(event.default_prevented());
        assert!(!guard.panel().is_visible());
    }

    #[test]
    fn test_click_on_submit_control() {
        let mut doc = page();
        let mut guard = FormGuard::default();
        let mut click = Event::click(ElementRef::in_form(0, 3));
        assert!(matches!(
            guard.intercept(&mut doc, &mut click, Instant::now()),
            GuardOutcome::Invalid { .. }
        ));

        let mut loose = Event::click(ElementRef::loose(0));
        assert_eq!(
            guard.intercept(&mut doc, &mut loose, Instant::now()),
            GuardOutcome::NoForm
        );
        assert!(loose.default_prevented());
    }

    #[test]
    fn test_click_on_plain_input_ignored() {
        let mut doc = page();
        let mut guard = FormGuard::default();
        let mut click = Event::click(ElementRef::in_form(0, 0));
        assert_eq!(
            guard.intercept(&mut doc, &mut click, Instant::now()),
            GuardOutcome::Ignored
        );
        assert!(!click.default_prevented());
    }

    #[test]
    fn test_enter_in_input_only() {
        let mut doc = page();
        let mut guard = FormGuard::default();

        let mut enter = Event::key_down(ElementRef::in_form(0, 0), "Enter");
        assert!(matches!(
            guard.intercept(&mut doc, &mut enter, Instant::now()),
            GuardOutcome::Invalid { .. }
        ));
        assert!(enter.default_prevented());

        let mut other = Event::key_down(ElementRef::in_form(0, 0), "a");
        assert_eq!(
            guard.intercept(&mut doc, &mut other, Instant::now()),
            GuardOutcome::Ignored
        );
        assert!(!other.default_prevented());
    }

    #[test]
    fn test_shared_rules_reach_the_guard() {
        let mut doc = Document::new()
            .form(
                Form::new("f").element(
                    Element::input("guide")
                        .id("guide")
                        .max_length(4)
                        .value("ABCDEF"),
                ),
            )
            .container(PANEL_CONTAINER_ID);
        let mut guard = FormGuard::default();
        assert_eq!(
            guard.check_form_by_id(&mut doc, "f", Instant::now()),
            GuardOutcome::Invalid {
                field: ElementRef::in_form(0, 0),
                message: "No puede tener más de 4 caracteres".into(),
            }
        );
    }

    #[test]
    fn test_missing_container() {
        let mut doc = page();
        doc.containers.clear();
        let mut guard = FormGuard::default();
        let mut event = Event::submit(0);
        let outcome = guard.intercept(&mut doc, &mut event, Instant::now());

        assert!(matches!(outcome, GuardOutcome::Invalid { .. }));
        assert!(event.default_prevented());
        assert!(!guard.panel().is_visible());
        assert_eq!(doc.focused(), Some(ElementRef::in_form(0, 1)));
    }

    #[test]
    fn test_input_dismisses_once_valid() {
        let mut doc = page();
        let mut guard = FormGuard::default();
        guard.check_form(&mut doc, 0, Instant::now());
        assert!(guard.panel().is_visible());

        let at = ElementRef::in_form(0, 2);
        let mut input = Event::input(at);
        doc.element_mut(at).unwrap().value = "ana@".into();
        assert_eq!(guard.intercept(&mut doc, &mut input, Instant::now()), GuardOutcome::Ignored);
        assert!(guard.panel().is_visible());

        doc.element_mut(at).unwrap().value = "ana@club.co".into();
        assert_eq!(guard.intercept(&mut doc, &mut input, Instant::now()), GuardOutcome::Dismissed);
        assert!(!input.default_prevented());
        assert!(!guard.panel().is_visible());
    }

    #[test]
    fn test_report_and_auto_dismiss() {
        let doc = page();
        let start = Instant::now();
        let mut guard = FormGuard::new(CustomRegistry::new()).with_config(GuardConfig {
            auto_dismiss: Duration::from_secs(2),
            ..GuardConfig::default()
        });
        assert!(guard.report(
            &doc,
            ElementRef::in_form(0, 0),
            "El número de guía ya existe",
            start
        ));
        assert_eq!(
            guard.panel().content().map(|c| c.field_label.as_str()),
            Some("guide")
        );
        assert!(!guard.tick(start + Duration::from_secs(1)));
        assert!(guard.tick(start + Duration::from_secs(2)));
        assert!(!guard.dismiss());
    }

    #[test]
    fn test_guards_are_independent() {
        let mut doc = page();
        let mut first = FormGuard::default();
        let second = FormGuard::default();
        first.check_form(&mut doc, 0, Instant::now());
        assert!(first.panel().is_visible());
        assert!(!second.panel().is_visible());
    }
}
