//! # club-forms
//!
//! Form validation for the PAQUETES EL CLUB pages.
//!
//! This crate provides:
//! - A page model (forms, fields, labels) and the events dispatched on it
//! - A rule extractor and evaluator shared by every front-end
//! - A per-form [`FormValidator`] with submit and blur handling
//! - A page-level [`FormGuard`] that blocks native submission and shows the
//!   first error in a [`ValidationPanel`]
//! - Toast notifications and phone number utilities
//!
//! ## Quick Start
//!
//! ```rust
//! use club_forms::dom::{Document, Element, Form};
//! use club_forms::FormValidator;
//!
//! let doc = Document::new().form(
//!     Form::new("register")
//!         .element(Element::input("name").required().min_length(6).value("ab"))
//!         .element(Element::input("email").kind("email").value("a@b")),
//! );
//!
//! let result = FormValidator::new("register").validate_in(&doc).unwrap();
//! assert!(!result.is_valid());
//! assert_eq!(
//!     result.errors().get("name").unwrap(),
//!     ["Debe tener al menos 6 caracteres"]
//! );
//! assert_eq!(result.errors().get("email").unwrap(), ["El email no es válido"]);
//! ```
//!
//! ## Serialized rules
//!
//! Fields may carry extra rules in a `data-validation-rules` attribute:
//!
//! ```rust
//! use club_forms::dom::{Document, Element, Form};
//! use club_forms::validate_form;
//! use club_forms::rules::CustomRegistry;
//!
//! let doc = Document::new().form(
//!     Form::new("register")
//!         .element(Element::input("password").id("password").value("x1"))
//!         .element(
//!             Element::input("confirm")
//!                 .value("x2")
//!                 .rules(r#"[{"type": "custom", "value": "matchFields:password"}]"#),
//!         ),
//! );
//! assert!(!validate_form(&doc, "register", &CustomRegistry::with_builtins()));
//! ```
//!
//! ## Guard
//!
//! ```rust
//! use std::time::Instant;
//!
//! use club_forms::dom::{Document, Element, Form};
//! use club_forms::event::Event;
//! use club_forms::panel::PANEL_CONTAINER_ID;
//! use club_forms::{FormGuard, GuardOutcome};
//!
//! let mut doc = Document::new()
//!     .form(Form::new("announce").element(Element::input("guide").id("guide").required()))
//!     .label("guide", "Número de guía *")
//!     .container(PANEL_CONTAINER_ID);
//!
//! let mut guard = FormGuard::default();
//! let mut submit = Event::submit(0);
//! let outcome = guard.intercept(&mut doc, &mut submit, Instant::now());
//!
//! assert!(submit.default_prevented());
//! assert!(matches!(outcome, GuardOutcome::Invalid { .. }));
//! assert_eq!(guard.panel().content().unwrap().field_label, "Número de guía");
//! ```

pub mod custom;
pub mod dom;
mod error;
pub mod evaluate;
pub mod event;
pub mod extract;
pub mod feedback;
pub mod guard;
pub mod panel;
pub mod phone;
pub mod rules;
pub mod validator;

pub use error::{FieldErrors, FormError, Result};
pub use feedback::{Feedback, ToastKind, ToastStack};
pub use guard::{FormGuard, GuardConfig, GuardOutcome};
pub use panel::ValidationPanel;
pub use rules::{CustomRegistry, RuleKind, ValidationRule};
pub use validator::{
    form_data, validate_field, validate_form, FormData, FormValidator, ValidationResult,
    ValidatorOptions,
};
