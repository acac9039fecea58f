//! User feedback: toast notifications and per-field error lists.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ironhtml::typed::Element;
use ironhtml_elements::{Button, Div, Li, Span, Ul};

use crate::error::FieldErrors;

/// Id of the toast container node.
pub const TOAST_CONTAINER_ID: &str = "toast-container";

/// Severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToastKind {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Error,
    /// Neutral information.
    Info,
    /// Something needs attention.
    Warning,
}

impl ToastKind {
    /// How long a toast of this kind stays on screen.
    #[must_use]
    pub const fn default_duration(self) -> Duration {
        match self {
            Self::Error => Duration::from_millis(7000),
            Self::Success | Self::Info | Self::Warning => Duration::from_millis(5000),
        }
    }

    /// CSS modifier of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
            Self::Warning => "warning",
        }
    }
}

/// Something that can show feedback to the user.
pub trait Feedback {
    /// Shows a transient notification.
    fn notify(&mut self, kind: ToastKind, message: &str);

    /// Shows the errors of a failed validation pass next to their fields.
    fn show_field_errors(&mut self, errors: &FieldErrors);

    /// Removes any field errors currently shown.
    fn clear_field_errors(&mut self) {}
}

/// A notification on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Severity.
    pub kind: ToastKind,
    /// Text shown to the user.
    pub message: String,
    /// When it appeared.
    pub shown_at: Instant,
    /// How long it stays.
    pub duration: Duration,
}

impl Toast {
    /// Returns whether the toast should be gone at `now`.
    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= self.duration
    }
}

/// A bounded stack of toasts plus the field errors last shown.
#[derive(Debug, Clone)]
pub struct ToastStack {
    toasts: VecDeque<Toast>,
    max_toasts: usize,
    field_errors: FieldErrors,
}

impl Default for ToastStack {
    fn default() -> Self {
        Self::new(5)
    }
}

impl ToastStack {
    /// Creates a stack holding at most `max_toasts` toasts.
    #[must_use]
    pub fn new(max_toasts: usize) -> Self {
        Self {
            toasts: VecDeque::new(),
            max_toasts: max_toasts.max(1),
            field_errors: FieldErrors::new(),
        }
    }

    /// Pushes a toast that appeared at `now`, dropping the oldest when full.
    pub fn push_at(&mut self, kind: ToastKind, message: &str, now: Instant) {
        while self.toasts.len() >= self.max_toasts {
            self.toasts.pop_front();
        }
        self.toasts.push_back(Toast {
            kind,
            message: message.to_string(),
            shown_at: now,
            duration: kind.default_duration(),
        });
    }

    /// Removes toasts that have expired at `now`.
    pub fn expire(&mut self, now: Instant) {
        self.toasts.retain(|t| !t.is_expired(now));
    }

    /// Closes the toast at `index`.
    pub fn close(&mut self, index: usize) -> Option<Toast> {
        self.toasts.remove(index)
    }

    /// Returns the toasts on screen, oldest first.
    pub fn toasts(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    /// Returns the number of toasts on screen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    /// Returns whether no toast is on screen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    /// Returns the field errors currently shown.
    #[must_use]
    pub const fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    /// Renders the toast container.
    #[must_use]
    pub fn render(&self) -> String {
        let mut container = Element::<Div>::new()
            .id(TOAST_CONTAINER_ID)
            .class("toast-container");

        for toast in &self.toasts {
            let class = format!("toast toast-{}", toast.kind.as_str());
            container = container.child::<Div, _>(|d| {
                d.class(&class).child::<Div, _>(|content| {
                    content
                        .class("toast-content")
                        .child::<Span, _>(|s| s.class("toast-message").text(&toast.message))
                        .child::<Button, _>(|b| {
                            b.attr("type", "button").class("toast-close").text("×")
                        })
                })
            });
        }

        container.render()
    }
}

impl Feedback for ToastStack {
    fn notify(&mut self, kind: ToastKind, message: &str) {
        self.push_at(kind, message, Instant::now());
    }

    fn show_field_errors(&mut self, errors: &FieldErrors) {
        self.field_errors = errors.clone();
    }

    fn clear_field_errors(&mut self) {
        self.field_errors.clear();
    }
}

/// Renders the error list shown under one field.
#[must_use]
pub fn render_field_errors(field: &str, messages: &[String]) -> String {
    Element::<Div>::new()
        .class("invalid-feedback d-block")
        .attr("data-field", field)
        .child::<Ul, _>(|ul| {
            ul.class("mb-0")
                .children(messages, |message, li: Element<Li>| li.text(message))
        })
        .render()
}

/// Renders a summary of every field error.
#[must_use]
pub fn render_error_summary(errors: &FieldErrors) -> String {
    let mut summary = Element::<Div>::new()
        .class("alert alert-danger")
        .attr("role", "alert");
    for (field, messages) in errors.iter() {
        summary = summary.raw(render_field_errors(field, messages));
    }
    summary.render()
}
