//! Page events seen by the validator and the form guard.

use crate::dom::ElementRef;

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A form is being submitted.
    Submit,
    /// An element was clicked.
    Click,
    /// A key went down while an element had focus.
    KeyDown {
        /// Key name (`"Enter"`, `"a"`, ...).
        key: String,
    },
    /// The value of an element changed.
    Input,
    /// An element lost focus.
    Blur,
}

/// Where it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTarget {
    /// A form, by index.
    Form(usize),
    /// An element.
    Element(ElementRef),
}

/// A dispatched event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Event kind.
    pub kind: EventKind,
    /// Event target.
    pub target: EventTarget,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl Event {
    /// Creates an event.
    #[must_use]
    pub const fn new(kind: EventKind, target: EventTarget) -> Self {
        Self {
            kind,
            target,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    /// A submit event on a form.
    #[must_use]
    pub const fn submit(form: usize) -> Self {
        Self::new(EventKind::Submit, EventTarget::Form(form))
    }

    /// A click on an element.
    #[must_use]
    pub const fn click(element: ElementRef) -> Self {
        Self::new(EventKind::Click, EventTarget::Element(element))
    }

    /// A key press on an element.
    #[must_use]
    pub fn key_down(element: ElementRef, key: impl Into<String>) -> Self {
        Self::new(
            EventKind::KeyDown { key: key.into() },
            EventTarget::Element(element),
        )
    }

    /// A value change on an element.
    #[must_use]
    pub const fn input(element: ElementRef) -> Self {
        Self::new(EventKind::Input, EventTarget::Element(element))
    }

    /// Focus leaving an element.
    #[must_use]
    pub const fn blur(element: ElementRef) -> Self {
        Self::new(EventKind::Blur, EventTarget::Element(element))
    }

    /// Blocks the default action.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Stops the event from reaching other listeners.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Returns whether the default action was blocked.
    #[must_use]
    pub const fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Returns whether propagation was stopped.
    #[must_use]
    pub const fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    /// Returns the targeted element, if the target is an element.
    #[must_use]
    pub const fn element(&self) -> Option<ElementRef> {
        match self.target {
            EventTarget::Element(at) => Some(at),
            EventTarget::Form(_) => None,
        }
    }
}
