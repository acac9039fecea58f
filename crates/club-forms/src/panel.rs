//! The blocking validation panel shown by the form guard.

use std::time::{Duration, Instant};

use ironhtml::typed::Element;
use ironhtml_elements::{Button, Div, P, Span, Strong};

use crate::dom::ElementRef;

/// Id of the panel container node.
pub const PANEL_CONTAINER_ID: &str = "validation-override-container";
/// Title shown on the panel.
pub const PANEL_TITLE: &str = "Error de Validación";

/// What the panel currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelContent {
    /// Panel title.
    pub title: String,
    /// The validation message.
    pub message: String,
    /// Display name of the offending field.
    pub field_label: String,
    /// The offending field.
    pub field: ElementRef,
    /// When the panel appeared.
    pub shown_at: Instant,
}

/// A single shared error panel.
#[derive(Debug, Clone)]
pub struct ValidationPanel {
    content: Option<PanelContent>,
    auto_dismiss: Duration,
}

impl ValidationPanel {
    /// Creates a hidden panel that closes itself after `auto_dismiss`.
    #[must_use]
    pub const fn new(auto_dismiss: Duration) -> Self {
        Self {
            content: None,
            auto_dismiss,
        }
    }

    /// Shows the panel, replacing whatever it showed before.
    pub fn show(&mut self, field: ElementRef, field_label: String, message: String, now: Instant) {
        self.content = Some(PanelContent {
            title: PANEL_TITLE.to_string(),
            message,
            field_label,
            field,
            shown_at: now,
        });
    }

    /// Hides the panel. Returns whether it was visible.
    pub fn dismiss(&mut self) -> bool {
        self.content.take().is_some()
    }

    /// Hides the panel once its auto-dismiss delay has elapsed at `now`.
    /// Returns whether it was hidden by this call.
    pub fn tick(&mut self, now: Instant) -> bool {
        let expired = self
            .content
            .as_ref()
            .is_some_and(|c| now.saturating_duration_since(c.shown_at) >= self.auto_dismiss);
        if expired {
            self.content = None;
        }
        expired
    }

    /// Returns whether the panel is visible.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.content.is_some()
    }

    /// Returns what the panel shows.
    #[must_use]
    pub const fn content(&self) -> Option<&PanelContent> {
        self.content.as_ref()
    }

    /// Renders the panel. A hidden panel renders with `display: none`.
    #[must_use]
    pub fn render(&self) -> String {
        let (style, title, message, label) = match &self.content {
            Some(c) => (
                "display: block",
                c.title.as_str(),
                c.message.as_str(),
                c.field_label.as_str(),
            ),
            None => ("display: none", "", "", ""),
        };

        Element::<Div>::new()
            .id(PANEL_CONTAINER_ID)
            .class("validation-override")
            .attr("role", "alertdialog")
            .attr("style", style)
            .child::<Strong, _>(|s| s.id("validation-override-title").text(title))
            .child::<P, _>(|p| p.id("validation-override-message").text(message))
            .child::<Span, _>(|s| s.id("field-name-override").text(label))
            .child::<Button, _>(|b| {
                b.attr("type", "button")
                    .id("validation-override-close-btn")
                    .text("×")
            })
            .render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_and_dismiss() {
        let mut panel = ValidationPanel::new(Duration::from_secs(8));
        assert!(!panel.is_visible());
        panel.show(
            ElementRef::in_form(0, 1),
            "Email".into(),
            "El email no es válido".into(),
            Instant::now(),
        );
        assert!(panel.is_visible());
        assert_eq!(panel.content().map(|c| c.title.as_str()), Some(PANEL_TITLE));
        assert!(panel.dismiss());
        assert!(!panel.dismiss());
    }

    #[test]
    fn test_auto_dismiss() {
        let start = Instant::now();
        let mut panel = ValidationPanel::new(Duration::from_secs(8));
        panel.show(ElementRef::in_form(0, 0), "Nombre".into(), "x".into(), start);
        assert!(!panel.tick(start + Duration::from_secs(7)));
        assert!(panel.is_visible());
        assert!(panel.tick(start + Duration::from_secs(8)));
        assert!(!panel.is_visible());
    }

    #[test]
    fn test_render() {
        let mut panel = ValidationPanel::new(Duration::from_secs(8));
        assert!(panel.render().contains("display: none"));
        panel.show(
            ElementRef::in_form(0, 0),
            "Nombre".into(),
            "Este campo es requerido".into(),
            Instant::now(),
        );
        let html = panel.render();
        assert!(html.contains("display: block"));
        assert!(html.contains("Nombre"));
        assert!(html.contains("Este campo es requerido"));
        assert!(html.contains("field-name-override"));
    }
}
