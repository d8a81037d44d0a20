//! The view document and its typed bindings.
//!
//! [`Document`] is the in-memory element tree every renderer draws from:
//! a flat registry of elements keyed by their stable identifiers.
//! Components never look elements up by string; they go through
//! [`ViewBindings`], built once at startup, whose named accessors resolve
//! the variant-specific identifier and centralize missing-element handling
//! (warn and no-op).

use crate::config::UiVariant;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Logical elements the front-end binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementId {
    Callsign,
    Grid,
    WinlinkPasswd,
    ModeDisplay,
    RadioDisplay,
    ConsoleOutput,
    ConsoleContainer,
    ConfigDialog,
}

impl ElementId {
    pub const ALL: [Self; 8] = [
        Self::Callsign,
        Self::Grid,
        Self::WinlinkPasswd,
        Self::ModeDisplay,
        Self::RadioDisplay,
        Self::ConsoleOutput,
        Self::ConsoleContainer,
        Self::ConfigDialog,
    ];

    /// Stable element identifier for `variant`.
    #[must_use]
    pub fn dom_id(self, variant: UiVariant) -> &'static str {
        match (self, variant) {
            (Self::Callsign, UiVariant::Inline) => "callsign",
            (Self::Callsign, UiVariant::Dialog) => "dialog-callsign",
            (Self::Grid, UiVariant::Inline) => "grid",
            (Self::Grid, UiVariant::Dialog) => "dialog-grid",
            (Self::WinlinkPasswd, UiVariant::Inline) => "winlinkPasswd",
            (Self::WinlinkPasswd, UiVariant::Dialog) => "dialog-winlinkPasswd",
            (Self::ModeDisplay, _) => "mode-display",
            (Self::RadioDisplay, _) => "radio-display",
            (Self::ConsoleOutput, _) => "console-output",
            (Self::ConsoleContainer, _) => "console-container",
            (Self::ConfigDialog, _) => "user-config-dialog",
        }
    }

    /// Whether the standard markup for `variant` contains this element.
    #[must_use]
    pub fn present_in(self, variant: UiVariant) -> bool {
        !matches!((self, variant), (Self::ConfigDialog, UiVariant::Inline))
    }
}

/// One element of the view document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Text content or input value.
    pub value: String,
    pub visible: bool,
    /// First visible line of a scrollable element.
    pub scroll_top: usize,
    /// Visible line count of a scrollable element.
    pub rows: usize,
}

impl Default for Element {
    fn default() -> Self {
        Self {
            value: String::new(),
            visible: true,
            scroll_top: 0,
            rows: 1,
        }
    }
}

impl Element {
    #[must_use]
    pub fn scrollable(rows: usize) -> Self {
        Self {
            rows: rows.max(1),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn hidden() -> Self {
        Self {
            visible: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.value.lines().count()
    }

    /// Largest valid `scroll_top`.
    #[must_use]
    pub fn max_scroll(&self) -> usize {
        self.line_count().saturating_sub(self.rows)
    }
}

/// Flat element registry keyed by element identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    elements: BTreeMap<String, Element>,
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard markup for `variant`.
    #[must_use]
    pub fn for_variant(variant: UiVariant, console_rows: usize, console_visible: bool) -> Self {
        let mut doc = Self::new();
        for id in ElementId::ALL {
            if !id.present_in(variant) {
                continue;
            }
            let element = match id {
                ElementId::ConsoleOutput => Element::scrollable(console_rows),
                ElementId::ConsoleContainer => Element {
                    visible: console_visible,
                    ..Element::default()
                },
                ElementId::ConfigDialog => Element::hidden(),
                _ => Element::default(),
            };
            doc.insert(id.dom_id(variant), element);
        }
        doc
    }

    pub fn insert(&mut self, id: impl Into<String>, element: Element) {
        self.elements.insert(id.into(), element);
    }

    pub fn remove(&mut self, id: &str) -> Option<Element> {
        self.elements.remove(id)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements.get_mut(id)
    }
}

/// Shared handle to the live document.
pub type SharedDocument = Arc<Mutex<Document>>;

/// Typed access to the view, resolved for one variant.
#[derive(Clone)]
pub struct ViewBindings {
    document: SharedDocument,
    variant: UiVariant,
}

impl ViewBindings {
    /// Bind to `document`, warning once about any expected element that is
    /// missing. Operations on missing elements later no-op.
    #[must_use]
    pub fn bind(document: SharedDocument, variant: UiVariant) -> Self {
        let view = Self { document, variant };
        if let Ok(doc) = view.document.lock() {
            for id in ElementId::ALL {
                let dom_id = id.dom_id(variant);
                if id.present_in(variant) && doc.get(dom_id).is_none() {
                    tracing::warn!(element = dom_id, "expected view element is missing");
                }
            }
        }
        view
    }

    #[must_use]
    pub fn variant(&self) -> UiVariant {
        self.variant
    }

    #[must_use]
    pub fn document(&self) -> &SharedDocument {
        &self.document
    }

    /// Copy of the current document, for rendering.
    #[must_use]
    pub fn snapshot(&self) -> Document {
        self.document
            .lock()
            .map(|doc| doc.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn element(&self, id: ElementId) -> Binding<'_> {
        Binding { view: self, id }
    }

    #[must_use]
    pub fn callsign(&self) -> Binding<'_> {
        self.element(ElementId::Callsign)
    }

    #[must_use]
    pub fn grid(&self) -> Binding<'_> {
        self.element(ElementId::Grid)
    }

    #[must_use]
    pub fn winlink_passwd(&self) -> Binding<'_> {
        self.element(ElementId::WinlinkPasswd)
    }

    #[must_use]
    pub fn mode_display(&self) -> Binding<'_> {
        self.element(ElementId::ModeDisplay)
    }

    #[must_use]
    pub fn radio_display(&self) -> Binding<'_> {
        self.element(ElementId::RadioDisplay)
    }

    #[must_use]
    pub fn console_output(&self) -> Binding<'_> {
        self.element(ElementId::ConsoleOutput)
    }

    #[must_use]
    pub fn console_container(&self) -> Binding<'_> {
        self.element(ElementId::ConsoleContainer)
    }

    #[must_use]
    pub fn config_dialog(&self) -> Binding<'_> {
        self.element(ElementId::ConfigDialog)
    }

    fn with_element<R>(&self, id: ElementId, f: impl FnOnce(&mut Element) -> R) -> Option<R> {
        let dom_id = id.dom_id(self.variant);
        let Ok(mut doc) = self.document.lock() else {
            tracing::error!(element = dom_id, "view document lock poisoned");
            return None;
        };
        match doc.get_mut(dom_id) {
            Some(element) => Some(f(element)),
            None => {
                tracing::warn!(element = dom_id, "view element missing; skipping update");
                None
            }
        }
    }
}

/// A resolved accessor for one element.
pub struct Binding<'a> {
    view: &'a ViewBindings,
    id: ElementId,
}

impl Binding<'_> {
    #[must_use]
    pub fn get(&self) -> Option<String> {
        self.update(|el| el.value.clone())
    }

    /// Overwrite the value. Returns `false` if the element is missing.
    pub fn set(&self, value: &str) -> bool {
        self.update(|el| {
            value.clone_into(&mut el.value);
        })
        .is_some()
    }

    #[must_use]
    pub fn visible(&self) -> Option<bool> {
        self.update(|el| el.visible)
    }

    pub fn set_visible(&self, visible: bool) -> bool {
        self.update(|el| el.visible = visible).is_some()
    }

    /// Run `f` against the element under the document lock.
    pub fn update<R>(&self, f: impl FnOnce(&mut Element) -> R) -> Option<R> {
        self.view.with_element(self.id, f)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn bound(variant: UiVariant) -> ViewBindings {
        let doc = Document::for_variant(variant, 4, true);
        ViewBindings::bind(Arc::new(Mutex::new(doc)), variant)
    }

    #[test]
    fn dialog_fields_use_prefixed_ids() {
        assert_eq!(ElementId::Callsign.dom_id(UiVariant::Dialog), "dialog-callsign");
        assert_eq!(
            ElementId::WinlinkPasswd.dom_id(UiVariant::Inline),
            "winlinkPasswd"
        );
        assert_eq!(
            ElementId::ConsoleOutput.dom_id(UiVariant::Dialog),
            ElementId::ConsoleOutput.dom_id(UiVariant::Inline)
        );
    }

    #[test]
    fn inline_markup_has_no_dialog() {
        let doc = Document::for_variant(UiVariant::Inline, 4, true);
        assert!(doc.get("user-config-dialog").is_none());
        assert!(doc.get("callsign").is_some());

        let doc = Document::for_variant(UiVariant::Dialog, 4, false);
        assert_eq!(doc.get("user-config-dialog").map(|e| e.visible), Some(false));
        assert_eq!(doc.get("console-container").map(|e| e.visible), Some(false));
    }

    #[test]
    fn binding_round_trips_value() {
        let view = bound(UiVariant::Dialog);
        assert!(view.grid().set("FN42"));
        assert_eq!(view.grid().get().as_deref(), Some("FN42"));
        assert_eq!(view.callsign().get().as_deref(), Some(""));
    }

    #[test]
    fn missing_element_is_a_no_op() {
        let view = bound(UiVariant::Inline);
        view.document().lock().unwrap().remove("mode-display");

        assert!(!view.mode_display().set("winlink"));
        assert_eq!(view.mode_display().get(), None);
        assert!(!view.config_dialog().set_visible(true));
    }

    #[test]
    fn max_scroll_accounts_for_viewport() {
        let mut el = Element::scrollable(2);
        assert_eq!(el.max_scroll(), 0);
        el.value = "a\nb\nc\nd\n".to_owned();
        assert_eq!(el.line_count(), 4);
        assert_eq!(el.max_scroll(), 2);
    }
}
