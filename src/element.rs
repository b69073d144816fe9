//! Custom-element bridge - host an element class outside the render tree.
//!
//! An [`ElementSpec`] is the typed equivalent of a custom-element class
//! definition: the attributes the element observes plus a render function
//! from the current attribute set to children. A [`HostedElement`] is one
//! live instance of that class, rendering into its own isolated shadow
//! document.
//!
//! Lifecycle mirrors the web platform's: nothing renders before
//! [`connect`](HostedElement::connect), and after connection a write to an
//! observed attribute re-renders only when the value actually changed.
//! Writes to unobserved attributes are stored but never trigger a render.
//!
//! Structured options ride along as [`AttrValue::Json`], the Rust shape of
//! the original `options='{"foo":"bar"}'` JSON-serialized attribute.

use crate::descriptor::Children;
use crate::dom::DocumentRef;
use crate::runtime::Runtime;
use crate::types::AttrValue;

use std::rc::Rc;

// =============================================================================
// Element Specification
// =============================================================================

/// Declarative definition of a hosted element: observed attributes plus a
/// render function.
#[derive(Clone)]
pub struct ElementSpec {
    tag: String,
    observed: Vec<String>,
    render: Rc<dyn Fn(&AttrSnapshot) -> Children>,
}

impl ElementSpec {
    pub fn new(
        tag: impl Into<String>,
        render: impl Fn(&AttrSnapshot) -> Children + 'static,
    ) -> Self {
        Self {
            tag: tag.into(),
            observed: Vec::new(),
            render: Rc::new(render),
        }
    }

    /// Observe an attribute: changes to it re-render a connected instance.
    pub fn observe(mut self, name: impl Into<String>) -> Self {
        self.observed.push(name.into());
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    fn observes(&self, name: &str) -> bool {
        self.observed.iter().any(|a| a == name)
    }
}

/// Read-only view of a hosted element's attributes, handed to its render
/// function.
pub struct AttrSnapshot(Vec<(String, AttrValue)>);

impl AttrSnapshot {
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Attribute as JSON, for structured option values.
    pub fn json(&self, name: &str) -> Option<&serde_json::Value> {
        match self.get(name) {
            Some(AttrValue::Json(value)) => Some(value),
            _ => None,
        }
    }

    /// Attribute in its serialized textual form.
    pub fn text(&self, name: &str) -> Option<String> {
        self.get(name).map(|v| v.to_text())
    }
}

// =============================================================================
// Hosted Element
// =============================================================================

/// A live instance of an [`ElementSpec`] with its own shadow document.
pub struct HostedElement {
    spec: ElementSpec,
    attrs: Vec<(String, AttrValue)>,
    connected: bool,
    shadow: Runtime,
}

impl HostedElement {
    /// Instantiate disconnected; nothing renders until [`connect`](Self::connect).
    pub fn new(spec: ElementSpec) -> Self {
        let doc = crate::dom::Document::new_shared();
        let root = doc.borrow_mut().create_element("shadow-root");
        Self {
            spec,
            attrs: Vec::new(),
            connected: false,
            shadow: Runtime::new(doc, root),
        }
    }

    /// Attach to the page: renders for the first time.
    pub fn connect(&mut self) {
        self.connected = true;
        self.render();
    }

    /// Detach: tears the shadow tree down (effect cleanups included).
    pub fn disconnect(&mut self) {
        self.connected = false;
        self.shadow.unmount();
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Write an attribute.
    ///
    /// Re-renders only when the element is connected, the attribute is
    /// observed, and the value actually changed.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        let name = name.into();
        let value = value.into();
        let changed = match self.attrs.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => {
                let changed = entry.1 != value;
                entry.1 = value;
                changed
            }
            None => {
                self.attrs.push((name.clone(), value));
                true
            }
        };
        if changed && self.connected && self.spec.observes(&name) {
            self.render();
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// The shadow document this instance renders into.
    pub fn shadow_document(&self) -> &DocumentRef {
        self.shadow.document()
    }

    /// Serialized shadow content.
    pub fn shadow_html(&self) -> String {
        self.shadow.html()
    }

    fn render(&mut self) {
        let snapshot = AttrSnapshot(self.attrs.clone());
        let children = (self.spec.render)(&snapshot);
        self.shadow.render(children);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Attrs, h};

    fn options_box() -> ElementSpec {
        ElementSpec::new("x-custom", |attrs: &AttrSnapshot| {
            let options = attrs.text("options").unwrap_or_default();
            h(
                "div",
                Attrs::new().style([("background-color", "yellow"), ("color", "red")]),
                format!("<x-custom options='{options}' />"),
            )
            .into()
        })
        .observe("options")
    }

    #[test]
    fn test_no_render_before_connect() {
        let mut el = HostedElement::new(options_box());
        el.set_attribute("options", serde_json::json!({"foo": "bar"}));
        assert_eq!(el.shadow_html(), "<shadow-root></shadow-root>");

        el.connect();
        assert!(el.shadow_html().contains("x-custom"));
    }

    #[test]
    fn test_observed_change_rerenders() {
        let mut el = HostedElement::new(options_box());
        el.connect();
        el.set_attribute("options", serde_json::json!({"foo": "bar"}));
        assert!(el.shadow_html().contains("foo"));

        el.set_attribute("options", serde_json::json!({"foo": "baz"}));
        assert!(el.shadow_html().contains("baz"));
    }

    #[test]
    fn test_equal_value_does_not_rerender() {
        let mut el = HostedElement::new(options_box());
        el.connect();
        el.set_attribute("options", serde_json::json!({"foo": "bar"}));

        el.shadow_document().borrow_mut().reset_mutation_stats();
        el.set_attribute("options", serde_json::json!({"foo": "bar"}));
        assert_eq!(el.shadow_document().borrow().mutation_count(), 0);
    }

    #[test]
    fn test_unobserved_attribute_is_stored_silently() {
        let mut el = HostedElement::new(options_box());
        el.connect();
        let before = el.shadow_html();

        el.set_attribute("data-extra", "x");
        assert_eq!(el.attribute("data-extra"), Some(&AttrValue::from("x")));
        assert_eq!(el.shadow_html(), before);
    }

    #[test]
    fn test_snapshot_json_access() {
        let spec = ElementSpec::new("x-json", |attrs: &AttrSnapshot| {
            let foo = attrs
                .json("options")
                .and_then(|v| v.get("foo"))
                .and_then(|v| v.as_str())
                .unwrap_or("none")
                .to_string();
            h("p", Attrs::new(), foo).into()
        })
        .observe("options");

        let mut el = HostedElement::new(spec);
        el.set_attribute("options", serde_json::json!({"foo": "bar"}));
        el.connect();
        assert!(el.shadow_html().contains("<p>bar</p>"));

        // Non-JSON attributes have no structured view.
        el.set_attribute("options", "plain text");
        assert!(el.shadow_html().contains("<p>none</p>"));
    }

    #[test]
    fn test_escaped_markup_in_shadow_output() {
        let mut el = HostedElement::new(options_box());
        el.set_attribute("options", serde_json::json!({"foo": "bar"}));
        el.connect();
        // The element prints its own tag as literal text.
        assert!(el.shadow_html().contains("&lt;x-custom"));
    }
}
