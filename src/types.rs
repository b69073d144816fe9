//! Core types for hooked.
//!
//! These types define the foundation that everything builds on.
//! They flow between the descriptor builder, the reconciler and the
//! host DOM, and define what the renderer understands.

use std::fmt;
use std::rc::Rc;

// =============================================================================
// Node Identity
// =============================================================================

/// Handle to a node in the host [`Document`](crate::dom::Document) arena.
///
/// Plain index newtype - nodes are never moved, so a `NodeId` stays valid
/// for the lifetime of the node (until its subtree is released).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Raw arena index.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Identity of a live component instance.
///
/// Allocated by the runtime on mount and stable across re-renders of the
/// same tree position. Used as the key of the dirty set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(pub(crate) u64);

// =============================================================================
// Cleanup Function
// =============================================================================

/// Cleanup function returned by an effect.
///
/// Runs before the effect re-runs with changed dependencies, and once more
/// when the owning instance unmounts.
pub type Cleanup = Box<dyn FnOnce()>;

// =============================================================================
// Events
// =============================================================================

/// Event categories the host DOM can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Pointer click on an element.
    Click,
    /// Value change on an input-like element.
    Input,
    /// Element gained focus.
    Focus,
    /// Element lost focus.
    Blur,
}

/// An event delivered to listeners registered via [`Attrs`](crate::descriptor::Attrs).
#[derive(Debug, Clone)]
pub struct Event {
    /// Node the event was dispatched on.
    pub target: NodeId,
    /// Event category.
    pub kind: EventKind,
    /// Payload for `Input` events (the new value).
    pub value: Option<String>,
}

impl Event {
    pub(crate) fn new(target: NodeId, kind: EventKind) -> Self {
        Self {
            target,
            kind,
            value: None,
        }
    }
}

/// Event callback type (Rc for shared ownership in closures).
///
/// Using Rc<dyn Fn> instead of Box<dyn Fn> allows cloning callbacks out of
/// the document for dispatch without holding a borrow while user code runs.
pub type EventCallback = Rc<dyn Fn(&Event)>;

// =============================================================================
// Style
// =============================================================================

/// Ordered inline-style map.
///
/// Order-preserving so serialized output is deterministic; comparison is
/// element-wise, which is what attribute diffing needs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyleMap(Vec<(String, String)>);

impl StyleMap {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Set a property, replacing an existing entry with the same name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(entry) = self.0.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.0.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serialize as a CSS declaration list: `color: red; padding: 1em`.
    pub fn to_css(&self) -> String {
        let mut out = String::new();
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                out.push_str("; ");
            }
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value);
        }
        out
    }
}

impl<const N: usize> From<[(&str, &str); N]> for StyleMap {
    fn from(pairs: [(&str, &str); N]) -> Self {
        let mut map = StyleMap::new();
        for (name, value) in pairs {
            map.set(name, value);
        }
        map
    }
}

// =============================================================================
// Attribute Values
// =============================================================================

/// A value an element attribute can hold.
///
/// The host DOM stores attributes typed rather than stringly: the diff can
/// then compare exactly, and the serializer decides the textual form.
/// `Json` carries structured data for custom-element options
/// (the hyperscript `options: { ... }` pattern).
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Style(StyleMap),
    Json(serde_json::Value),
}

impl AttrValue {
    /// Textual form used by the HTML serializer and text-level reads.
    pub fn to_text(&self) -> String {
        match self {
            AttrValue::Text(s) => s.clone(),
            AttrValue::Number(n) => format_number(*n),
            AttrValue::Bool(b) => b.to_string(),
            AttrValue::Style(s) => s.to_css(),
            AttrValue::Json(v) => v.to_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Text(s)
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        AttrValue::Number(n)
    }
}

impl From<i64> for AttrValue {
    fn from(n: i64) -> Self {
        AttrValue::Number(n as f64)
    }
}

impl From<i32> for AttrValue {
    fn from(n: i32) -> Self {
        AttrValue::Number(n as f64)
    }
}

impl From<u16> for AttrValue {
    fn from(n: u16) -> Self {
        AttrValue::Number(n as f64)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

impl From<StyleMap> for AttrValue {
    fn from(s: StyleMap) -> Self {
        AttrValue::Style(s)
    }
}

impl From<serde_json::Value> for AttrValue {
    fn from(v: serde_json::Value) -> Self {
        AttrValue::Json(v)
    }
}

/// Format a number the way the DOM coerces it: integers without a
/// trailing `.0`, everything else via the default float formatting.
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

// =============================================================================
// Element References
// =============================================================================

/// Stable cell that receives the host node handle when the element mounts.
///
/// The hyperscript `ref` attribute: the reconciler writes the `NodeId` in
/// on mount/update and clears it on unmount.
#[derive(Clone, Default)]
pub struct ElementRef(Rc<std::cell::Cell<Option<NodeId>>>);

impl ElementRef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently mounted node, if any.
    pub fn get(&self) -> Option<NodeId> {
        self.0.get()
    }

    pub(crate) fn set(&self, node: Option<NodeId>) {
        self.0.set(node);
    }

    /// Two handles pointing at the same shared cell.
    pub(crate) fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ElementRef").field(&self.0.get()).finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
