//! Arena document - node storage and mutation API.
//!
//! Nodes live in an index arena with a free pool for O(1) reuse; a
//! `NodeId` is an index that stays valid until its subtree is released.
//! Every mutating call bumps the mutation statistics, so "no redundant
//! mutations" is a directly testable property: callers that diff before
//! writing leave the counters untouched.

use std::cell::RefCell;
use std::rc::Rc;

use bitflags::bitflags;

use crate::types::{AttrValue, EventCallback, EventKind, NodeId};

bitflags! {
    /// Categories of DOM mutation, accumulated per document.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MutationKind: u8 {
        const ATTRS     = 1 << 0;
        const LISTENERS = 1 << 1;
        const STRUCTURE = 1 << 2;
        const TEXT      = 1 << 3;
        const FOCUS     = 1 << 4;
        const TITLE     = 1 << 5;
    }
}

/// Shared handle to a document.
///
/// Single-threaded interior mutability: the runtime, event handlers and
/// effects all hold clones and borrow transiently.
pub type DocumentRef = Rc<RefCell<Document>>;

// =============================================================================
// Node Storage
// =============================================================================

struct ElementData {
    tag: String,
    attrs: Vec<(String, AttrValue)>,
    listeners: Vec<(EventKind, EventCallback)>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

struct TextData {
    content: String,
    parent: Option<NodeId>,
}

enum NodeSlot {
    Element(ElementData),
    Text(TextData),
    Free,
}

// =============================================================================
// Document
// =============================================================================

/// The host document: an arena of element and text nodes.
pub struct Document {
    nodes: Vec<NodeSlot>,
    free: Vec<usize>,
    mutations: u64,
    kinds: MutationKind,
    focused: Option<NodeId>,
    title: String,
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            mutations: 0,
            kinds: MutationKind::empty(),
            focused: None,
            title: String::new(),
        }
    }

    /// New document behind a shared handle.
    pub fn new_shared() -> DocumentRef {
        Rc::new(RefCell::new(Self::new()))
    }

    fn alloc(&mut self, slot: NodeSlot) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                self.nodes[index] = slot;
                NodeId(index)
            }
            None => {
                self.nodes.push(slot);
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    fn element(&self, node: NodeId) -> Option<&ElementData> {
        match self.nodes.get(node.0) {
            Some(NodeSlot::Element(data)) => Some(data),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
        match self.nodes.get_mut(node.0) {
            Some(NodeSlot::Element(data)) => Some(data),
            _ => None,
        }
    }

    fn record(&mut self, kind: MutationKind) {
        self.mutations += 1;
        self.kinds |= kind;
    }

    // -------------------------------------------------------------------------
    // Creation & Release
    // -------------------------------------------------------------------------

    /// Create a detached element.
    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.alloc(NodeSlot::Element(ElementData {
            tag: tag.into(),
            attrs: Vec::new(),
            listeners: Vec::new(),
            children: Vec::new(),
            parent: None,
        }))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.alloc(NodeSlot::Text(TextData {
            content: content.into(),
            parent: None,
        }))
    }

    /// Return a detached subtree's indices to the free pool.
    ///
    /// Recursive: children first, then the node itself. Does not count as
    /// a DOM mutation - the observable mutation was the detach.
    pub fn release(&mut self, node: NodeId) {
        if let Some(parent) = self.parent(node) {
            self.detach(parent, node);
        }
        self.release_detached(node);
    }

    fn release_detached(&mut self, node: NodeId) {
        let children = match self.nodes.get(node.0) {
            Some(NodeSlot::Element(data)) => data.children.clone(),
            Some(NodeSlot::Text(_)) => Vec::new(),
            _ => return,
        };
        for child in children {
            self.release_detached(child);
        }
        if self.focused == Some(node) {
            self.focused = None;
        }
        self.nodes[node.0] = NodeSlot::Free;
        self.free.push(node.0);
    }

    // -------------------------------------------------------------------------
    // Attributes & Listeners
    // -------------------------------------------------------------------------

    /// Set an attribute, replacing any existing value.
    pub fn set_attribute(&mut self, node: NodeId, name: impl Into<String>, value: AttrValue) {
        let name = name.into();
        if let Some(data) = self.element_mut(node) {
            if let Some(entry) = data.attrs.iter_mut().find(|(n, _)| *n == name) {
                entry.1 = value;
            } else {
                data.attrs.push((name, value));
            }
            self.record(MutationKind::ATTRS);
        }
    }

    /// Remove an attribute if present.
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(data) = self.element_mut(node) {
            let before = data.attrs.len();
            data.attrs.retain(|(n, _)| n != name);
            if data.attrs.len() != before {
                self.record(MutationKind::ATTRS);
            }
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<AttrValue> {
        self.element(node)?
            .attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    pub fn attributes(&self, node: NodeId) -> Vec<(String, AttrValue)> {
        self.element(node).map(|d| d.attrs.clone()).unwrap_or_default()
    }

    /// Replace the full listener set of an element.
    ///
    /// Closure identity is not comparable, so the reconciler rewrites
    /// listeners wholesale when an element updates.
    pub fn set_listeners(&mut self, node: NodeId, listeners: Vec<(EventKind, EventCallback)>) {
        if let Some(data) = self.element_mut(node) {
            data.listeners = listeners;
            self.record(MutationKind::LISTENERS);
        }
    }

    /// Listeners registered for an event kind (cloned out, so no borrow is
    /// held while they run).
    pub fn listeners(&self, node: NodeId, kind: EventKind) -> Vec<EventCallback> {
        self.element(node)
            .map(|d| {
                d.listeners
                    .iter()
                    .filter(|(k, _)| *k == kind)
                    .map(|(_, cb)| cb.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Tree Structure
    // -------------------------------------------------------------------------

    /// Insert `child` at `index` of `parent`'s child list, detaching it
    /// from any previous parent first.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if let Some(old_parent) = self.parent(child) {
            self.detach(old_parent, child);
        }
        if let Some(data) = self.element_mut(parent) {
            let index = index.min(data.children.len());
            data.children.insert(index, child);
            self.record(MutationKind::STRUCTURE);
        }
        self.set_parent(child, Some(parent));
    }

    /// Append `child` to `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let index = self.element(parent).map(|d| d.children.len()).unwrap_or(0);
        self.insert_child(parent, index, child);
    }

    /// Ensure `child` sits at `index` of `parent`; no-op (and no recorded
    /// mutation) when it already does.
    pub fn place_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        let current = self
            .element(parent)
            .and_then(|d| d.children.iter().position(|&c| c == child));
        match current {
            Some(at) if at == index => {}
            _ => self.insert_child(parent, index, child),
        }
    }

    /// Detach `child` from `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(parent, child);
        self.record(MutationKind::STRUCTURE);
    }

    fn detach(&mut self, parent: NodeId, child: NodeId) {
        if let Some(data) = self.element_mut(parent) {
            data.children.retain(|&c| c != child);
        }
        self.set_parent(child, None);
    }

    fn set_parent(&mut self, node: NodeId, parent: Option<NodeId>) {
        match self.nodes.get_mut(node.0) {
            Some(NodeSlot::Element(data)) => data.parent = parent,
            Some(NodeSlot::Text(data)) => data.parent = parent,
            _ => {}
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        match self.nodes.get(node.0) {
            Some(NodeSlot::Element(data)) => data.parent,
            Some(NodeSlot::Text(data)) => data.parent,
            _ => None,
        }
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.element(node).map(|d| d.children.clone()).unwrap_or_default()
    }

    pub fn tag(&self, node: NodeId) -> Option<String> {
        self.element(node).map(|d| d.tag.clone())
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        matches!(self.nodes.get(node.0), Some(NodeSlot::Element(_)))
    }

    // -------------------------------------------------------------------------
    // Text
    // -------------------------------------------------------------------------

    /// Replace a text node's content.
    pub fn set_text(&mut self, node: NodeId, content: impl Into<String>) {
        if let Some(NodeSlot::Text(data)) = self.nodes.get_mut(node.0) {
            data.content = content.into();
            self.record(MutationKind::TEXT);
        }
    }

    /// Text node content.
    pub fn text(&self, node: NodeId) -> Option<String> {
        match self.nodes.get(node.0) {
            Some(NodeSlot::Text(data)) => Some(data.content.clone()),
            _ => None,
        }
    }

    /// Replace an element's children with a single text node.
    ///
    /// The portal pattern: effects write summary text into an element they
    /// look up by id.
    pub fn set_text_content(&mut self, node: NodeId, content: impl Into<String>) {
        let old = self.children(node);
        for child in old {
            self.detach(node, child);
            self.release_detached(child);
        }
        let text = self.create_text(content);
        if let Some(data) = self.element_mut(node) {
            data.children.push(text);
        }
        self.set_parent(text, Some(node));
        self.record(MutationKind::STRUCTURE | MutationKind::TEXT);
    }

    /// Concatenated text of a subtree, in document order.
    pub fn text_content(&self, node: NodeId) -> String {
        match self.nodes.get(node.0) {
            Some(NodeSlot::Text(data)) => data.content.clone(),
            Some(NodeSlot::Element(data)) => {
                let mut out = String::new();
                for &child in &data.children {
                    out.push_str(&self.text_content(child));
                }
                out
            }
            _ => String::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// First element whose `id` attribute equals `id`.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.nodes.iter().enumerate().find_map(|(index, slot)| {
            let NodeSlot::Element(data) = slot else {
                return None;
            };
            let matches = data
                .attrs
                .iter()
                .any(|(n, v)| n == "id" && v.as_str() == Some(id));
            matches.then_some(NodeId(index))
        })
    }

    // -------------------------------------------------------------------------
    // Page State
    // -------------------------------------------------------------------------

    /// Move focus to a node.
    pub fn focus(&mut self, node: NodeId) {
        if self.focused != Some(node) {
            self.focused = Some(node);
            self.record(MutationKind::FOCUS);
        }
    }

    pub fn blur(&mut self) {
        if self.focused.is_some() {
            self.focused = None;
            self.record(MutationKind::FOCUS);
        }
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    /// Set the document title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        let title = title.into();
        if self.title != title {
            self.title = title;
            self.record(MutationKind::TITLE);
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    // -------------------------------------------------------------------------
    // Mutation Statistics
    // -------------------------------------------------------------------------

    /// Total mutating calls since the last reset.
    pub fn mutation_count(&self) -> u64 {
        self.mutations
    }

    /// Union of mutation categories since the last reset.
    pub fn mutation_kinds(&self) -> MutationKind {
        self.kinds
    }

    pub fn reset_mutation_stats(&mut self) {
        self.mutations = 0;
        self.kinds = MutationKind::empty();
    }

    /// Live (non-free) node count.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
