//! HTML serialization with escaping.
//!
//! Text children render as literal visible text: a string child containing
//! `<script>` serializes as `&lt;script&gt;`, never as markup. The document
//! never parses HTML at all, so the serializer is the only place markup
//! characters could leak - and it escapes them.

use crate::types::NodeId;

use super::document::Document;

/// Elements serialized without a closing tag.
const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "link", "meta"];

/// Escape text-node content: `&`, `<`, `>`.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape attribute values: text escapes plus `"`.
fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Serialize a subtree as HTML.
pub fn to_html(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, node, &mut out);
    out
}

fn write_node(doc: &Document, node: NodeId, out: &mut String) {
    if let Some(text) = doc.text(node) {
        out.push_str(&escape_text(&text));
        return;
    }
    let Some(tag) = doc.tag(node) else {
        return;
    };

    out.push('<');
    out.push_str(&tag);
    for (name, value) in doc.attributes(node) {
        out.push(' ');
        out.push_str(&name);
        out.push_str("=\"");
        out.push_str(&escape_attr(&value.to_text()));
        out.push('"');
    }
    out.push('>');

    if VOID_TAGS.contains(&tag.as_str()) {
        return;
    }

    for child in doc.children(node) {
        write_node(doc, child, out);
    }

    out.push_str("</");
    out.push_str(&tag);
    out.push('>');
}

// =============================================================================
// Tests
// =============================================================================
