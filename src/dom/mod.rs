//! In-memory host DOM.
//!
//! The renderer's only egress: element/text creation, attribute, listener
//! and text mutation, child placement and removal on an arena-backed node
//! tree. The document also tracks mutation statistics so tests can assert
//! the minimal-touch guarantees, and carries the few pieces of ambient
//! page state the samples use (focus, title).
//!
//! - [`document`] - the arena document and its mutation API
//! - [`html`] - HTML serialization with text/attribute escaping

pub mod document;
pub mod html;

pub use document::{Document, DocumentRef, MutationKind};
pub use html::{escape_text, to_html};
