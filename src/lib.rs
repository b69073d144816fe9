//! # hooked
//!
//! Hook-based declarative UI renderer with an in-memory host DOM.
//!
//! Components are plain functions from props to a descriptor tree, built
//! hyperscript style with [`h`]. Per-instance state lives in ordered hook
//! slots accessed through the [`Ctx`] handle the reconciler passes into
//! every invocation - `use_state`, `use_ref`, `use_memo`, `use_effect`,
//! `use_context`. The renderer diffs each new descriptor tree against the
//! live instance tree and applies minimal mutations to an arena-backed
//! document, then flushes queued effects.
//!
//! ## Pipeline
//!
//! ```text
//! Descriptor Tree → Reconciler → Document mutations → Effect flush
//! ```
//!
//! State setters mark their owning instance dirty; [`Runtime::flush`]
//! re-renders exactly the dirty subtrees and loops until quiescent, so a
//! whole setter/effect cascade settles within one event dispatch.
//!
//! ## Modules
//!
//! - [`types`] - Core types (NodeId, AttrValue, Event, ElementRef, etc.)
//! - [`descriptor`] - `h`, `fragment`, `component`, children flattening
//! - [`hooks`] - Hook slot store and the `Ctx` hook API
//! - [`context`] - Typed context with provider/consumer descriptors
//! - [`dom`] - In-memory host document and HTML serialization
//! - [`runtime`] - Render entry point, dirty scheduling, event dispatch
//! - [`element`] - Custom-element bridge with shadow documents

pub mod context;
pub mod descriptor;
pub mod dom;
pub mod element;
pub mod hooks;
pub mod runtime;
pub mod types;

mod effects;
mod renderer;

// Re-export commonly used items
pub use types::*;

pub use descriptor::{component, fragment, h, Attrs, Child, Children, Descriptor};

pub use hooks::{Ctx, DepList, HookStore, RefHandle, Setter};

pub use context::{Context, ContextId};

pub use dom::{escape_text, to_html, Document, DocumentRef, MutationKind};

pub use runtime::Runtime;

pub use element::{AttrSnapshot, ElementSpec, HostedElement};
