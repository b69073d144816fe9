//! Reconciling renderer.
//!
//! - [`instance`] - the live instance tree mirroring the last render
//! - [`reconcile`] - descriptor-vs-instance diffing and DOM placement

pub(crate) mod instance;
pub(crate) mod reconcile;

pub(crate) use instance::Instance;
pub(crate) use reconcile::{reconcile_children, rerender_dirty, Pass};
