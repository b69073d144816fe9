//! Context propagation - provider values without prop threading.
//!
//! A [`Context`] carries a typed value down the descriptor tree. A provider
//! descriptor extends the environment for its subtree; a consumer (or a
//! [`use_context`](crate::hooks::Ctx::use_context) read) resolves to the
//! nearest enclosing provider value, falling back to the context default.
//!
//! The environment is an explicit persistent map threaded through the
//! reconciler's recursive descent - there is no ambient provider stack.
//! Each component instance snapshots the environment it rendered under, so
//! a local re-render of that instance observes exactly the values a full
//! pass would have handed it.

use std::any::Any;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::descriptor::{Children, Descriptor, component};
use crate::hooks::Ctx;

// =============================================================================
// Context Identity
// =============================================================================

/// Identity of a context, shared by its providers and consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u32);

thread_local! {
    /// Counter for generating unique context ids.
    static NEXT_CONTEXT_ID: Cell<u32> = const { Cell::new(0) };
}

fn next_context_id() -> ContextId {
    NEXT_CONTEXT_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        ContextId(id)
    })
}

// =============================================================================
// Context
// =============================================================================

/// A typed context: identity plus default value.
///
/// Clone it freely - clones share the same identity.
///
/// # Example
///
/// ```ignore
/// let theme: Context<Theme> = Context::new(Theme::default());
///
/// theme.provider(Theme::dark(), children![
///     theme.consumer(|t| h("p", Attrs::new().style(t.style.clone()), "themed").into()),
/// ])
/// ```
pub struct Context<T> {
    id: ContextId,
    default: Rc<T>,
}

impl<T> Clone for Context<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            default: self.default.clone(),
        }
    }
}

impl<T: 'static> Context<T> {
    /// Register a new context with a default value.
    pub fn new(default: T) -> Self {
        Self {
            id: next_context_id(),
            default: Rc::new(default),
        }
    }

    /// Context identity.
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// The value handed to consumers with no enclosing provider.
    pub fn default_value(&self) -> Rc<T> {
        self.default.clone()
    }

    /// Build a provider descriptor: `value` is visible to every consumer in
    /// `children`, shadowing any outer provider of the same context.
    pub fn provider(&self, value: T, children: impl Into<Children>) -> Descriptor {
        Descriptor::provider(self.id, Rc::new(value) as Rc<dyn Any>, children.into())
    }

    /// Build a consumer component that re-renders from the resolved value.
    ///
    /// Sugar over a component calling [`Ctx::use_context`].
    pub fn consumer<F>(&self, render: F) -> Descriptor
    where
        F: Fn(&Rc<T>, &mut Ctx) -> Children + 'static,
    {
        let handle = self.clone();
        component(
            move |ctx: &mut Ctx, _props: &()| {
                let value = ctx.use_context(&handle);
                render(&value, ctx)
            },
            (),
        )
    }

    /// Resolve this context against an environment.
    pub(crate) fn resolve(&self, env: &Env) -> Rc<T> {
        match env.lookup(self.id) {
            Some(value) => value
                .downcast::<T>()
                .unwrap_or_else(|_| self.default.clone()),
            None => self.default.clone(),
        }
    }
}

// =============================================================================
// Environment
// =============================================================================

/// Immutable map of active provider values at one tree position.
///
/// Extending produces a new environment sharing nothing mutable with the
/// parent, so sibling subtrees cannot observe each other's providers.
#[derive(Clone, Default)]
pub struct Env(Rc<HashMap<ContextId, Rc<dyn Any>>>);

impl Env {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Nearest provider value for `id`, if any provider is active above.
    pub(crate) fn lookup(&self, id: ContextId) -> Option<Rc<dyn Any>> {
        self.0.get(&id).cloned()
    }

    /// Environment with `id` bound to `value` (shadows an outer binding).
    pub(crate) fn with(&self, id: ContextId, value: Rc<dyn Any>) -> Env {
        let mut map: HashMap<ContextId, Rc<dyn Any>> = (*self.0).clone();
        map.insert(id, value);
        Env(Rc::new(map))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_ids_are_unique() {
        let a: Context<u32> = Context::new(0);
        let b: Context<u32> = Context::new(0);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn test_env_lookup_falls_back_to_default() {
        let ctx: Context<String> = Context::new("default".to_string());
        let env = Env::new();
        assert_eq!(*ctx.resolve(&env), "default");
        assert_eq!(*ctx.default_value(), "default");
    }

    #[test]
    fn test_env_shadowing() {
        let ctx: Context<i32> = Context::new(0);
        let outer = Env::new().with(ctx.id(), Rc::new(1i32));
        let inner = outer.with(ctx.id(), Rc::new(2i32));

        assert_eq!(*ctx.resolve(&outer), 1);
        assert_eq!(*ctx.resolve(&inner), 2);
        // Extending never mutates the parent environment.
        assert_eq!(*ctx.resolve(&outer), 1);
    }

    #[test]
    fn test_env_is_per_context() {
        let a: Context<i32> = Context::new(-1);
        let b: Context<i32> = Context::new(-2);
        let env = Env::new().with(a.id(), Rc::new(10i32));

        assert_eq!(*a.resolve(&env), 10);
        assert_eq!(*b.resolve(&env), -2);
    }
}
