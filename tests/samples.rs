//! End-to-end sample scenarios against the public API.
//!
//! Each test builds a small component tree, renders it into a fresh
//! in-memory document, simulates events through the runtime, and asserts
//! on text content, focus, title or mutation statistics.

use std::cell::Cell;
use std::rc::Rc;

use hooked::{
    children, component, fragment, h, Attrs, Children, Context, Ctx, DocumentRef, Event,
    EventKind, Runtime, StyleMap,
};

fn by_id(rt: &Runtime, id: &str) -> hooked::NodeId {
    rt.document()
        .borrow()
        .get_element_by_id(id)
        .unwrap_or_else(|| panic!("no element with id {id}"))
}

fn text_of(rt: &Runtime, id: &str) -> String {
    let node = by_id(rt, id);
    rt.document().borrow().text_content(node)
}

// =============================================================================
// Counter
// =============================================================================

#[derive(PartialEq)]
struct CounterProps {
    initial: i64,
}

fn counter(ctx: &mut Ctx, props: &CounterProps) -> Children {
    let initial = props.initial;
    let (count, set_count) = ctx.use_state(|| initial);
    let count = *count;

    let dec = set_count.clone();
    let inc = set_count;
    h(
        "div",
        Attrs::new(),
        children![
            h("button", Attrs::new().id("dec").on_click(move |_| dec.set(count - 1)), "-"),
            h("span", Attrs::new().id("count"), children![count]),
            h("button", Attrs::new().id("inc").on_click(move |_| inc.set(count + 1)), "+"),
        ],
    )
    .into()
}

#[test]
fn test_counter_click_sequence() {
    let mut rt = Runtime::with_body();
    rt.render(component(counter, CounterProps { initial: 5 }));
    assert_eq!(text_of(&rt, "count"), "5");

    let inc = by_id(&rt, "inc");
    rt.click(inc);
    assert_eq!(text_of(&rt, "count"), "6");

    let dec = by_id(&rt, "dec");
    rt.click(dec);
    rt.click(dec);
    assert_eq!(text_of(&rt, "count"), "4");
}

#[test]
fn test_counter_update_touches_only_text() {
    let mut rt = Runtime::with_body();
    rt.render(component(counter, CounterProps { initial: 0 }));
    let inc = by_id(&rt, "inc");

    rt.document().borrow_mut().reset_mutation_stats();
    rt.click(inc);

    let doc = rt.document().borrow();
    // Text update plus the listener rewrite; no structural churn.
    assert!(doc.mutation_kinds().contains(hooked::MutationKind::TEXT));
    assert!(!doc.mutation_kinds().contains(hooked::MutationKind::STRUCTURE));
}

// =============================================================================
// Effect Portal
// =============================================================================

fn portal_page(doc: &DocumentRef) -> hooked::Descriptor {
    let doc = doc.clone();
    let buttons = component(
        move |ctx: &mut Ctx, _: &()| {
            let (count, set_count) = ctx.use_state(|| 3i64);
            let count = *count;

            let doc = doc.clone();
            ctx.use_effect((count,), move || {
                let portal = doc.borrow().get_element_by_id("portal");
                if let Some(portal) = portal {
                    doc.borrow_mut()
                        .set_text_content(portal, format!("You clicked {count} times."));
                }
            });

            let up = set_count.clone();
            let reset = set_count;
            children![
                h("button", Attrs::new().id("up").on_click(move |_| up.set(count + 1)), "Count up"),
                h("button", Attrs::new().id("reset").on_click(move |_| reset.set(0)), "Reset"),
            ]
        },
        (),
    );

    fragment(children![buttons, h("div", Attrs::new().id("portal"), ())])
}

#[test]
fn test_effect_portal_sequence() {
    let mut rt = Runtime::with_body();
    let doc = rt.document().clone();
    rt.render(portal_page(&doc));
    // First flush already ran the effect against the committed DOM.
    assert_eq!(text_of(&rt, "portal"), "You clicked 3 times.");

    let up = by_id(&rt, "up");
    rt.click(up);
    assert_eq!(text_of(&rt, "portal"), "You clicked 4 times.");

    let reset = by_id(&rt, "reset");
    rt.click(reset);
    assert_eq!(text_of(&rt, "portal"), "You clicked 0 times.");
}

#[test]
fn test_effect_skipped_on_equal_deps() {
    let runs = Rc::new(Cell::new(0u32));

    let runs_inner = runs.clone();
    let page = component(
        move |ctx: &mut Ctx, _: &()| {
            let (count, set_count) = ctx.use_state(|| 0i64);
            let count = *count;
            let runs = runs_inner.clone();
            ctx.use_effect((count / 10,), move || runs.set(runs.get() + 1));

            let bump = set_count;
            h("button", Attrs::new().id("b").on_click(move |_| bump.set(count + 1)), "go").into()
        },
        (),
    );

    let mut rt = Runtime::with_body();
    rt.render(page);
    assert_eq!(runs.get(), 1);

    // count 0 -> 1: dep 0/10 unchanged, effect must not re-run.
    let b = by_id(&rt, "b");
    rt.click(b);
    assert_eq!(runs.get(), 1);
}

// =============================================================================
// Effect Lifecycle
// =============================================================================

#[test]
fn test_empty_deps_effect_runs_once_and_cleans_up_at_unmount() {
    let runs = Rc::new(Cell::new(0u32));
    let cleanups = Rc::new(Cell::new(0u32));

    let r = runs.clone();
    let c = cleanups.clone();
    let page = move |_ctx: &mut Ctx, show: &bool| -> Children {
        if !*show {
            return Children::new();
        }
        let r = r.clone();
        let c = c.clone();
        let inner = component(
            move |ctx: &mut Ctx, _: &()| {
                let r = r.clone();
                let c = c.clone();
                ctx.use_effect_with((), move || {
                    r.set(r.get() + 1);
                    Box::new(move || c.set(c.get() + 1))
                });
                h("p", Attrs::new(), "mounted").into()
            },
            (),
        );
        inner.into()
    };

    let mut rt = Runtime::with_body();
    rt.render(component(page.clone(), true));
    assert_eq!((runs.get(), cleanups.get()), (1, 0));

    // Re-render with the child still mounted: no re-run.
    rt.render(component(page.clone(), true));
    assert_eq!((runs.get(), cleanups.get()), (1, 0));

    // Unmount the child: cleanup fires exactly once.
    rt.render(component(page, false));
    assert_eq!((runs.get(), cleanups.get()), (1, 1));
}

// =============================================================================
// Context
// =============================================================================

#[test]
fn test_nested_provider_shadowing() {
    let color: Context<String> = Context::new("black".to_string());

    let paragraph = |id: &'static str| {
        move |t: &Rc<String>, _: &mut Ctx| -> Children {
            h("p", Attrs::new().id(id), t.as_str()).into()
        }
    };

    let mut rt = Runtime::with_body();
    rt.render(color.provider(
        "red".to_string(),
        children![
            color.consumer(paragraph("outer")),
            color.provider("blue".to_string(), color.consumer(paragraph("inner"))),
        ],
    ));

    assert_eq!(text_of(&rt, "outer"), "red");
    assert_eq!(text_of(&rt, "inner"), "blue");
}

#[test]
fn test_inner_provider_unmount_restores_outer() {
    let color: Context<String> = Context::new("black".to_string());

    let consumer = || {
        color.consumer(|t: &Rc<String>, _: &mut Ctx| {
            h("p", Attrs::new().id("p"), t.as_str()).into()
        })
    };

    let mut rt = Runtime::with_body();
    rt.render(color.provider(
        "red".to_string(),
        color.provider("blue".to_string(), consumer()),
    ));
    assert_eq!(text_of(&rt, "p"), "blue");

    // Inner provider gone at the same position: the consumer resolves to
    // the outer value again.
    rt.render(color.provider("red".to_string(), consumer()));
    assert_eq!(text_of(&rt, "p"), "red");
}

#[test]
fn test_consumer_falls_back_to_default() {
    let color: Context<String> = Context::new("black".to_string());
    let mut rt = Runtime::with_body();
    rt.render(color.consumer(|t: &Rc<String>, _: &mut Ctx| {
        h("p", Attrs::new().id("p"), t.as_str()).into()
    }));
    assert_eq!(text_of(&rt, "p"), "black");
}

#[test]
fn test_provider_value_change_rerenders_subtree() {
    let style: Context<StyleMap> = Context::new(StyleMap::new());

    let s = style.clone();
    let toggling = component(
        move |ctx: &mut Ctx, _: &()| {
            let (dark, set_dark) = ctx.use_state(|| false);
            let value = if *dark {
                StyleMap::from([("color", "white")])
            } else {
                StyleMap::from([("color", "black")])
            };
            let flip = set_dark.clone();
            let was = *dark;
            children![
                h("button", Attrs::new().id("flip").on_click(move |_| flip.set(!was)), "flip"),
                s.provider(
                    value,
                    s.consumer(|v: &Rc<StyleMap>, _: &mut Ctx| {
                        h("p", Attrs::new().id("themed"), v.get("color").unwrap_or("?")).into()
                    }),
                ),
            ]
        },
        (),
    );

    let mut rt = Runtime::with_body();
    rt.render(toggling);
    assert_eq!(text_of(&rt, "themed"), "black");

    let flip = by_id(&rt, "flip");
    rt.click(flip);
    assert_eq!(text_of(&rt, "themed"), "white");
}

// =============================================================================
// Keys
// =============================================================================

#[derive(PartialEq)]
struct ItemProps {
    label: &'static str,
}

fn stateful_item(ctx: &mut Ctx, props: &ItemProps) -> Children {
    // Captures its first label in state; survives reorders only when keyed.
    let label = props.label;
    let (first, _set) = ctx.use_state(|| label.to_string());
    h(
        "li",
        Attrs::new().id(props.label),
        format!("{}:{}", props.label, first),
    )
    .into()
}

fn keyed_list(order: &[&'static str]) -> hooked::Descriptor {
    h(
        "ul",
        Attrs::new(),
        order
            .iter()
            .map(|&label| component(stateful_item, ItemProps { label }).key(label))
            .collect::<Vec<_>>(),
    )
}

#[test]
fn test_keyed_reorder_preserves_hook_state() {
    let mut rt = Runtime::with_body();
    rt.render(keyed_list(&["a", "b", "c"]));
    assert_eq!(text_of(&rt, "b"), "b:b");

    rt.render(keyed_list(&["c", "b", "a"]));
    // Each item kept its own state across the reorder.
    assert_eq!(text_of(&rt, "a"), "a:a");
    assert_eq!(text_of(&rt, "c"), "c:c");

    let doc = rt.document().borrow();
    let ul = doc.get_element_by_id("a").and_then(|n| doc.parent(n)).unwrap();
    let order: Vec<String> = doc
        .children(ul)
        .into_iter()
        .map(|child| doc.text_content(child))
        .collect();
    assert_eq!(order, vec!["c:c", "b:b", "a:a"]);
}

#[test]
fn test_unkeyed_reorder_reassigns_state_by_position() {
    let unkeyed = |order: &[&'static str]| {
        h(
            "ul",
            Attrs::new(),
            order
                .iter()
                .map(|&label| component(stateful_item, ItemProps { label }))
                .collect::<Vec<_>>(),
        )
    };

    let mut rt = Runtime::with_body();
    rt.render(unkeyed(&["a", "b"]));
    rt.render(unkeyed(&["b", "a"]));

    // Positional matching: the first slot's state was created as "a".
    assert_eq!(text_of(&rt, "b"), "b:a");
    assert_eq!(text_of(&rt, "a"), "a:b");
}

// =============================================================================
// Refs, Focus, Title
// =============================================================================

#[test]
fn test_ref_focus_sample() {
    let focus_page = |doc: &DocumentRef| {
        let doc = doc.clone();
        component(
            move |ctx: &mut Ctx, _: &()| {
                let input_ref = ctx.use_node_ref();
                let doc = doc.clone();
                let target = input_ref.clone();
                children![
                    h("input", Attrs::new().id("field").bind_ref(&input_ref), ()),
                    h(
                        "button",
                        Attrs::new().id("focus").on_click(move |_| {
                            if let Some(node) = target.get() {
                                doc.borrow_mut().focus(node);
                            }
                        }),
                        "Focus on click",
                    ),
                ]
            },
            (),
        )
    };

    let mut rt = Runtime::with_body();
    let doc = rt.document().clone();
    rt.render(focus_page(&doc));
    assert_eq!(rt.document().borrow().focused(), None);

    let button = by_id(&rt, "focus");
    rt.click(button);
    let field = by_id(&rt, "field");
    assert_eq!(rt.document().borrow().focused(), Some(field));
}

#[test]
fn test_focus_and_blur_events() {
    fn field(ctx: &mut Ctx, _: &()) -> Children {
        let (state, set_state) = ctx.use_state(|| "idle".to_string());
        let on_focus = set_state.clone();
        let on_blur = set_state;
        children![
            h(
                "input",
                Attrs::new()
                    .id("field")
                    .on(EventKind::Focus, move |_| on_focus.set("focused".to_string()))
                    .on(EventKind::Blur, move |_| on_blur.set("blurred".to_string())),
                (),
            ),
            h("p", Attrs::new().id("state"), state.as_str()),
        ]
    }

    let mut rt = Runtime::with_body();
    rt.render(component(field, ()));
    let input = by_id(&rt, "field");

    rt.document().borrow_mut().focus(input);
    rt.dispatch(
        input,
        Event {
            target: input,
            kind: EventKind::Focus,
            value: None,
        },
    );
    assert_eq!(text_of(&rt, "state"), "focused");
    assert_eq!(rt.document().borrow().focused(), Some(input));

    rt.document().borrow_mut().blur();
    rt.dispatch(
        input,
        Event {
            target: input,
            kind: EventKind::Blur,
            value: None,
        },
    );
    assert_eq!(text_of(&rt, "state"), "blurred");
    assert_eq!(rt.document().borrow().focused(), None);
}

#[test]
fn test_document_title_effect() {
    let title = |doc: &DocumentRef| {
        let doc = doc.clone();
        component(
            move |ctx: &mut Ctx, _: &()| {
                let doc = doc.clone();
                ctx.use_effect((), move || doc.borrow_mut().set_title("hooked-hyper"));
                Children::new()
            },
            (),
        )
    };

    let mut rt = Runtime::with_body();
    let doc = rt.document().clone();
    rt.render(children![title(&doc), h("h1", Attrs::new(), "page")]);
    assert_eq!(rt.document().borrow().title(), "hooked-hyper");
}

#[test]
fn test_input_event_drives_state() {
    fn echo(ctx: &mut Ctx, _: &()) -> Children {
        let (value, set_value) = ctx.use_state(String::new);
        children![
            h(
                "input",
                Attrs::new().id("field").on_input(move |event| {
                    if let Some(text) = &event.value {
                        set_value.set(text.clone());
                    }
                }),
                (),
            ),
            h("p", Attrs::new().id("echo"), value.as_str()),
        ]
    }

    let mut rt = Runtime::with_body();
    rt.render(component(echo, ()));
    assert_eq!(text_of(&rt, "echo"), "");

    let field = by_id(&rt, "field");
    rt.input(field, "hello");
    assert_eq!(text_of(&rt, "echo"), "hello");
}

// =============================================================================
// Escaping
// =============================================================================

#[test]
fn test_script_child_renders_as_text() {
    let mut rt = Runtime::with_body();
    rt.render(h("p", Attrs::new(), "<script>/* escaping works */</script>"));

    let html = rt.html();
    assert!(html.contains("&lt;script&gt;"));
    assert!(!html.contains("<script>"));
}

// =============================================================================
// Replace On Kind Change
// =============================================================================

#[test]
fn test_component_swap_resets_state() {
    fn one(ctx: &mut Ctx, _: &()) -> Children {
        let (v, _set) = ctx.use_state(|| "one".to_string());
        h("p", Attrs::new().id("p"), v.as_str()).into()
    }
    fn two(ctx: &mut Ctx, _: &()) -> Children {
        let (v, _set) = ctx.use_state(|| "two".to_string());
        h("p", Attrs::new().id("p"), v.as_str()).into()
    }

    let mut rt = Runtime::with_body();
    rt.render(component(one, ()));
    assert_eq!(text_of(&rt, "p"), "one");

    // Different component function at the same position: replace, not update.
    rt.render(component(two, ()));
    assert_eq!(text_of(&rt, "p"), "two");
}
