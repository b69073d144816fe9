//! Showcase - the full sample page, rendered headlessly.
//!
//! Reproduces the hooked-hyper demo: hyperscript sample, counters, ref
//! focus, effect portal, memo, nested theme contexts, github box and a
//! hosted custom element. Renders into the in-memory document, simulates a
//! few clicks, and prints the resulting HTML.
//!
//! Run with: cargo run --example showcase

use std::rc::Rc;

use hooked::{
    children, component, fragment, h, AttrSnapshot, Attrs, Children, Context, Ctx, DocumentRef,
    ElementSpec, HostedElement, Runtime, StyleMap,
};

// =============================================================================
// Samples
// =============================================================================

/// Sets the document title once, renders nothing.
fn title(doc: &DocumentRef) -> hooked::Descriptor {
    let doc = doc.clone();
    component(
        move |ctx: &mut Ctx, _: &()| {
            let doc = doc.clone();
            ctx.use_effect((), move || doc.borrow_mut().set_title("hooked-hyper"));
            Children::new()
        },
        (),
    )
}

fn hyperscript_sample(_: &mut Ctx, _: &()) -> Children {
    children![
        h("h1", Attrs::new().class("red"), "hooked hyperscript"),
        h("p", Attrs::new(), h("strong", Attrs::new(), "Render some elements...")),
        h(
            "p",
            Attrs::new().style([("color", "blue"), ("text-transform", "uppercase")]),
            "Lorem ipsum.",
        ),
        h("p", Attrs::new(), "<script>/* escaping works */</script>"),
        h(
            "p",
            Attrs::new().style([("border", "1px solid lightgrey"), ("color", "grey")]),
            children![
                "Render web-component:",
                h(
                    "x-custom",
                    Attrs::new().set("options", serde_json::json!({"foo": "bar"})),
                    (),
                ),
            ],
        ),
        h(
            "button",
            Attrs::new()
                .style([("margin-bottom", "1em")])
                .on_click(|_| println!("[alert] clicked")),
            "Show alert",
        ),
    ]
}

#[derive(PartialEq)]
struct CounterProps {
    class: &'static str,
    initial: i64,
}

#[derive(PartialEq)]
struct ShowCountProps {
    class: &'static str,
    count: i64,
}

fn show_count(_: &mut Ctx, props: &ShowCountProps) -> Children {
    h("span", Attrs::new().class(props.class), children![props.count]).into()
}

fn counter(ctx: &mut Ctx, props: &CounterProps) -> Children {
    let initial = props.initial;
    let (count, set_count) = ctx.use_state(|| initial);
    let count = *count;
    let style = StyleMap::from([("padding", "0.8em")]);

    let dec = set_count.clone();
    let inc = set_count;
    h(
        "div",
        Attrs::new(),
        children![
            h(
                "button",
                Attrs::new().style(style.clone()).on_click(move |_| dec.set(count - 1)),
                "-",
            ),
            component(
                show_count,
                ShowCountProps {
                    class: props.class,
                    count,
                },
            ),
            h(
                "button",
                Attrs::new().style(style).on_click(move |_| inc.set(count + 1)),
                "+",
            ),
        ],
    )
    .into()
}

fn use_state_sample(_: &mut Ctx, _: &()) -> Children {
    children![
        h("h3", Attrs::new(), "useState hook example"),
        component(
            counter,
            CounterProps {
                class: "counter",
                initial: 0,
            },
        ),
        component(
            counter,
            CounterProps {
                class: "counter",
                initial: 5,
            },
        ),
    ]
}

/// Input plus a button that focuses it through a node ref.
fn use_ref_sample(doc: &DocumentRef) -> hooked::Descriptor {
    let doc = doc.clone();
    component(
        move |ctx: &mut Ctx, _: &()| {
            let input_ref = ctx.use_node_ref();
            let doc = doc.clone();
            let target = input_ref.clone();
            children![
                h("h3", Attrs::new(), "useRef hook example"),
                h("input", Attrs::new().bind_ref(&input_ref), ()),
                h(
                    "button",
                    Attrs::new().on_click(move |_| {
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
}

/// Effect writing a summary into the portal element it looks up by id.
fn use_effect_sample(doc: &DocumentRef) -> hooked::Descriptor {
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
                h(
                    "button",
                    Attrs::new().id("count-up").on_click(move |_| up.set(count + 1)),
                    "Count up",
                ),
                h(
                    "button",
                    Attrs::new().id("count-reset").on_click(move |_| reset.set(0)),
                    "Reset",
                ),
            ]
        },
        (),
    );

    fragment(children![
        h("h3", Attrs::new(), "useEffect hook example"),
        buttons,
        h("p", Attrs::new(), ()),
        h(
            "div",
            Attrs::new()
                .id("portal")
                .style([("border", "1px solid black"), ("padding", "0.5em")]),
            (),
        ),
    ])
}

fn use_memo_sample(_: &mut Ctx, _: &()) -> Children {
    let inner = component(
        |ctx: &mut Ctx, _: &()| {
            let (count, set_count) = ctx.use_state(|| 0i64);
            let count = *count;

            // Recomputes only when count crosses a multiple of five.
            let memo = ctx.use_memo((count % 5 == 0,), || count);

            let up = set_count.clone();
            let reset = set_count;
            children![
                h("div", Attrs::new(), format!("Count: {count}")),
                h(
                    "div",
                    Attrs::new().style([("padding-bottom", "1em")]),
                    format!("Memo: {memo}"),
                ),
                h(
                    "button",
                    Attrs::new().id("memo-up").on_click(move |_| up.set(count + 1)),
                    "Count up",
                ),
                h("button", Attrs::new().on_click(move |_| reset.set(0)), "Reset"),
            ]
        },
        (),
    );

    children![h("h3", Attrs::new(), "useMemo hook example"), inner]
}

// =============================================================================
// Context Sample
// =============================================================================

#[derive(Clone)]
struct Theme {
    style: StyleMap,
    toggle: Option<Rc<dyn Fn()>>,
}

impl Theme {
    fn fixed(style: StyleMap) -> Self {
        Self {
            style,
            toggle: None,
        }
    }
}

/// Provider whose value carries the active style plus a toggle callback.
fn theme_toggle_provider(theme: &Context<Theme>, body: fn(&Context<Theme>) -> Children) -> hooked::Descriptor {
    let theme = theme.clone();
    component(
        move |ctx: &mut Ctx, _: &()| {
            let palette = [
                StyleMap::from([("color", "blue"), ("background-color", "cyan"), ("padding", "0.5em")]),
                StyleMap::from([("color", "cyan"), ("background-color", "blue"), ("padding", "0.5em")]),
            ];
            let (index, set_index) = ctx.use_state(|| 0usize);
            let index = *index;

            let next = (index + 1) % palette.len();
            let toggle: Rc<dyn Fn()> = Rc::new(move || set_index.set(next));
            let value = Theme {
                style: palette[index].clone(),
                toggle: Some(toggle),
            };

            theme.provider(value, body(&theme)).into()
        },
        (),
    )
}

fn toggle_body(theme: &Context<Theme>) -> Children {
    let inner = theme.clone();
    children![h(
        "div",
        Attrs::new(),
        children![
            h(
                "div",
                Attrs::new().style([("border", "3px solid magenta")]),
                theme.consumer(|t: &Rc<Theme>, _| {
                    h(
                        "div",
                        Attrs::new().style(t.style.clone()),
                        children![
                            "With ThemeContext.Consumer,",
                            h("br", Attrs::new(), ()),
                            "wrapped in other element.",
                        ],
                    )
                    .into()
                }),
            ),
            component(
                move |ctx: &mut Ctx, _: &()| {
                    let t = ctx.use_context(&inner);
                    let toggle = t.toggle.clone();
                    children![
                        h("p", Attrs::new().style(t.style.clone()), "With useContext"),
                        h(
                            "button",
                            Attrs::new().id("theme-toggle").on_click(move |_| {
                                if let Some(toggle) = &toggle {
                                    toggle();
                                }
                            }),
                            "Toggle theme",
                        ),
                    ]
                },
                (),
            ),
        ],
    )]
}

fn use_context_sample(theme: &Context<Theme>) -> hooked::Descriptor {
    let outer = Theme::fixed(StyleMap::from([
        ("color", "red"),
        ("background-color", "yellow"),
        ("padding", "1em"),
    ]));

    fragment(children![
        h("h3", Attrs::new(), "useContext sample"),
        theme.provider(
            outer,
            children![h(
                "section",
                Attrs::new(),
                children![
                    h(
                        "div",
                        Attrs::new(),
                        theme.consumer(|t: &Rc<Theme>, _| {
                            h("p", Attrs::new().style(t.style.clone()), "Overwrite theme. Won't toggle.")
                                .into()
                        }),
                    ),
                    theme_toggle_provider(theme, toggle_body),
                ],
            )],
        ),
    ])
}

fn github(_: &mut Ctx, _: &()) -> Children {
    let border = "1px solid lightgrey";
    h(
        "section",
        Attrs::new().style([
            ("border-top", border),
            ("border-bottom", border),
            ("margin", "1em 0"),
            ("padding", "0 0 1em"),
        ]),
        children![
            h(
                "p",
                Attrs::new(),
                children![
                    "Check the code on ",
                    h(
                        "a",
                        Attrs::new()
                            .set("href", "https://github.com/commenthol/hooked-hyper")
                            .set("target", "_blank"),
                        "github",
                    ),
                    ".",
                ],
            ),
            h(
                "iframe",
                Attrs::new()
                    .set(
                        "src",
                        "https://ghbtns.com/github-btn.html?user=commenthol&repo=hooked-hyper&type=star&count=true",
                    )
                    .set("frameborder", "0")
                    .set("scrolling", "0")
                    .set("width", "170px")
                    .set("height", "20px"),
                (),
            ),
        ],
    )
    .into()
}

// =============================================================================
// Main
// =============================================================================

fn main() {
    let mut rt = Runtime::with_body();
    let doc = rt.document().clone();
    let theme: Context<Theme> = Context::new(Theme::fixed(StyleMap::new()));

    rt.render(children![
        title(&doc),
        component(hyperscript_sample, ()),
        component(use_state_sample, ()),
        use_ref_sample(&doc),
        use_effect_sample(&doc),
        component(use_memo_sample, ()),
        use_context_sample(&theme),
        component(github, ()),
    ]);

    println!("title: {}", doc.borrow().title());
    println!("\n--- initial page ---\n{}", rt.html());

    // Portal updates through the effect.
    let count_up = doc.borrow().get_element_by_id("count-up").unwrap();
    rt.click(count_up);
    let portal = doc.borrow().get_element_by_id("portal").unwrap();
    println!("\nportal after click: {}", doc.borrow().text_content(portal));

    // Theme toggles through the context callback.
    let toggle = doc.borrow().get_element_by_id("theme-toggle").unwrap();
    rt.click(toggle);
    println!("\n--- after theme toggle ---\n{}", rt.html());

    // Hosted custom element with an observed options attribute.
    let spec = ElementSpec::new("x-custom", |attrs: &AttrSnapshot| {
        let options = attrs.text("options").unwrap_or_default();
        h(
            "div",
            Attrs::new().style([
                ("padding", "0.5em"),
                ("background-color", "yellow"),
                ("color", "red"),
            ]),
            format!("<x-custom options='{options}' />"),
        )
        .into()
    })
    .observe("options");

    let mut custom = HostedElement::new(spec);
    custom.set_attribute("options", serde_json::json!({"foo": "bar"}));
    custom.connect();
    println!("\n--- hosted element shadow ---\n{}", custom.shadow_html());
}
