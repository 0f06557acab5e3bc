//! Counter Example - mount, click, re-render
//!
//! Demonstrates:
//! - A stateful definition with a click handler
//! - A parent listening to a child's emitted event
//! - Resolving the composed tree to markup
//!
//! Run with: RUST_LOG=spark_compose=debug cargo run --example counter

use spark_compose::{
    to_markup, Definition, Engine, Handler, Node, Props, State, TextAdapter, Value,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let counter = Definition::builder("Counter")
        .state(|props| State::new().with("count", props.get_int("start")))
        .render(|props, state, _| {
            Node::element("button")
                .prop("label", props.get_str("label"))
                .on(
                    "click",
                    Handler::new(|cx, _| {
                        let next = cx.state().get_int("count") + 1;
                        cx.set_state(move |s| {
                            s.set("count", next);
                        });
                        cx.emit("changed", next);
                    }),
                )
                .text(state.get_int("count").to_string())
                .build()
        })
        .build()?;

    let app = Definition::builder("App")
        .state(|_| State::new().with("total", 0))
        .render(|_, state, _| {
            let bump = || {
                Handler::new(|cx, _| {
                    cx.set_state(|s| {
                        s.set("total", s.get_int("total") + 1);
                    })
                })
            };
            Node::element("main")
                .child(Node::element("h1").text(format!("clicks: {}", state.get_int("total"))).build()?)
                .child(
                    Node::component("Counter")
                        .prop("label", "left")
                        .on("changed", bump())
                        .build()?,
                )
                .child(
                    Node::component("Counter")
                        .prop("label", "right")
                        .prop("start", 10)
                        .on("changed", bump())
                        .build()?,
                )
                .build()
        })
        .child("Counter", counter)
        .build()?;

    let mut engine = Engine::new(TextAdapter::new());
    let root = engine.mount(&app, Props::new(), "#app".to_string())?;
    println!("{}", to_markup(&engine.resolve(root)?));

    let right = engine.instance(root)?.child_at(1).ok_or("right counter missing")?;
    for _ in 0..3 {
        engine.dispatch(right, &[], "click", Value::Null)?;
    }
    println!("{}", to_markup(&engine.resolve(root)?));

    engine.unmount(root)?;
    println!(
        "realized {} / updated {} / released {}",
        engine.adapter().realize_count(),
        engine.adapter().update_count(),
        engine.adapter().release_count()
    );
    Ok(())
}
