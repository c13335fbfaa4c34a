/// Integration tests for watched-variable delivery
///
/// A watched path's callback fires exactly once per reconciliation pass
/// with the node's latest value; registration is idempotent per path and
/// removal stops delivery immediately.
mod common;

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{json, Value};

use simtree_client::{NodePath, TreeFactory};

use common::init_logging;

fn snapshot() -> Value {
    json!({
        "e1": {
            "kind": "Entity",
            "path": "e1",
            "aspects": [
                {"kind": "Aspect", "path": "e1.a1"}
            ]
        }
    })
}

fn time_update(value: f64) -> Value {
    json!({
        "tree": {
            "kind": "AspectSubTree",
            "type": "SimulationTree",
            "path": "e1.a1.SimulationTree",
            "time": {
                "kind": "Variable",
                "path": "e1.a1.SimulationTree.time",
                "value": value,
                "unit": "ms"
            }
        }
    })
}

fn watched_factory(values: &Rc<RefCell<Vec<Value>>>) -> TreeFactory {
    let mut factory = TreeFactory::new();
    factory.build_initial(&snapshot()).unwrap();
    let sink = Rc::clone(values);
    factory.watch(
        NodePath::new("e1.a1.SimulationTree.time"),
        Box::new(move |value| sink.borrow_mut().push(value.clone())),
    );
    factory
}

#[test]
fn watched_values_are_delivered_once_per_pass() {
    init_logging();
    let values = Rc::new(RefCell::new(Vec::new()));
    let mut factory = watched_factory(&values);

    factory.reconcile(&time_update(3.14));
    assert_eq!(values.borrow().as_slice(), [json!(3.14)]);

    factory.reconcile(&time_update(6.28));
    assert_eq!(values.borrow().as_slice(), [json!(3.14), json!(6.28)]);
}

#[test]
fn watches_on_paths_with_no_live_node_stay_silent() {
    let values = Rc::new(RefCell::new(Vec::new()));
    let mut factory = TreeFactory::new();
    factory.build_initial(&snapshot()).unwrap();

    let sink = Rc::clone(&values);
    factory.watch(
        NodePath::new("e1.a1.SimulationTree.missing"),
        Box::new(move |value| sink.borrow_mut().push(value.clone())),
    );

    factory.reconcile(&time_update(1.0));
    assert!(values.borrow().is_empty());
}

#[test]
fn watches_on_valueless_nodes_stay_silent() {
    let values = Rc::new(RefCell::new(Vec::new()));
    let mut factory = TreeFactory::new();
    factory.build_initial(&snapshot()).unwrap();

    // an aspect is a container: it is live but carries no scalar value
    let sink = Rc::clone(&values);
    factory.watch(
        NodePath::new("e1.a1"),
        Box::new(move |value| sink.borrow_mut().push(value.clone())),
    );

    factory.reconcile(&time_update(1.0));
    assert!(values.borrow().is_empty());
}

#[test]
fn rewatching_a_path_replaces_the_earlier_callback() {
    let first = Rc::new(RefCell::new(Vec::new()));
    let mut factory = watched_factory(&first);

    let second = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&second);
    factory.watch(
        NodePath::new("e1.a1.SimulationTree.time"),
        Box::new(move |value| sink.borrow_mut().push(value.clone())),
    );
    assert_eq!(factory.watch_count(), 1);

    factory.reconcile(&time_update(2.0));
    assert!(first.borrow().is_empty());
    assert_eq!(second.borrow().as_slice(), [json!(2.0)]);
}

#[test]
fn unwatching_stops_delivery() {
    let values = Rc::new(RefCell::new(Vec::new()));
    let mut factory = watched_factory(&values);

    factory.reconcile(&time_update(1.0));
    factory.unwatch(&NodePath::new("e1.a1.SimulationTree.time"));
    factory.reconcile(&time_update(2.0));

    assert_eq!(values.borrow().as_slice(), [json!(1.0)]);
}

#[test]
fn unwatching_an_unknown_path_is_a_no_op() {
    let values = Rc::new(RefCell::new(Vec::new()));
    let mut factory = watched_factory(&values);

    factory.unwatch(&NodePath::new("never.watched"));
    factory.reconcile(&time_update(5.0));
    assert_eq!(values.borrow().as_slice(), [json!(5.0)]);
}

#[test]
fn discarding_the_tree_clears_the_registry() {
    let values = Rc::new(RefCell::new(Vec::new()));
    let mut factory = watched_factory(&values);
    factory.reconcile(&time_update(1.0));

    factory.discard();
    assert_eq!(factory.watch_count(), 0);

    // a rebuilt tree delivers nothing for the stale registration
    factory.build_initial(&snapshot()).unwrap();
    factory.reconcile(&time_update(2.0));
    assert_eq!(values.borrow().as_slice(), [json!(1.0)]);
}
