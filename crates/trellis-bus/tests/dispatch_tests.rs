//! Integration tests for the dispatch engine.
//!
//! Covers the complete flow of:
//! - Hierarchy walk order and argument truncation
//! - Weak listener ownership and lazy pruning
//! - Scoped filters, ignore, and consolidation
//! - Relationship, stage, and enablement eligibility
//! - Re-entrant sends and the failure contract

use serde_json::{json, Value};
use std::any::Any;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};
use trellis_bus::{
    BusConfig, Envelope, FlatTopology, InvokeError, ListenerOpts, MessageBus, Topology,
};
use trellis_shape::{Catalog, ParamKind, ShapeDef};
use trellis_types::{ErrorCode, PartId, Relation, RelationMask, Stage, StageMask};

// =============================================================================
// Test Fixtures
// =============================================================================

type Log = Rc<RefCell<Vec<String>>>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Assembly tree for relationship tests, with togglable enablement.
struct TreeTopology {
    parent: HashMap<PartId, PartId>,
    disabled: RefCell<HashSet<PartId>>,
}

impl TreeTopology {
    /// Edges are (child, parent).
    fn new(edges: &[(PartId, PartId)]) -> Self {
        Self {
            parent: edges.iter().copied().collect(),
            disabled: RefCell::default(),
        }
    }

    fn disable(&self, part: PartId) {
        self.disabled.borrow_mut().insert(part);
    }

    fn enable(&self, part: PartId) {
        self.disabled.borrow_mut().remove(&part);
    }
}

impl Topology for TreeTopology {
    fn relation_of(&self, source: PartId, listener: PartId) -> Relation {
        if source == listener {
            Relation::Same
        } else if self.parent.get(&listener) == Some(&source) {
            Relation::Parent
        } else if self.parent.get(&source) == Some(&listener) {
            Relation::Child
        } else if let (Some(a), Some(b)) = (self.parent.get(&source), self.parent.get(&listener)) {
            if a == b {
                Relation::Sibling
            } else {
                Relation::Unknown
            }
        } else {
            Relation::Unknown
        }
    }

    fn is_enabled(&self, part: PartId) -> bool {
        !self.disabled.borrow().contains(&part)
    }
}

/// Catalog used across most tests:
///
/// ```text
/// Refitted(a, b) ← EngineRefitted(a, b, c)     concrete two-level chain
/// PhysicsChanged (abstract) ← MassChanged(mass)
/// ModelChanged
/// ```
fn test_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog
        .register(
            ShapeDef::new("Refitted")
                .with_param("a", ParamKind::Any)
                .with_param("b", ParamKind::Any),
        )
        .unwrap();
    catalog
        .register(
            ShapeDef::new("EngineRefitted")
                .with_parent("Refitted")
                .with_param("a", ParamKind::Any)
                .with_param("b", ParamKind::Any)
                .with_param("c", ParamKind::Any),
        )
        .unwrap();
    catalog
        .register(ShapeDef::new("PhysicsChanged").abstract_only())
        .unwrap();
    catalog
        .register(
            ShapeDef::new("MassChanged")
                .with_parent("PhysicsChanged")
                .with_param("mass", ParamKind::Float),
        )
        .unwrap();
    catalog.register(ShapeDef::new("ModelChanged")).unwrap();
    catalog
}

fn flat_bus() -> Rc<MessageBus> {
    MessageBus::new(test_catalog(), Rc::new(FlatTopology))
}

/// Handler that appends a tag to the log, along with the delivered args.
fn record(log: &Log, tag: &str) -> impl Fn(&Envelope<'_>) -> Result<(), InvokeError> + 'static {
    let log = log.clone();
    let tag = tag.to_string();
    move |envelope| {
        log.borrow_mut()
            .push(format!("{tag}:{}", Value::from(envelope.args.to_vec())));
        Ok(())
    }
}

fn listen(
    bus: &Rc<MessageBus>,
    anchor: &Rc<()>,
    owner: PartId,
    shape: &str,
    arity: usize,
    handler: impl Fn(&Envelope<'_>) -> Result<(), InvokeError> + 'static,
) {
    let weak: Weak<dyn Any> = Rc::downgrade(&(anchor.clone() as Rc<dyn Any>));
    bus.add_listener(
        weak,
        owner,
        shape,
        &vec![ParamKind::Any; arity],
        ListenerOpts::default().from_relations(RelationMask::ANY),
        handler,
    )
    .unwrap();
}

// =============================================================================
// Hierarchy walk and truncation
// =============================================================================

#[test]
fn hierarchy_walk_most_specific_first_insertion_order_within() {
    let bus = flat_bus();
    bus.set_stage(Stage::Live);
    let anchor = Rc::new(());
    let part = PartId::named("pod");
    let log: Log = Rc::default();

    // Registration interleaves shapes on purpose: delivery groups by shape,
    // not by registration time.
    listen(&bus, &anchor, part, "Refitted", 2, record(&log, "base1"));
    listen(&bus, &anchor, part, "EngineRefitted", 3, record(&log, "derived1"));
    listen(&bus, &anchor, part, "Refitted", 2, record(&log, "base2"));
    listen(&bus, &anchor, part, "EngineRefitted", 3, record(&log, "derived2"));

    bus.send(part, "EngineRefitted", &[json!(1), json!(2), json!(3)])
        .unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            "derived1:[1,2,3]",
            "derived2:[1,2,3]",
            "base1:[1,2]",
            "base2:[1,2]",
        ]
    );
}

#[test]
fn truncation_is_min_of_sent_and_listener_arity() {
    let bus = flat_bus();
    let anchor = Rc::new(());
    let part = PartId::named("pod");
    let log: Log = Rc::default();

    listen(&bus, &anchor, part, "Refitted", 2, record(&log, "base"));

    // Sending the base shape with its exact arity delivers untouched.
    bus.send(part, "Refitted", &[json!("x"), json!("y")]).unwrap();
    assert_eq!(log.borrow().last().unwrap(), "base:[\"x\",\"y\"]");

    // Oversized argument lists are truncated to the shape's own arity too.
    log.borrow_mut().clear();
    bus.send(part, "Refitted", &[json!(1), json!(2), json!(3), json!(4)])
        .unwrap();
    assert_eq!(log.borrow().last().unwrap(), "base:[1,2]");
}

#[test]
fn abstract_send_rejected_and_nothing_invoked() {
    let bus = flat_bus();
    let anchor = Rc::new(());
    let part = PartId::named("pod");
    let log: Log = Rc::default();

    listen(&bus, &anchor, part, "PhysicsChanged", 0, record(&log, "physics"));
    listen(&bus, &anchor, part, "MassChanged", 1, record(&log, "mass"));

    let err = bus.send(part, "PhysicsChanged", &[]).unwrap_err();
    assert_eq!(err.code(), "BUS_ABSTRACT_SEND");
    assert!(log.borrow().is_empty());

    // The concrete child reaches both, child listener first.
    bus.send(part, "MassChanged", &[json!(2.5)]).unwrap();
    assert_eq!(*log.borrow(), vec!["mass:[2.5]", "physics:[]"]);
}

// =============================================================================
// Weak ownership
// =============================================================================

#[test]
fn dead_listener_is_never_invoked_and_pruned_by_send() {
    let bus = flat_bus();
    let part = PartId::named("pod");
    let log: Log = Rc::default();

    let doomed = Rc::new(());
    listen(&bus, &doomed, part, "ModelChanged", 0, record(&log, "doomed"));
    let survivor = Rc::new(());
    listen(&bus, &survivor, part, "ModelChanged", 0, record(&log, "survivor"));
    assert_eq!(bus.listener_count("ModelChanged"), 2);

    drop(doomed);
    bus.send(part, "ModelChanged", &[]).unwrap();

    assert_eq!(*log.borrow(), vec!["survivor:[]"]);
    assert_eq!(bus.listener_count("ModelChanged"), 1);
}

#[test]
fn dead_listeners_linger_until_dispatched_through() {
    let bus = flat_bus();
    let part = PartId::named("pod");

    let doomed = Rc::new(());
    listen(&bus, &doomed, part, "ModelChanged", 0, |_| Ok(()));
    drop(doomed);

    // Lazy policy: nothing shrinks until a send walks the bucket.
    assert_eq!(bus.listener_count("ModelChanged"), 1);
    bus.send(part, "ModelChanged", &[]).unwrap();
    assert_eq!(bus.listener_count("ModelChanged"), 0);
}

// =============================================================================
// Filters
// =============================================================================

#[test]
fn handled_filter_suppresses_whole_hierarchy_for_matching_sends_only() {
    let bus = flat_bus();
    let anchor = Rc::new(());
    let part = PartId::named("pod");
    let log: Log = Rc::default();

    listen(&bus, &anchor, part, "MassChanged", 1, record(&log, "mass"));
    listen(&bus, &anchor, part, "PhysicsChanged", 0, record(&log, "physics"));
    listen(&bus, &anchor, part, "ModelChanged", 0, record(&log, "model"));

    {
        let _scope = bus
            .acquire_filter(|_| true, None, &["MassChanged"])
            .unwrap();
        bus.send(part, "MassChanged", &[json!(1.0)]).unwrap();
        assert!(log.borrow().is_empty(), "ancestor listeners must not fire");

        // An unrelated shape is untouched by the filter.
        bus.send(part, "ModelChanged", &[]).unwrap();
        assert_eq!(*log.borrow(), vec!["model:[]"]);
    }

    // Scope released: delivery resumes.
    bus.send(part, "MassChanged", &[json!(2.0)]).unwrap();
    assert_eq!(*log.borrow(), vec!["model:[]", "mass:[2.0]", "physics:[]"]);
}

#[test]
fn filters_run_newest_first() {
    let bus = flat_bus();
    let part = PartId::named("pod");
    let order: Log = Rc::default();

    let older = {
        let order = order.clone();
        bus.acquire_filter(
            move |_| {
                order.borrow_mut().push("older".into());
                true
            },
            None,
            &[],
        )
        .unwrap()
    };
    let newer = {
        let order = order.clone();
        bus.acquire_filter(
            move |_| {
                order.borrow_mut().push("newer".into());
                false
            },
            None,
            &[],
        )
        .unwrap()
    };

    bus.send(part, "ModelChanged", &[]).unwrap();
    assert_eq!(*order.borrow(), vec!["newer", "older"]);

    drop(newer);
    drop(older);
}

#[test]
fn filters_release_out_of_order() {
    let bus = flat_bus();
    let anchor = Rc::new(());
    let part = PartId::named("pod");
    let log: Log = Rc::default();
    listen(&bus, &anchor, part, "ModelChanged", 0, record(&log, "m"));

    let first = bus.acquire_ignore(None, &["ModelChanged"]).unwrap();
    let second = bus.acquire_ignore(None, &["ModelChanged"]).unwrap();

    // Release the older scope first; the newer one still suppresses.
    first.release();
    bus.send(part, "ModelChanged", &[]).unwrap();
    assert!(log.borrow().is_empty());

    second.release();
    bus.send(part, "ModelChanged", &[]).unwrap();
    assert_eq!(*log.borrow(), vec!["m:[]"]);
}

#[test]
fn filter_source_match_restricts_to_one_sender() {
    let bus = flat_bus();
    let anchor = Rc::new(());
    let engine = PartId::named("engine");
    let tank = PartId::named("tank");
    let log: Log = Rc::default();
    listen(&bus, &anchor, engine, "ModelChanged", 0, record(&log, "m"));

    let _scope = bus.acquire_ignore(Some(tank), &["ModelChanged"]).unwrap();
    bus.send(tank, "ModelChanged", &[]).unwrap();
    assert!(log.borrow().is_empty());

    bus.send(engine, "ModelChanged", &[]).unwrap();
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn filter_shape_set_expands_to_ancestors() {
    let bus = flat_bus();
    let anchor = Rc::new(());
    let part = PartId::named("pod");
    let log: Log = Rc::default();
    listen(&bus, &anchor, part, "Refitted", 2, record(&log, "base"));

    // Acquired for the derived shape, but a direct send of its parent is
    // intercepted too.
    let _scope = bus.acquire_ignore(None, &["EngineRefitted"]).unwrap();
    bus.send(part, "Refitted", &[json!(1), json!(2)]).unwrap();
    assert!(log.borrow().is_empty());
}

// =============================================================================
// Consolidation
// =============================================================================

#[test]
fn consolidator_dedups_and_replays_in_first_seen_order() {
    let bus = flat_bus();
    let anchor = Rc::new(());
    let part = PartId::named("pod");
    let log: Log = Rc::default();
    listen(&bus, &anchor, part, "MassChanged", 1, record(&log, "mass"));

    {
        let _scope = bus.acquire_consolidator(None, &["MassChanged"]).unwrap();
        bus.send(part, "MassChanged", &[json!(1.0)]).unwrap();
        bus.send(part, "MassChanged", &[json!(1.0)]).unwrap();
        bus.send(part, "MassChanged", &[json!(2.0)]).unwrap();
        assert!(log.borrow().is_empty(), "consolidator must suppress delivery");
    }

    // Two unique messages, original order, each exactly once.
    assert_eq!(*log.borrow(), vec!["mass:[1.0]", "mass:[2.0]"]);
}

#[test]
fn consolidator_keeps_distinct_sources_distinct() {
    let bus = flat_bus();
    let anchor = Rc::new(());
    let engine = PartId::named("engine");
    let tank = PartId::named("tank");
    let seen: Log = Rc::default();
    {
        let seen = seen.clone();
        listen(&bus, &anchor, engine, "MassChanged", 1, move |envelope| {
            seen.borrow_mut().push(envelope.source.to_string());
            Ok(())
        });
    }

    {
        let _scope = bus.acquire_consolidator(None, &["MassChanged"]).unwrap();
        bus.send(engine, "MassChanged", &[json!(1.0)]).unwrap();
        bus.send(tank, "MassChanged", &[json!(1.0)]).unwrap();
    }

    assert_eq!(*seen.borrow(), vec![engine.to_string(), tank.to_string()]);
}

#[test]
fn consolidator_replay_still_passes_remaining_filters() {
    let bus = flat_bus();
    let anchor = Rc::new(());
    let part = PartId::named("pod");
    let log: Log = Rc::default();
    listen(&bus, &anchor, part, "ModelChanged", 0, record(&log, "m"));

    let outer = bus.acquire_ignore(None, &["ModelChanged"]).unwrap();
    {
        let _inner = bus.acquire_consolidator(None, &["ModelChanged"]).unwrap();
        bus.send(part, "ModelChanged", &[]).unwrap();
    }
    // The replay escaped the consolidator but the outer ignore still holds.
    assert!(log.borrow().is_empty());

    outer.release();
    bus.send(part, "ModelChanged", &[]).unwrap();
    assert_eq!(log.borrow().len(), 1);
}

// =============================================================================
// Eligibility: relationship, stage, enablement
// =============================================================================

/// Three-part assembly: root ─ left, right (siblings under root).
fn family() -> (Rc<TreeTopology>, PartId, PartId, PartId) {
    let root = PartId::named("root");
    let left = PartId::named("left");
    let right = PartId::named("right");
    let topo = Rc::new(TreeTopology::new(&[(left, root), (right, root)]));
    (topo, root, left, right)
}

#[test]
fn relationship_masks_filter_by_topology() {
    init_tracing();
    let (topo, root, left, right) = family();
    let bus = MessageBus::new(test_catalog(), topo);
    let anchor = Rc::new(());
    let log: Log = Rc::default();

    // Root listens only to its children.
    {
        let weak: Weak<dyn Any> = Rc::downgrade(&(anchor.clone() as Rc<dyn Any>));
        bus.add_listener(
            weak,
            root,
            "ModelChanged",
            &[],
            ListenerOpts::default().from_relations(RelationMask::CHILD),
            record(&log, "root-from-child"),
        )
        .unwrap();
    }
    // Left listens only to its siblings.
    {
        let weak: Weak<dyn Any> = Rc::downgrade(&(anchor.clone() as Rc<dyn Any>));
        bus.add_listener(
            weak,
            left,
            "ModelChanged",
            &[],
            ListenerOpts::default().from_relations(RelationMask::SIBLING),
            record(&log, "left-from-sibling"),
        )
        .unwrap();
    }

    bus.send(right, "ModelChanged", &[]).unwrap();
    let mut heard = log.borrow().clone();
    heard.sort();
    assert_eq!(heard, vec!["left-from-sibling:[]", "root-from-child:[]"]);

    // A send from the root itself matches neither mask.
    log.borrow_mut().clear();
    bus.send(root, "ModelChanged", &[]).unwrap();
    assert!(log.borrow().is_empty());
}

#[test]
fn default_relation_mask_is_own_part_only() {
    let (topo, root, left, _) = family();
    let bus = MessageBus::new(test_catalog(), topo);
    let anchor = Rc::new(());
    let log: Log = Rc::default();

    let weak: Weak<dyn Any> = Rc::downgrade(&(anchor.clone() as Rc<dyn Any>));
    bus.add_listener(
        weak,
        left,
        "ModelChanged",
        &[],
        ListenerOpts::default(),
        record(&log, "left"),
    )
    .unwrap();

    bus.send(root, "ModelChanged", &[]).unwrap();
    assert!(log.borrow().is_empty());
    bus.send(left, "ModelChanged", &[]).unwrap();
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn disabled_part_is_skipped_but_not_removed() {
    let (topo, _, left, _) = family();
    let bus = MessageBus::new(test_catalog(), topo.clone());
    let anchor = Rc::new(());
    let log: Log = Rc::default();
    listen(&bus, &anchor, left, "ModelChanged", 0, record(&log, "left"));

    topo.disable(left);
    bus.send(left, "ModelChanged", &[]).unwrap();
    assert!(log.borrow().is_empty());
    assert_eq!(bus.listener_count("ModelChanged"), 1);

    topo.enable(left);
    bus.send(left, "ModelChanged", &[]).unwrap();
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn stage_mask_tracks_bus_stage() {
    let bus = flat_bus();
    let anchor = Rc::new(());
    let part = PartId::named("pod");
    let log: Log = Rc::default();

    let weak: Weak<dyn Any> = Rc::downgrade(&(anchor.clone() as Rc<dyn Any>));
    bus.add_listener(
        weak,
        part,
        "ModelChanged",
        &[],
        ListenerOpts::default()
            .in_stages(StageMask::EDITOR)
            .from_relations(RelationMask::ANY),
        record(&log, "editor-gizmo"),
    )
    .unwrap();

    bus.set_stage(Stage::Live);
    bus.send(part, "ModelChanged", &[]).unwrap();
    assert!(log.borrow().is_empty());

    bus.set_stage(Stage::Editor);
    bus.send(part, "ModelChanged", &[]).unwrap();
    assert_eq!(*log.borrow(), vec!["editor-gizmo:[]"]);
}

// =============================================================================
// Re-entrancy and dispatch context
// =============================================================================

#[test]
fn listener_can_send_reentrantly() {
    let bus = flat_bus();
    let anchor = Rc::new(());
    let part = PartId::named("pod");
    let log: Log = Rc::default();

    let weak_bus = Rc::downgrade(&bus);
    {
        let log = log.clone();
        listen(&bus, &anchor, part, "MassChanged", 1, move |envelope| {
            log.borrow_mut().push("mass".into());
            let bus = weak_bus.upgrade().expect("bus alive");
            assert_eq!(bus.dispatch_depth(), 1);
            bus.send(envelope.source, "ModelChanged", &[])
                .map_err(|e| InvokeError::failed(e.to_string()))
        });
    }
    {
        let log = log.clone();
        let weak_bus = Rc::downgrade(&bus);
        listen(&bus, &anchor, part, "ModelChanged", 0, move |_| {
            let bus = weak_bus.upgrade().expect("bus alive");
            assert_eq!(bus.dispatch_depth(), 2);
            let info = bus.current_dispatch().expect("inside a send");
            log.borrow_mut().push(format!("model-during-{}", info.shape));
            Ok(())
        });
    }

    bus.send(part, "MassChanged", &[json!(1.0)]).unwrap();
    assert_eq!(*log.borrow(), vec!["mass", "model-during-ModelChanged"]);
    assert_eq!(bus.dispatch_depth(), 0);
}

#[test]
fn current_dispatch_reports_source_shape_and_ancestors() {
    let bus = flat_bus();
    let anchor = Rc::new(());
    let part = PartId::named("pod");
    let seen: Rc<RefCell<Option<(PartId, String, Vec<String>)>>> = Rc::default();

    {
        let seen = seen.clone();
        let weak_bus = Rc::downgrade(&bus);
        listen(&bus, &anchor, part, "Refitted", 2, move |_| {
            let bus = weak_bus.upgrade().expect("bus alive");
            let info = bus.current_dispatch().expect("inside a send");
            *seen.borrow_mut() = Some((info.source, info.shape, info.ancestors));
            Ok(())
        });
    }

    bus.send(part, "EngineRefitted", &[json!(1), json!(2), json!(3)])
        .unwrap();

    let (source, shape, ancestors) = seen.borrow().clone().expect("listener ran");
    assert_eq!(source, part);
    // The frame tracks the shape as sent, not the ancestor being delivered.
    assert_eq!(shape, "EngineRefitted");
    assert_eq!(ancestors, vec!["EngineRefitted", "Refitted"]);
}

#[test]
fn depth_limit_stops_runaway_recursion() {
    let bus = MessageBus::with_config(
        test_catalog(),
        Rc::new(FlatTopology),
        BusConfig::default().with_max_depth(4),
    );
    let anchor = Rc::new(());
    let part = PartId::named("pod");
    let depth_errors: Rc<RefCell<u32>> = Rc::default();
    let invocations: Rc<RefCell<u32>> = Rc::default();

    {
        let weak_bus = Rc::downgrade(&bus);
        let depth_errors = depth_errors.clone();
        let invocations = invocations.clone();
        listen(&bus, &anchor, part, "ModelChanged", 0, move |envelope| {
            *invocations.borrow_mut() += 1;
            let bus = weak_bus.upgrade().expect("bus alive");
            if let Err(err) = bus.send(envelope.source, "ModelChanged", &[]) {
                assert_eq!(err.code(), "BUS_DEPTH_EXCEEDED");
                *depth_errors.borrow_mut() += 1;
            }
            Ok(())
        });
    }

    bus.send(part, "ModelChanged", &[]).unwrap();
    assert_eq!(*invocations.borrow(), 4);
    assert_eq!(*depth_errors.borrow(), 1);
}

#[test]
fn listeners_registered_mid_send_fire_next_send() {
    let bus = flat_bus();
    let anchor = Rc::new(());
    let part = PartId::named("pod");
    let log: Log = Rc::default();

    {
        let weak_bus = Rc::downgrade(&bus);
        let log = log.clone();
        let anchor2 = anchor.clone();
        listen(&bus, &anchor, part, "ModelChanged", 0, move |_| {
            let bus = weak_bus.upgrade().expect("bus alive");
            // Register a sibling listener while this send is in flight.
            if bus.listener_count("ModelChanged") == 1 {
                let weak: Weak<dyn Any> = Rc::downgrade(&(anchor2.clone() as Rc<dyn Any>));
                bus.add_listener(
                    weak,
                    PartId::named("pod"),
                    "ModelChanged",
                    &[],
                    ListenerOpts::default().from_relations(RelationMask::ANY),
                    record(&log, "late"),
                )
                .map_err(|e| InvokeError::failed(e.to_string()))?;
            }
            log.borrow_mut().push("early".into());
            Ok(())
        });
    }

    bus.send(part, "ModelChanged", &[]).unwrap();
    assert_eq!(*log.borrow(), vec!["early"]);

    bus.send(part, "ModelChanged", &[]).unwrap();
    assert_eq!(*log.borrow(), vec!["early", "early", "late:[]"]);
}

// =============================================================================
// Failure contract
// =============================================================================

#[test]
fn handler_failure_aborts_remaining_walk() {
    let bus = flat_bus();
    let anchor = Rc::new(());
    let part = PartId::named("pod");
    let log: Log = Rc::default();

    listen(&bus, &anchor, part, "MassChanged", 1, |_| {
        Err(InvokeError::failed("negative mass"))
    });
    listen(&bus, &anchor, part, "MassChanged", 1, record(&log, "second"));
    listen(&bus, &anchor, part, "PhysicsChanged", 0, record(&log, "ancestor"));

    let err = bus.send(part, "MassChanged", &[json!(-1.0)]).unwrap_err();
    assert_eq!(err.code(), "BUS_LISTENER_FAILED");
    assert!(err.to_string().contains("negative mass"));
    assert!(log.borrow().is_empty(), "walk must stop at the failure");

    // The frame stack is balanced even on the error path.
    assert_eq!(bus.dispatch_depth(), 0);
}

#[test]
fn target_gone_is_logged_and_skipped() {
    init_tracing();
    let bus = flat_bus();
    let anchor = Rc::new(());
    let part = PartId::named("pod");
    let log: Log = Rc::default();

    listen(&bus, &anchor, part, "ModelChanged", 0, |_| {
        Err(InvokeError::TargetGone)
    });
    listen(&bus, &anchor, part, "ModelChanged", 0, record(&log, "after"));

    // The race is swallowed; delivery continues and the send succeeds.
    bus.send(part, "ModelChanged", &[]).unwrap();
    assert_eq!(*log.borrow(), vec!["after:[]"]);
}

// =============================================================================
// Bridging
// =============================================================================

#[test]
fn producer_raise_flows_through_filters_and_hierarchy() {
    let bus = flat_bus();
    let anchor = Rc::new(());
    let part = PartId::named("pod");
    let log: Log = Rc::default();
    listen(&bus, &anchor, part, "MassChanged", 1, record(&log, "mass"));
    listen(&bus, &anchor, part, "PhysicsChanged", 0, record(&log, "physics"));

    let producer = bus.producer(part, "MassChanged").unwrap();

    {
        let _mute = bus.acquire_ignore(None, &["MassChanged"]).unwrap();
        producer.raise(&[json!(1.0)]).unwrap();
        assert!(log.borrow().is_empty());
    }

    producer.raise(&[json!(2.0)]).unwrap();
    assert_eq!(*log.borrow(), vec!["mass:[2.0]", "physics:[]"]);
    assert_eq!(producer.shape_name(), "MassChanged");
    assert_eq!(producer.owner(), part);
}
