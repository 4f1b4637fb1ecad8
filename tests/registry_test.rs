use bpmn_runtime::runtime::action::Action;
use bpmn_runtime::runtime::event::{DefaultEventEmitter, EventEmitter, EventRegistry, InMemoryEventRegistry};
use bpmn_runtime::runtime::storage::{InMemoryProcessStore, ProcessStore};
use bpmn_runtime::{EngineError, Event, NodeRef, Properties, State};
use serde_json::json;

const GROUP: &str = "default";

#[test]
fn test_subscriptions_keep_registration_order() {
    let registry = InMemoryEventRegistry::new();
    let event = Event::message(GROUP, "order-placed");
    let first = NodeRef::fresh(GROUP, "billing", "wait");
    let second = NodeRef::fresh(GROUP, "shipping", "wait");

    registry.create_subscription(&event, first.clone(), true);
    registry.create_subscription(&event, second.clone(), false);

    let subs = registry.get_subscriptions(&event);
    assert_eq!(subs.len(), 2);
    assert_eq!(subs[0].node_ref, first);
    assert!(subs[0].consumable);
    assert_eq!(subs[1].node_ref, second);
    assert!(!subs[1].consumable);
}

#[test]
fn test_duplicate_subscription_is_stored_once() {
    let registry = InMemoryEventRegistry::new();
    let event = Event::signal(GROUP, "tick");
    let node_ref = NodeRef::definition(GROUP, "clock", "start");

    registry.create_subscription(&event, node_ref.clone(), false);
    registry.create_subscription(&event, node_ref, false);

    assert_eq!(registry.len(), 1);
}

#[test]
fn test_delete_is_idempotent() {
    let registry = InMemoryEventRegistry::new();
    let event = Event::message(GROUP, "paid");
    let node_ref = NodeRef::fresh(GROUP, "payment", "wait");

    registry.create_subscription(&event, node_ref.clone(), true);
    registry.delete_subscription(&event, &node_ref);
    registry.delete_subscription(&event, &node_ref);
    registry.delete_subscription(&Event::message(GROUP, "never-seen"), &node_ref);

    assert!(registry.get_subscriptions(&event).is_empty());
    assert!(registry.is_empty());
}

#[test]
fn test_events_are_scoped_by_group_and_kind() {
    let registry = InMemoryEventRegistry::new();
    let node_ref = NodeRef::fresh(GROUP, "p", "wait");
    registry.create_subscription(&Event::message(GROUP, "go"), node_ref, true);

    assert!(registry.get_subscriptions(&Event::signal(GROUP, "go")).is_empty());
    assert!(registry.get_subscriptions(&Event::message("tenant-b", "go")).is_empty());
    assert_eq!(registry.get_subscriptions(&Event::message(GROUP, "go")).len(), 1);
}

#[test]
fn test_emitter_resumes_and_consumes() {
    let registry = InMemoryEventRegistry::new();
    let event = Event::error(GROUP, "boom");
    let once = NodeRef::fresh(GROUP, "guarded", "on-failure");
    let always = NodeRef::fresh(GROUP, "audit", "on-failure");
    registry.create_subscription(&event, once.clone(), true);
    registry.create_subscription(&event, always.clone(), false);

    let actions = DefaultEventEmitter.emit(&event, &registry);

    let resumed: Vec<NodeRef> = actions
        .into_iter()
        .map(|a| match a {
            Action::Resume(r) => r.reference,
            other => panic!("unexpected action {:?}", other),
        })
        .collect();
    assert_eq!(resumed, vec![once, always.clone()]);

    let left = registry.get_subscriptions(&event);
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].node_ref, always);
}

#[test]
fn test_emit_without_subscribers_is_empty() {
    let registry = InMemoryEventRegistry::new();
    let actions = DefaultEventEmitter.emit(&Event::message(GROUP, "lost"), &registry);
    assert!(actions.is_empty());
}

#[test]
fn test_node_refs_identity() {
    let host = NodeRef::fresh(GROUP, "orders", "review");

    let next = host.visit("ship");
    assert_eq!(next.node_id, "ship");
    assert_ne!(next.instance_id, host.instance_id);
    assert_ne!(next.token_id, host.token_id);

    let boundary = host.at_node("timeout");
    assert_eq!(boundary.instance_id, host.instance_id);
    assert_eq!(boundary.token_id, host.token_id);
    assert_ne!(boundary, host);

    assert_eq!(
        NodeRef::definition(GROUP, "orders", "start"),
        NodeRef::definition(GROUP, "orders", "start")
    );
    assert_eq!(host.process_ref().to_string(), "default/orders");
}

#[test]
fn test_state_merge_prefers_incoming_values() {
    let mut props = Properties::new();
    props.insert("amount".into(), json!(10));
    props.insert("order".into(), json!("A1"));
    let mut state = State::new(props, NodeRef::fresh(GROUP, "payment", "wait"), Properties::new());

    let mut incoming = Properties::new();
    incoming.insert("amount".into(), json!(15));
    let mut header = Properties::new();
    header.insert("trace".into(), json!("t-9"));
    state.merge(incoming, header);

    assert_eq!(state["amount"], json!(15));
    assert_eq!(state["order"], json!("A1"));
    assert_eq!(state["missing"], json!(null));
    assert_eq!(state.header.get("trace"), Some(&json!("t-9")));
}

#[tokio::test]
async fn test_store_keys_states_by_visit() {
    let store = InMemoryProcessStore::new();
    let node_ref = NodeRef::fresh(GROUP, "payment", "wait");
    let state = State::new(Properties::new(), node_ref.clone(), Properties::new());

    store.write_state(&state).await.unwrap();
    assert_eq!(store.read_state(&node_ref).await.unwrap(), state);
    assert_eq!(store.state_count(), 1);

    let other_visit = node_ref.visit("wait");
    let err = store.read_state(&other_visit).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<EngineError>(), Some(EngineError::StateNotFound(_))));

    let err = store
        .read_process(&other_visit.process_ref())
        .await
        .unwrap_err();
    assert!(matches!(err.downcast_ref::<EngineError>(), Some(EngineError::ProcessNotFound(_))));
}
