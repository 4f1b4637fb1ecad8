use bpmn_runtime::compiler::core::Compiler;
use bpmn_runtime::dsl::builder::ProcessBuilder;
use bpmn_runtime::dsl::{Mapping, NodeType, ProcessDefinition, Trigger};
use bpmn_runtime::runtime::node::Node;
use bpmn_runtime::{EngineError, EventKind};

fn reason(process: &ProcessDefinition) -> String {
    let err = Compiler::new(process).compile().unwrap_err();
    match err.downcast_ref::<EngineError>() {
        Some(EngineError::InvalidDefinition { reason, .. }) => reason.clone(),
        other => panic!("expected InvalidDefinition, got {:?}", other),
    }
}

#[test]
fn test_compile_linear_process() {
    let process = ProcessBuilder::new("linear")
        .start("start")
        .service("step1", "log")
        .param("msg", "hello")
        .build()
        .end("end")
        .connect("start", "step1")
        .connect("step1", "end")
        .build();

    let nodes = Compiler::new(&process).compile().expect("compilation failed");

    assert_eq!(nodes.len(), 3);
    assert_eq!(nodes["step1"].id(), "step1");
}

#[test]
fn test_every_node_kind_compiles() {
    let process = ProcessBuilder::new("catalogue")
        .start("start")
        .task("plain")
        .node("rules", NodeType::BusinessRuleTask)
        .node("manual", NodeType::ManualTask)
        .user_task("approve")
        .receive("receive", "paid")
        .send("send", "shipped")
        .catch_event("catch", EventKind::Signal, "go")
        .throw_event("throw", EventKind::Signal, "done")
        .boundary("guard", "approve", EventKind::Message, "cancel")
        .call_activity(
            "child",
            "other",
            vec![Mapping::Variable { source: "a".into(), target: "b".into() }],
            vec![Mapping::Expression { source: "b + 1".into(), target: "c".into() }],
        )
        .exclusive_gateway("gw", None)
        .end("end")
        .connect("start", "plain")
        .connect("plain", "end")
        .build();

    let nodes = Compiler::new(&process).compile().expect("compilation failed");
    assert_eq!(nodes.len(), process.nodes.len());
}

#[test]
fn test_duplicate_node_ids_rejected() {
    let process = ProcessBuilder::new("dup")
        .start("start")
        .task("step")
        .task("step")
        .end("end")
        .build();

    assert!(reason(&process).contains("duplicate node id"));
}

#[test]
fn test_missing_start_rejected() {
    let process = ProcessBuilder::new("headless")
        .task("step")
        .end("end")
        .connect("step", "end")
        .build();

    assert_eq!(reason(&process), "no start event");
}

#[test]
fn test_unknown_flow_endpoint_rejected() {
    let process = ProcessBuilder::new("dangling")
        .start("start")
        .connect("ghost", "start")
        .build();

    assert!(reason(&process).contains("ghost"));
}

#[test]
fn test_trigger_kind_checked_per_node() {
    let process = ProcessBuilder::new("bad-start")
        .node("start", NodeType::StartEvent {
            trigger: Some(Trigger::new(EventKind::Error, "boom")),
        })
        .build();

    assert!(reason(&process).contains("cannot have a error trigger"));
}

#[test]
fn test_boundary_needs_existing_host() {
    let process = ProcessBuilder::new("orphan")
        .start("start")
        .boundary("guard", "missing", EventKind::Message, "cancel")
        .build();

    assert!(reason(&process).contains("attached to unknown node missing"));
}

#[test]
fn test_gateway_default_must_be_outgoing() {
    let process = ProcessBuilder::new("gw")
        .start("start")
        .exclusive_gateway("decide", Some("elsewhere"))
        .end("end")
        .connect("start", "decide")
        .connect_named("to-end", "decide", "end")
        .build();

    assert!(reason(&process).contains("default flow elsewhere"));
}

#[test]
fn test_invalid_expression_rejected() {
    let process = ProcessBuilder::new("typo")
        .start("start")
        .script("calc", "(1 + 2", "result")
        .connect("start", "calc")
        .build();

    assert!(reason(&process).contains("invalid expression"));
}
