use bpmn_runtime::compiler::loader;
use bpmn_runtime::dsl::builder::ProcessBuilder;
use bpmn_runtime::dsl::{Mapping, NodeType, ProcessDocument};
use bpmn_runtime::EventKind;
use std::fs;

#[test]
fn test_load_process_file() {
    let yaml_content = r#"
processes:
  - id: "greeting"
    name: "Greeting"
    nodes:
      - id: "start"
        type: "startEvent"
      - id: "say"
        type: "serviceTask"
        service: "log"
        params:
          msg: "Hello from YAML"
        output: "log_result"
      - id: "end"
        type: "endEvent"
    flows:
      - source: "start"
        target: "say"
      - source: "say"
        target: "end"
"#;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("greeting.yaml");
    fs::write(&file_path, yaml_content).expect("Failed to write temp file");

    let processes = loader::load_processes_from_yaml(file_path.to_str().unwrap()).expect("Failed to load");

    assert_eq!(processes.len(), 1);
    let process = &processes[0];
    assert_eq!(process.id, "greeting");
    assert_eq!(process.name.as_deref(), Some("Greeting"));
    assert_eq!(process.nodes.len(), 3);
    assert_eq!(process.flows.len(), 2);

    match &process.node("say").unwrap().kind {
        NodeType::ServiceTask { service, params, output } => {
            assert_eq!(service, "log");
            assert_eq!(params["msg"], "Hello from YAML");
            assert_eq!(output.as_deref(), Some("log_result"));
        }
        other => panic!("unexpected node type {:?}", other),
    }
}

#[test]
fn test_missing_file_reports_path() {
    let err = loader::load_processes_from_yaml("/definitely/not/here.yaml").unwrap_err();
    assert!(format!("{:#}", err).contains("/definitely/not/here.yaml"));
}

#[test]
fn test_unknown_node_type_rejected() {
    let yaml = r#"
processes:
  - id: "odd"
    nodes:
      - id: "start"
        type: "timerStartEvent"
"#;
    assert!(loader::parse_processes(yaml).is_err());
}

#[test]
fn test_triggers_mappings_and_defaults() {
    let processes = loader::parse_processes(include_str!("../dsl_examples/call_activity.yaml")).unwrap();
    let parent = processes.iter().find(|p| p.id == "parent").unwrap();

    match &parent.node("price").unwrap().kind {
        NodeType::CallActivity { process, incoming, outgoing } => {
            assert_eq!(process, "pricing");
            assert_eq!(
                incoming,
                &vec![Mapping::Variable { source: "quantity".into(), target: "qty".into() }]
            );
            assert_eq!(
                outgoing,
                &vec![Mapping::Expression { source: "total * 2".into(), target: "doubled".into() }]
            );
        }
        other => panic!("unexpected node type {:?}", other),
    }

    let processes = loader::parse_processes(include_str!("../dsl_examples/error_boundary.yaml")).unwrap();
    let guarded = &processes[0];
    match &guarded.node("on-failure").unwrap().kind {
        NodeType::BoundaryEvent { attached_to, trigger } => {
            assert_eq!(attached_to, "risky");
            assert_eq!(trigger.kind, EventKind::Error);
            assert_eq!(trigger.name, "boom");
        }
        other => panic!("unexpected node type {:?}", other),
    }

    let yaml = r#"
processes:
  - id: "defaults"
    nodes:
      - id: "start"
        type: "startEvent"
      - id: "calc"
        type: "scriptTask"
        script: "1 + 1"
"#;
    let processes = loader::parse_processes(yaml).unwrap();
    assert!(processes[0].flows.is_empty());
    match &processes[0].node("calc").unwrap().kind {
        NodeType::ScriptTask { var_name, .. } => assert_eq!(var_name, "result"),
        other => panic!("unexpected node type {:?}", other),
    }
}

#[test]
fn test_builder_output_survives_yaml() {
    let process = ProcessBuilder::new("round-trip")
        .name("Built in code")
        .start("start")
        .exclusive_gateway("decide", Some("fallback"))
        .script("big", "10", "result")
        .end("end")
        .connect("start", "decide")
        .connect_if("decide", "big", "${flag} == true")
        .connect_named("fallback", "decide", "end")
        .connect("big", "end")
        .build();

    let document = ProcessDocument::from(vec![process.clone()]);
    let yaml = serde_yaml::to_string(&document).unwrap();
    let parsed = loader::parse_processes(&yaml).unwrap();

    assert_eq!(parsed, vec![process]);
}
