use async_trait::async_trait;
use anyhow::{anyhow, Result};
use bpmn_runtime::dsl::builder::ProcessBuilder;
use bpmn_runtime::expression;
use bpmn_runtime::services::{Service, ServiceRegistry};
use bpmn_runtime::{ProcessRef, Properties, SequentialBpmnEngine};
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug)]
struct DiscountService;

#[async_trait]
impl Service for DiscountService {
    fn name(&self) -> &str {
        "discount"
    }

    fn validate(&self, params: &Value) -> Result<()> {
        params
            .get("price")
            .and_then(Value::as_f64)
            .map(|_| ())
            .ok_or_else(|| anyhow!("price must be a number"))
    }

    async fn execute(&self, params: Value, _properties: &Properties) -> Result<Value> {
        let price = params["price"].as_f64().unwrap_or_default();
        Ok(json!(price * 0.9))
    }
}

fn props(value: Value) -> Properties {
    value.as_object().cloned().unwrap_or_default()
}

#[test]
fn test_registry_builtins() {
    let registry = ServiceRegistry::with_builtins();
    assert!(registry.contains("log"));
    assert!(registry.contains("assign"));
    assert!(registry.get("discount").is_none());
}

#[tokio::test]
async fn test_custom_service_output() {
    let engine = SequentialBpmnEngine::builder()
        .service(Arc::new(DiscountService))
        .build();
    let process = ProcessBuilder::new("checkout")
        .start("start")
        .service("discount", "discount")
        .param("price", "${price}")
        .output("discounted")
        .build()
        .end("end")
        .connect("start", "discount")
        .connect("discount", "end")
        .build();
    engine.deploy_definitions("default", vec![process]).await.unwrap();

    let state = engine
        .invoke_by_id(&ProcessRef::new("default", "checkout"), props(json!({ "price": 100.0 })), Properties::new())
        .await
        .unwrap();
    assert_eq!(state["discounted"], json!(90.0));

    // Validation failure is an incident, so nothing comes back.
    let result = engine
        .invoke_by_id(&ProcessRef::new("default", "checkout"), props(json!({ "price": "free" })), Properties::new())
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_assign_expression() {
    let engine = SequentialBpmnEngine::new();
    let process = ProcessBuilder::new("assign")
        .start("start")
        .service("calc", "assign")
        .param("expression", "a * b")
        .output("product")
        .build()
        .end("end")
        .connect("start", "calc")
        .connect("calc", "end")
        .build();
    engine.deploy_definitions("default", vec![process]).await.unwrap();

    let state = engine
        .invoke_by_id(&ProcessRef::new("default", "assign"), props(json!({ "a": 6, "b": 7 })), Properties::new())
        .await
        .unwrap();
    assert_eq!(state["product"], json!(42));
}

#[test]
fn test_expressions_see_scalar_properties() {
    let properties = props(json!({ "n": 4, "name": "ada", "nested": { "x": 1 } }));

    let expr = expression::compile("${n} * 2").unwrap();
    assert_eq!(expression::evaluate(&expr, &properties).unwrap(), Some(json!(8)));

    let cond = expression::compile("name == \"ada\"").unwrap();
    assert!(expression::evaluate_condition(&cond, &properties).unwrap());

    let hidden = expression::compile("nested").unwrap();
    assert!(expression::evaluate(&hidden, &properties).is_err());
}

#[test]
fn test_script_assignments_write_back() {
    let mut properties = props(json!({ "a": 1 }));
    let script = expression::compile("b = a + 2; b * 10").unwrap();

    let value = expression::run_script(&script, &mut properties).unwrap();

    assert_eq!(value, Some(json!(30)));
    assert_eq!(properties["b"], json!(3));
    assert_eq!(properties["a"], json!(1));
}

#[test]
fn test_placeholders_leave_string_braces_alone() {
    let properties = props(json!({ "label": "a}b", "n": 1 }));

    let cond = expression::compile("${label} == \"a}b\"").unwrap();
    assert!(expression::evaluate_condition(&cond, &properties).unwrap());

    let literal = expression::compile("\"${x\"").unwrap();
    assert_eq!(expression::evaluate(&literal, &properties).unwrap(), Some(json!("${x")));

    let sum = expression::compile("${n} + ${n}").unwrap();
    assert_eq!(expression::evaluate(&sum, &properties).unwrap(), Some(json!(2)));
}
