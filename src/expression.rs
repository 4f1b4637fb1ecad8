//! Bridge between process properties and `evalexpr`.
//!
//! Scripts, gateway conditions and call-activity expression mappings are
//! compiled once at deploy time and evaluated against a context built from
//! the token's properties. Only scalar JSON values (strings, numbers,
//! booleans) are visible to expressions.

use anyhow::{Result, anyhow};
use evalexpr::{
    build_operator_tree, ContextWithMutableVariables, DefaultNumericTypes, HashMapContext,
    IterateVariablesContext,
};
use serde_json::{json, Value};
use tracing::warn;

use crate::runtime::state::Properties;

pub type Expression = evalexpr::Node<DefaultNumericTypes>;
type EvalValue = evalexpr::Value<DefaultNumericTypes>;

/// Compile `source`, accepting `${var}` placeholders as bare identifiers.
pub fn compile(source: &str) -> Result<Expression> {
    let clean = strip_placeholders(source);
    build_operator_tree::<DefaultNumericTypes>(&clean)
        .map_err(|e| anyhow!("invalid expression '{}': {}", source, e))
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

/// `${name}` becomes `name`; any other text, braces included, is kept.
fn strip_placeholders(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) if is_identifier(&after[..end]) => {
                out.push_str(&after[..end]);
                rest = &after[end + 1..];
            }
            _ => {
                out.push_str("${");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn to_eval(value: &Value) -> Option<EvalValue> {
    match value {
        Value::String(s) => Some(EvalValue::String(s.clone())),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() { Some(EvalValue::Int(i)) }
            else { n.as_f64().map(EvalValue::Float) }
        }
        Value::Bool(b) => Some(EvalValue::Boolean(*b)),
        _ => None,
    }
}

fn to_json(value: EvalValue) -> Option<Value> {
    match value {
        EvalValue::String(s) => Some(Value::String(s)),
        EvalValue::Int(i) => Some(json!(i)),
        EvalValue::Float(f) => Some(json!(f)),
        EvalValue::Boolean(b) => Some(Value::Bool(b)),
        _ => None,
    }
}

fn context_from(properties: &Properties) -> HashMapContext<DefaultNumericTypes> {
    let mut ctx = HashMapContext::<DefaultNumericTypes>::new();
    for (k, v) in properties {
        if let Some(ev) = to_eval(v) {
            if let Err(e) = ctx.set_value(k.clone(), ev) {
                warn!(variable = %k, error = %e, "variable not visible to expressions");
            }
        }
    }
    ctx
}

/// Value of `expr`, `None` when it yields nothing representable in JSON.
pub fn evaluate(expr: &Expression, properties: &Properties) -> Result<Option<Value>> {
    let ctx = context_from(properties);
    let value = expr
        .eval_with_context(&ctx)
        .map_err(|e| anyhow!("evaluation failed: {}", e))?;
    Ok(to_json(value))
}

pub fn evaluate_condition(expr: &Expression, properties: &Properties) -> Result<bool> {
    let ctx = context_from(properties);
    expr.eval_boolean_with_context(&ctx)
        .map_err(|e| anyhow!("condition evaluation failed: {}", e))
}

/// Run a script that may assign variables (`a = 1; b = a + 2`).
///
/// Assigned scalars are written back into `properties`; the script's final
/// value is returned.
pub fn run_script(expr: &Expression, properties: &mut Properties) -> Result<Option<Value>> {
    let mut ctx = context_from(properties);
    let value = expr
        .eval_with_context_mut(&mut ctx)
        .map_err(|e| anyhow!("script failed: {}", e))?;

    for (name, var) in ctx.iter_variables() {
        if let Some(jv) = to_json(var) {
            if properties.get(&name) != Some(&jv) {
                properties.insert(name, jv);
            }
        }
    }

    Ok(to_json(value))
}
