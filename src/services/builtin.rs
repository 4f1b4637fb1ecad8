use async_trait::async_trait;
use serde_json::Value;
use crate::expression;
use crate::runtime::state::Properties;
use crate::services::Service;
use anyhow::{Result, anyhow};
use tracing::info;

#[derive(Debug)]
pub struct LogService;

#[async_trait]
impl Service for LogService {
    fn name(&self) -> &str {
        "log"
    }

    async fn execute(&self, params: Value, _properties: &Properties) -> Result<Value> {
        if let Some(msg) = params.get("msg").and_then(|v| v.as_str()) {
            info!("[LOG] {}", msg);
        } else {
            info!("[LOG] {:?}", params);
        }
        Ok(Value::Null)
    }
}

/// Returns `value`, or evaluates `expression` against the properties.
#[derive(Debug)]
pub struct AssignService;

#[async_trait]
impl Service for AssignService {
    fn name(&self) -> &str {
        "assign"
    }

    fn validate(&self, params: &Value) -> Result<()> {
        if params.get("value").is_none() && params.get("expression").is_none() {
            return Err(anyhow!("assign needs 'value' or 'expression'"));
        }
        Ok(())
    }

    async fn execute(&self, params: Value, properties: &Properties) -> Result<Value> {
        if let Some(val) = params.get("value") {
            return Ok(val.clone());
        }

        let source = params
            .get("expression")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("assign: 'expression' must be a string"))?;
        let compiled = expression::compile(source)?;
        Ok(expression::evaluate(&compiled, properties)?.unwrap_or(Value::Null))
    }
}
