use async_trait::async_trait;
use anyhow::Result;
use serde_json::{Map, Value};
use tracing::warn;

use crate::expression::{self, Expression};
use crate::nodes::{incident, leave};
use crate::runtime::action::Action;
use crate::runtime::environment::Environment;
use crate::runtime::node::Node;
use crate::runtime::state::{Properties, State};

/// Task without behaviour of its own.
#[derive(Debug)]
pub struct PassThroughNode {
    pub id: String,
}

#[async_trait]
impl Node for PassThroughNode {
    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(&self, state: State, env: &Environment) -> Result<(State, Vec<Action>)> {
        Ok(leave(&self.id, state, env))
    }
}

#[derive(Debug)]
pub struct ScriptTaskNode {
    pub id: String,
    pub script: Expression,
    pub raw_script: String,
    pub var_name: String,
}

#[async_trait]
impl Node for ScriptTaskNode {
    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(&self, mut state: State, env: &Environment) -> Result<(State, Vec<Action>)> {
        match expression::run_script(&self.script, &mut state.properties) {
            Ok(Some(value)) => {
                state.set(self.var_name.clone(), value);
                Ok(leave(&self.id, state, env))
            }
            Ok(None) => Ok(leave(&self.id, state, env)),
            Err(e) => {
                warn!(node = %self.id, script = %self.raw_script, error = %e, "script failed");
                Ok(incident(state, e.to_string()))
            }
        }
    }
}

/// Calls a registered service with `${var}` params resolved from the properties.
#[derive(Debug)]
pub struct ServiceTaskNode {
    pub id: String,
    pub service: String,
    pub params: Map<String, Value>,
    pub output: Option<String>,
}

impl ServiceTaskNode {
    fn resolve_params(&self, properties: &Properties) -> Value {
        let mut resolved = self.params.clone();
        for (_, v) in resolved.iter_mut() {
            let var_name = v
                .as_str()
                .and_then(|s| s.strip_prefix("${"))
                .and_then(|s| s.strip_suffix('}'))
                .map(str::to_string);
            if let Some(val) = var_name.and_then(|name| properties.get(&name).cloned()) {
                *v = val;
            }
        }
        Value::Object(resolved)
    }
}

#[async_trait]
impl Node for ServiceTaskNode {
    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(&self, mut state: State, env: &Environment) -> Result<(State, Vec<Action>)> {
        let Some(service) = env.services().get(&self.service) else {
            return Ok(incident(state, format!("service not registered: {}", self.service)));
        };

        let params = self.resolve_params(&state.properties);
        if let Err(e) = service.validate(&params) {
            return Ok(incident(state, format!("invalid params for {}: {}", self.service, e)));
        }

        match service.execute(params, &state.properties).await {
            Ok(result) => {
                if let Some(out_key) = &self.output {
                    state.set(out_key.clone(), result);
                }
                Ok(leave(&self.id, state, env))
            }
            Err(e) => {
                warn!(node = %self.id, service = %self.service, error = %e, "service failed");
                Ok(incident(state, format!("service {} failed: {}", self.service, e)))
            }
        }
    }
}
