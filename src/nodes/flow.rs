use async_trait::async_trait;
use anyhow::Result;
use tracing::warn;

use crate::expression::{self, Expression};
use crate::nodes::{incident, leave, leave_to};
use crate::runtime::action::{Action, CascadeAction};
use crate::runtime::environment::Environment;
use crate::runtime::node::Node;
use crate::runtime::state::{Properties, State};

// --- EXCLUSIVE GATEWAY ---

#[derive(Debug)]
pub struct GatewayBranch {
    /// `None` for an unconditional flow.
    pub condition: Option<Expression>,
    pub raw_cond: String,
    pub target: String,
}

/// Takes the first branch whose condition holds, else the default flow.
#[derive(Debug)]
pub struct ExclusiveGatewayNode {
    pub id: String,
    pub branches: Vec<GatewayBranch>,
    pub default_target: Option<String>,
}

#[async_trait]
impl Node for ExclusiveGatewayNode {
    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(&self, state: State, _env: &Environment) -> Result<(State, Vec<Action>)> {
        for branch in &self.branches {
            let taken = match &branch.condition {
                None => true,
                Some(cond) => expression::evaluate_condition(cond, &state.properties)
                    .unwrap_or_else(|e| {
                        warn!(gateway = %self.id, condition = %branch.raw_cond, error = %e, "condition treated as false");
                        false
                    }),
            };
            if taken {
                return Ok(leave_to(&self.id, state, vec![branch.target.clone()]));
            }
        }

        match &self.default_target {
            Some(target) => Ok(leave_to(&self.id, state, vec![target.clone()])),
            None => Ok(incident(state, format!("no outgoing flow matched at gateway {}", self.id))),
        }
    }
}

// --- CALL ACTIVITY ---

#[derive(Debug)]
pub enum CompiledMapping {
    Variable { source: String, target: String },
    Expression { expr: Expression, target: String },
}

impl CompiledMapping {
    fn apply(&self, from: &Properties, into: &mut Properties) -> Result<()> {
        match self {
            CompiledMapping::Variable { source, target } => {
                if let Some(v) = from.get(source) {
                    into.insert(target.clone(), v.clone());
                }
            }
            CompiledMapping::Expression { expr, target } => {
                if let Some(v) = expression::evaluate(expr, from)? {
                    into.insert(target.clone(), v);
                }
            }
        }
        Ok(())
    }
}

fn apply_all(mappings: &[CompiledMapping], from: &Properties, into: &mut Properties) -> Result<()> {
    for mapping in mappings {
        mapping.apply(from, into)?;
    }
    Ok(())
}

/// Runs another process as a child and continues once it returns.
///
/// Without incoming mappings the child sees a copy of every property; with
/// them it sees only the mapped targets. On return the child's properties
/// flow back, plus any outgoing mapping targets.
#[derive(Debug)]
pub struct CallActivityNode {
    pub id: String,
    pub process: String,
    pub incoming: Vec<CompiledMapping>,
    pub outgoing: Vec<CompiledMapping>,
}

#[async_trait]
impl Node for CallActivityNode {
    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(&self, mut state: State, env: &Environment) -> Result<(State, Vec<Action>)> {
        if state.is_reentry {
            let snapshot = state.properties.clone();
            if let Err(e) = apply_all(&self.outgoing, &snapshot, &mut state.properties) {
                return Ok(incident(state, format!("outgoing mapping failed: {}", e)));
            }
            return Ok(leave(&self.id, state, env));
        }

        let init_state = if self.incoming.is_empty() {
            state.properties.clone()
        } else {
            let mut mapped = Properties::new();
            if let Err(e) = apply_all(&self.incoming, &state.properties, &mut mapped) {
                return Ok(incident(state, format!("incoming mapping failed: {}", e)));
            }
            mapped
        };

        let cascade = Action::Cascade(CascadeAction {
            process_id: self.process.clone(),
            init_state,
            parent_reference: state.node_ref.clone(),
        });
        Ok((state, vec![cascade]))
    }
}
