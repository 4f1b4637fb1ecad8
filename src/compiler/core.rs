use crate::dsl::{Mapping, Node as NodeDef, NodeType, ProcessDefinition, Trigger};
use crate::error::EngineError;
use crate::expression;
use crate::nodes::common::{EndEventNode, StartEventNode};
use crate::nodes::event::{ThrowNode, WaitNode};
use crate::nodes::flow::{CallActivityNode, CompiledMapping, ExclusiveGatewayNode, GatewayBranch};
use crate::nodes::task::{PassThroughNode, ScriptTaskNode, ServiceTaskNode};
use crate::runtime::environment::NodeTable;
use crate::runtime::event::EventKind;
use crate::runtime::node::Node;
use std::collections::HashSet;
use std::sync::Arc;
use anyhow::Result;

/// Validates process definitions and turns them into executable nodes.
pub struct Compiler<'a> {
    process: &'a ProcessDefinition,
}

impl<'a> Compiler<'a> {
    pub fn new(process: &'a ProcessDefinition) -> Self {
        Self { process }
    }

    fn invalid(&self, reason: impl Into<String>) -> anyhow::Error {
        EngineError::InvalidDefinition {
            process_id: self.process.id.clone(),
            reason: reason.into(),
        }
        .into()
    }

    pub fn validate(&self) -> Result<()> {
        let process = self.process;

        // 1. Pass 1: Indexing
        let mut ids = HashSet::new();
        for node in &process.nodes {
            if !ids.insert(node.id.as_str()) {
                return Err(self.invalid(format!("duplicate node id: {}", node.id)));
            }
        }

        // 2. Pass 2: Edges
        for flow in &process.flows {
            for end in [&flow.source, &flow.target] {
                if !ids.contains(end.as_str()) {
                    return Err(self.invalid(format!("flow references unknown node: {}", end)));
                }
            }
        }

        if process.start_events().next().is_none() {
            return Err(self.invalid("no start event"));
        }

        // 3. Pass 3: Node-specific rules
        for node in &process.nodes {
            self.validate_node(node, &ids)?;
        }
        Ok(())
    }

    fn validate_node(&self, node: &NodeDef, ids: &HashSet<&str>) -> Result<()> {
        let allowed: &[EventKind] = match &node.kind {
            NodeType::StartEvent { .. } => &[EventKind::Message, EventKind::Signal],
            NodeType::EndEvent { .. } => &[EventKind::Message, EventKind::Signal, EventKind::Error],
            NodeType::IntermediateCatchEvent { .. } | NodeType::IntermediateThrowEvent { .. } => {
                &[EventKind::Message, EventKind::Signal]
            }
            NodeType::BoundaryEvent { .. } => &[EventKind::Message, EventKind::Signal, EventKind::Error],
            _ => &[],
        };

        let trigger = match &node.kind {
            NodeType::StartEvent { trigger } | NodeType::EndEvent { trigger } => trigger.as_ref(),
            NodeType::IntermediateCatchEvent { trigger }
            | NodeType::IntermediateThrowEvent { trigger }
            | NodeType::BoundaryEvent { trigger, .. } => Some(trigger),
            _ => None,
        };
        if let Some(t) = trigger {
            if !allowed.contains(&t.kind) {
                return Err(self.invalid(format!(
                    "{} '{}' cannot have a {} trigger",
                    node.kind.type_name(),
                    node.id,
                    t.kind
                )));
            }
        }

        match &node.kind {
            NodeType::BoundaryEvent { attached_to, .. } => {
                if !ids.contains(attached_to.as_str()) || attached_to == &node.id {
                    return Err(self.invalid(format!("boundary '{}' attached to unknown node {}", node.id, attached_to)));
                }
            }
            NodeType::ExclusiveGateway { default_flow: Some(flow_id) } => {
                let found = self
                    .process
                    .outgoing(&node.id)
                    .any(|f| f.id.as_deref() == Some(flow_id.as_str()));
                if !found {
                    return Err(self.invalid(format!("gateway '{}' default flow {} is not outgoing", node.id, flow_id)));
                }
            }
            NodeType::CallActivity { process, .. } if process.is_empty() => {
                return Err(self.invalid(format!("call activity '{}' has no process", node.id)));
            }
            _ => {}
        }
        Ok(())
    }

    /// Validate, then prepare every node.
    pub fn compile(&self) -> Result<NodeTable> {
        self.validate()?;

        let mut nodes = NodeTable::with_capacity(self.process.nodes.len());
        for def in &self.process.nodes {
            let node = self.prepare(def)?;
            nodes.insert(def.id.clone(), node);
        }
        Ok(nodes)
    }

    fn prepare(&self, def: &NodeDef) -> Result<Arc<dyn Node>> {
        let id = def.id.clone();
        let node: Arc<dyn Node> = match &def.kind {
            NodeType::StartEvent { .. } => Arc::new(StartEventNode { id }),
            NodeType::EndEvent { trigger } => Arc::new(EndEventNode { id, trigger: trigger.clone() }),
            NodeType::IntermediateCatchEvent { trigger } | NodeType::BoundaryEvent { trigger, .. } => {
                Arc::new(WaitNode { id, trigger: trigger.clone() })
            }
            NodeType::IntermediateThrowEvent { trigger } => Arc::new(ThrowNode { id, trigger: trigger.clone() }),
            NodeType::Task | NodeType::BusinessRuleTask => Arc::new(PassThroughNode { id }),
            NodeType::ScriptTask { script, var_name } => Arc::new(ScriptTaskNode {
                id,
                script: expression::compile(script).map_err(|e| self.invalid(e.to_string()))?,
                raw_script: script.clone(),
                var_name: var_name.clone(),
            }),
            NodeType::ServiceTask { service, params, output } => Arc::new(ServiceTaskNode {
                id,
                service: service.clone(),
                params: params.clone(),
                output: output.clone(),
            }),
            NodeType::UserTask => Arc::new(WaitNode {
                trigger: Trigger::new(EventKind::User, id.clone()),
                id,
            }),
            NodeType::ManualTask => Arc::new(WaitNode {
                trigger: Trigger::new(EventKind::Manual, id.clone()),
                id,
            }),
            NodeType::ReceiveTask { message } => Arc::new(WaitNode {
                id,
                trigger: Trigger::new(EventKind::Message, message.clone()),
            }),
            NodeType::SendTask { message } => Arc::new(ThrowNode {
                id,
                trigger: Trigger::new(EventKind::Message, message.clone()),
            }),
            NodeType::CallActivity { process, incoming, outgoing } => Arc::new(CallActivityNode {
                id,
                process: process.clone(),
                incoming: self.compile_mappings(incoming)?,
                outgoing: self.compile_mappings(outgoing)?,
            }),
            NodeType::ExclusiveGateway { default_flow } => self.prepare_gateway(id, default_flow.as_deref())?,
        };
        Ok(node)
    }

    fn prepare_gateway(&self, id: String, default_flow: Option<&str>) -> Result<Arc<dyn Node>> {
        let mut branches = Vec::new();
        let mut default_target = None;

        for flow in self.process.outgoing(&id) {
            if default_flow.is_some() && flow.id.as_deref() == default_flow {
                default_target = Some(flow.target.clone());
                continue;
            }
            let condition = flow
                .condition
                .as_deref()
                .map(expression::compile)
                .transpose()
                .map_err(|e| self.invalid(e.to_string()))?;
            branches.push(GatewayBranch {
                condition,
                raw_cond: flow.condition.clone().unwrap_or_default(),
                target: flow.target.clone(),
            });
        }

        Ok(Arc::new(ExclusiveGatewayNode { id, branches, default_target }))
    }

    fn compile_mappings(&self, mappings: &[Mapping]) -> Result<Vec<CompiledMapping>> {
        mappings
            .iter()
            .map(|m| match m {
                Mapping::Variable { source, target } => Ok(CompiledMapping::Variable {
                    source: source.clone(),
                    target: target.clone(),
                }),
                Mapping::Expression { source, target } => Ok(CompiledMapping::Expression {
                    expr: expression::compile(source).map_err(|e| self.invalid(e.to_string()))?,
                    target: target.clone(),
                }),
            })
            .collect()
    }
}
