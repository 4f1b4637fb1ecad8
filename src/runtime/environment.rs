use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::dsl::{NodeType, ProcessDefinition, SequenceFlow};
use crate::runtime::event::Event;
use crate::runtime::node::Node;
use crate::services::ServiceRegistry;

pub type NodeTable = HashMap<String, Arc<dyn Node>>;

/// A boundary event attached to a host node.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryEvent {
    pub id: String,
    pub event: Event,
}

/// Read-only view over one deployed process, valid for one request.
#[derive(Clone)]
pub struct Environment {
    group: String,
    process: Arc<ProcessDefinition>,
    nodes: Arc<NodeTable>,
    services: Arc<ServiceRegistry>,
}

impl Environment {
    pub fn new(
        group: impl Into<String>,
        process: Arc<ProcessDefinition>,
        nodes: Arc<NodeTable>,
        services: Arc<ServiceRegistry>,
    ) -> Self {
        Self {
            group: group.into(),
            process,
            nodes,
            services,
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn process(&self) -> &ProcessDefinition {
        &self.process
    }

    pub fn process_id(&self) -> &str {
        &self.process.id
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    pub fn get_node(&self, node_id: &str) -> Option<Arc<dyn Node>> {
        self.nodes.get(node_id).cloned()
    }

    /// Targets of the node's outgoing sequence flows, in declaration order.
    pub fn get_outgoing_nodes(&self, node_id: &str) -> Vec<String> {
        self.process.outgoing(node_id).map(|f| f.target.clone()).collect()
    }

    pub fn get_outgoing_flows(&self, node_id: &str) -> Vec<&SequenceFlow> {
        self.process.outgoing(node_id).collect()
    }

    pub fn get_boundary_events(&self, node_id: &str) -> Vec<BoundaryEvent> {
        self.process
            .boundary_events(node_id)
            .filter_map(|n| match &n.kind {
                NodeType::BoundaryEvent { trigger, .. } => Some(BoundaryEvent {
                    id: n.id.clone(),
                    event: trigger.to_event(&self.group),
                }),
                _ => None,
            })
            .collect()
    }

    pub fn is_start_event(&self, node_id: &str) -> bool {
        self.process.node(node_id).is_some_and(|n| n.kind.is_start_event())
    }

    pub fn is_end_event(&self, node_id: &str) -> bool {
        self.process.node(node_id).is_some_and(|n| n.kind.is_end_event())
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("group", &self.group)
            .field("process", &self.process.id)
            .field("nodes", &self.nodes.len())
            .finish()
    }
}
