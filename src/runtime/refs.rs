use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A deployed process definition inside a deployment group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessRef {
    pub group: String,
    pub process_id: String,
}

impl ProcessRef {
    pub fn new(group: impl Into<String>, process_id: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            process_id: process_id.into(),
        }
    }
}

impl fmt::Display for ProcessRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.process_id)
    }
}

/// One visit of a token to a node of a running process instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    pub group: String,
    pub process_id: String,
    pub node_id: String,
    pub instance_id: Uuid,
    pub token_id: Uuid,
}

impl NodeRef {
    /// Fresh visit identity for `node_id`.
    pub fn fresh(group: impl Into<String>, process_id: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            process_id: process_id.into(),
            node_id: node_id.into(),
            instance_id: Uuid::new_v4(),
            token_id: Uuid::new_v4(),
        }
    }

    /// Stable identity used for deploy-time start subscriptions.
    pub fn definition(group: impl Into<String>, process_id: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            process_id: process_id.into(),
            node_id: node_id.into(),
            instance_id: Uuid::nil(),
            token_id: Uuid::nil(),
        }
    }

    /// A new visit to `node_id` in the same process.
    pub fn visit(&self, node_id: &str) -> Self {
        Self::fresh(self.group.clone(), self.process_id.clone(), node_id)
    }

    /// Same visit identity, different node. Boundary events share their host's ids.
    pub fn at_node(&self, node_id: &str) -> Self {
        Self {
            node_id: node_id.to_string(),
            ..self.clone()
        }
    }

    pub fn process_ref(&self) -> ProcessRef {
        ProcessRef::new(self.group.clone(), self.process_id.clone())
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}#{} ({}:{})",
            self.group, self.process_id, self.node_id, self.instance_id, self.token_id
        )
    }
}
