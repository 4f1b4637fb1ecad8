pub mod builder;

use serde::{Serialize, Deserialize};
use serde_json::{Map, Value};
use crate::runtime::event::{Event, EventKind};

/// A deployable document: one or more process definitions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessDocument {
    pub processes: Vec<ProcessDefinition>,
}

/// Process graph as written by the author.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessDefinition {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub flows: Vec<SequenceFlow>,
}

impl ProcessDefinition {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn outgoing(&self, id: &str) -> impl Iterator<Item = &SequenceFlow> {
        self.flows.iter().filter(move |f| f.source == id)
    }

    pub fn start_events(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.kind.is_start_event())
    }

    pub fn boundary_events<'a>(&'a self, host: &'a str) -> impl Iterator<Item = &'a Node> {
        self.nodes.iter().filter(move |n| {
            matches!(&n.kind, NodeType::BoundaryEvent { attached_to, .. } if attached_to == host)
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub kind: NodeType,
}

/// Node catalogue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeType {
    StartEvent {
        #[serde(default)]
        trigger: Option<Trigger>,
    },
    EndEvent {
        #[serde(default)]
        trigger: Option<Trigger>,
    },
    IntermediateCatchEvent {
        trigger: Trigger,
    },
    IntermediateThrowEvent {
        trigger: Trigger,
    },
    BoundaryEvent {
        attached_to: String,
        trigger: Trigger,
    },

    Task,
    BusinessRuleTask,
    ScriptTask {
        script: String,
        #[serde(default = "default_var_name")]
        var_name: String,
    },
    ServiceTask {
        service: String,
        #[serde(default)]
        params: Map<String, Value>,
        #[serde(default)]
        output: Option<String>,
    },
    UserTask,
    ManualTask,
    ReceiveTask {
        message: String,
    },
    SendTask {
        message: String,
    },
    CallActivity {
        process: String,
        #[serde(default)]
        incoming: Vec<Mapping>,
        #[serde(default)]
        outgoing: Vec<Mapping>,
    },

    ExclusiveGateway {
        #[serde(default, rename = "default")]
        default_flow: Option<String>,
    },
}

fn default_var_name() -> String {
    "result".to_string()
}

impl NodeType {
    pub fn is_start_event(&self) -> bool {
        matches!(self, NodeType::StartEvent { .. })
    }

    pub fn is_end_event(&self) -> bool {
        matches!(self, NodeType::EndEvent { .. })
    }

    /// Name of the `type` tag, for messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeType::StartEvent { .. } => "startEvent",
            NodeType::EndEvent { .. } => "endEvent",
            NodeType::IntermediateCatchEvent { .. } => "intermediateCatchEvent",
            NodeType::IntermediateThrowEvent { .. } => "intermediateThrowEvent",
            NodeType::BoundaryEvent { .. } => "boundaryEvent",
            NodeType::Task => "task",
            NodeType::BusinessRuleTask => "businessRuleTask",
            NodeType::ScriptTask { .. } => "scriptTask",
            NodeType::ServiceTask { .. } => "serviceTask",
            NodeType::UserTask => "userTask",
            NodeType::ManualTask => "manualTask",
            NodeType::ReceiveTask { .. } => "receiveTask",
            NodeType::SendTask { .. } => "sendTask",
            NodeType::CallActivity { .. } => "callActivity",
            NodeType::ExclusiveGateway { .. } => "exclusiveGateway",
        }
    }
}

/// Event definition attached to an event node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trigger {
    pub kind: EventKind,
    pub name: String,
}

impl Trigger {
    pub fn new(kind: EventKind, name: impl Into<String>) -> Self {
        Self { kind, name: name.into() }
    }

    pub fn to_event(&self, group: &str) -> Event {
        Event::new(self.kind, group, self.name.clone())
    }
}

/// Copies a value between parent and child process on call activities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Mapping {
    /// Copy variable `source` to `target`.
    Variable { source: String, target: String },
    /// Evaluate expression `source` and store it in `target`.
    Expression { source: String, target: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SequenceFlow {
    #[serde(default)]
    pub id: Option<String>,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub condition: Option<String>,
}
