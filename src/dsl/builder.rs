use crate::dsl::{Mapping, Node, NodeType, ProcessDefinition, ProcessDocument, SequenceFlow, Trigger};
use crate::runtime::event::EventKind;
use serde_json::{Map, Value};

pub struct ProcessBuilder {
    id: String,
    name: Option<String>,
    pub nodes: Vec<Node>, // public so tests can add hand-built nodes
    flows: Vec<SequenceFlow>,
}

impl ProcessBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            nodes: Vec::new(),
            flows: Vec::new(),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn node(mut self, id: &str, kind: NodeType) -> Self {
        self.nodes.push(Node {
            id: id.to_string(),
            name: None,
            kind,
        });
        self
    }

    pub fn start(self, id: &str) -> Self {
        self.node(id, NodeType::StartEvent { trigger: None })
    }

    pub fn message_start(self, id: &str, message: &str) -> Self {
        self.node(id, NodeType::StartEvent {
            trigger: Some(Trigger::new(EventKind::Message, message)),
        })
    }

    pub fn end(self, id: &str) -> Self {
        self.node(id, NodeType::EndEvent { trigger: None })
    }

    pub fn error_end(self, id: &str, code: &str) -> Self {
        self.node(id, NodeType::EndEvent {
            trigger: Some(Trigger::new(EventKind::Error, code)),
        })
    }

    pub fn task(self, id: &str) -> Self {
        self.node(id, NodeType::Task)
    }

    pub fn script(self, id: &str, script: &str, var_name: &str) -> Self {
        self.node(id, NodeType::ScriptTask {
            script: script.to_string(),
            var_name: var_name.to_string(),
        })
    }

    pub fn service(self, id: &str, service: &str) -> ServiceBuilder {
        ServiceBuilder {
            process_builder: self,
            id: id.to_string(),
            service: service.to_string(),
            params: Map::new(),
            output: None,
        }
    }

    pub fn user_task(self, id: &str) -> Self {
        self.node(id, NodeType::UserTask)
    }

    pub fn receive(self, id: &str, message: &str) -> Self {
        self.node(id, NodeType::ReceiveTask { message: message.to_string() })
    }

    pub fn send(self, id: &str, message: &str) -> Self {
        self.node(id, NodeType::SendTask { message: message.to_string() })
    }

    pub fn catch_event(self, id: &str, kind: EventKind, name: &str) -> Self {
        self.node(id, NodeType::IntermediateCatchEvent { trigger: Trigger::new(kind, name) })
    }

    pub fn throw_event(self, id: &str, kind: EventKind, name: &str) -> Self {
        self.node(id, NodeType::IntermediateThrowEvent { trigger: Trigger::new(kind, name) })
    }

    pub fn boundary(self, id: &str, attached_to: &str, kind: EventKind, name: &str) -> Self {
        self.node(id, NodeType::BoundaryEvent {
            attached_to: attached_to.to_string(),
            trigger: Trigger::new(kind, name),
        })
    }

    pub fn call_activity(self, id: &str, process: &str, incoming: Vec<Mapping>, outgoing: Vec<Mapping>) -> Self {
        self.node(id, NodeType::CallActivity {
            process: process.to_string(),
            incoming,
            outgoing,
        })
    }

    /// `default_flow` is the id of one of the gateway's outgoing flows.
    pub fn exclusive_gateway(self, id: &str, default_flow: Option<&str>) -> Self {
        self.node(id, NodeType::ExclusiveGateway {
            default_flow: default_flow.map(str::to_string),
        })
    }

    pub fn connect(mut self, source: &str, target: &str) -> Self {
        self.flows.push(SequenceFlow {
            id: None,
            source: source.to_string(),
            target: target.to_string(),
            condition: None,
        });
        self
    }

    pub fn connect_if(mut self, source: &str, target: &str, condition: &str) -> Self {
        self.flows.push(SequenceFlow {
            id: None,
            source: source.to_string(),
            target: target.to_string(),
            condition: Some(condition.to_string()),
        });
        self
    }

    /// Named flow, e.g. a gateway's default.
    pub fn connect_named(mut self, flow_id: &str, source: &str, target: &str) -> Self {
        self.flows.push(SequenceFlow {
            id: Some(flow_id.to_string()),
            source: source.to_string(),
            target: target.to_string(),
            condition: None,
        });
        self
    }

    pub fn build(self) -> ProcessDefinition {
        ProcessDefinition {
            id: self.id,
            name: self.name,
            nodes: self.nodes,
            flows: self.flows,
        }
    }
}

pub struct ServiceBuilder {
    process_builder: ProcessBuilder,
    id: String,
    service: String,
    params: Map<String, Value>,
    output: Option<String>,
}

impl ServiceBuilder {
    pub fn param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn output(mut self, var_name: &str) -> Self {
        self.output = Some(var_name.to_string());
        self
    }

    pub fn build(self) -> ProcessBuilder {
        let kind = NodeType::ServiceTask {
            service: self.service,
            params: self.params,
            output: self.output,
        };
        self.process_builder.node(&self.id, kind)
    }
}

impl From<Vec<ProcessDefinition>> for ProcessDocument {
    fn from(processes: Vec<ProcessDefinition>) -> Self {
        ProcessDocument { processes }
    }
}
