use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::runtime::refs::NodeRef;

/// Process variables and headers. Insertion ordered.
pub type Properties = Map<String, Value>;

/// The token's payload and identity while it moves through a process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub properties: Properties,
    pub node_ref: NodeRef,
    pub is_reentry: bool,
    pub parent_reference: Option<NodeRef>,
    pub header: Properties,
}

impl State {
    pub fn new(properties: Properties, node_ref: NodeRef, header: Properties) -> Self {
        Self {
            properties,
            node_ref,
            is_reentry: false,
            parent_reference: None,
            header,
        }
    }

    /// Same payload, new position.
    pub fn with_node_ref(self, node_ref: NodeRef) -> Self {
        Self { node_ref, ..self }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.properties.insert(key.into(), value);
    }

    /// Overlay `properties` and `header`; incoming keys win.
    pub fn merge(&mut self, properties: Properties, header: Properties) {
        self.properties.extend(properties);
        self.header.extend(header);
    }
}

impl std::ops::Index<&str> for State {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.properties.get(key).unwrap_or(&Value::Null)
    }
}
