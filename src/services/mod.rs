use async_trait::async_trait;
use serde_json::Value;
use anyhow::Result;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::runtime::state::Properties;

pub mod builtin;

/// Implementation behind a service task.
#[async_trait]
pub trait Service: Send + Sync + Debug {
    fn name(&self) -> &str;
    fn validate(&self, _params: &Value) -> Result<()> {
        Ok(())
    }
    async fn execute(&self, params: Value, properties: &Properties) -> Result<Value>;
}

/// Services available to service tasks, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    services: HashMap<String, Arc<dyn Service>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with `log` and `assign`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(builtin::LogService));
        registry.register(Arc::new(builtin::AssignService));
        registry
    }

    pub fn register(&mut self, service: Arc<dyn Service>) {
        self.services.insert(service.name().to_string(), service);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Service>> {
        self.services.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }
}
