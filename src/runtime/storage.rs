use async_trait::async_trait;
use dashmap::DashMap;
use anyhow::Result;
use std::sync::Arc;

use crate::dsl::ProcessDefinition;
use crate::error::EngineError;
use crate::runtime::refs::{NodeRef, ProcessRef};
use crate::runtime::state::State;

/// Persistence boundary for process definitions and in-flight state.
#[async_trait]
pub trait ProcessStore: Send + Sync {
    async fn write_process(&self, process_ref: &ProcessRef, definition: ProcessDefinition) -> Result<()>;
    async fn read_process(&self, process_ref: &ProcessRef) -> Result<Arc<ProcessDefinition>>;
    /// Keyed strictly by the full `NodeRef`, visit ids included.
    async fn read_state(&self, node_ref: &NodeRef) -> Result<State>;
    async fn write_state(&self, state: &State) -> Result<()>;
}

#[derive(Default)]
pub struct InMemoryProcessStore {
    processes: DashMap<ProcessRef, Arc<ProcessDefinition>>,
    states: DashMap<NodeRef, State>,
}

impl InMemoryProcessStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }
}

#[async_trait]
impl ProcessStore for InMemoryProcessStore {
    async fn write_process(&self, process_ref: &ProcessRef, definition: ProcessDefinition) -> Result<()> {
        self.processes.insert(process_ref.clone(), Arc::new(definition));
        Ok(())
    }

    async fn read_process(&self, process_ref: &ProcessRef) -> Result<Arc<ProcessDefinition>> {
        self.processes
            .get(process_ref)
            .map(|p| p.value().clone())
            .ok_or_else(|| EngineError::ProcessNotFound(process_ref.clone()).into())
    }

    async fn read_state(&self, node_ref: &NodeRef) -> Result<State> {
        self.states
            .get(node_ref)
            .map(|s| s.value().clone())
            .ok_or_else(|| EngineError::StateNotFound(node_ref.clone()).into())
    }

    async fn write_state(&self, state: &State) -> Result<()> {
        self.states.insert(state.node_ref.clone(), state.clone());
        Ok(())
    }
}
