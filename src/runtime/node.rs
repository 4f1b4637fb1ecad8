use async_trait::async_trait;
use anyhow::Result;
use std::fmt::Debug;
use std::sync::Arc;

use crate::runtime::action::Action;
use crate::runtime::environment::Environment;
use crate::runtime::state::State;

/// Executable node of a compiled process.
#[async_trait]
pub trait Node: Send + Sync + Debug {
    fn id(&self) -> &str;

    /// Run the node's logic on an owned state and return the follow-up actions.
    ///
    /// Business failures are reported as `Action::Incident`; an `Err` aborts
    /// the whole invocation.
    async fn execute(&self, state: State, env: &Environment) -> Result<(State, Vec<Action>)>;
}

/// Wraps or replaces nodes on lookup.
pub trait NodeInterceptor: Send + Sync {
    fn intercept(&self, node: Arc<dyn Node>) -> Arc<dyn Node>;
}

#[derive(Debug, Default)]
pub struct IdentityInterceptor;

impl NodeInterceptor for IdentityInterceptor {
    fn intercept(&self, node: Arc<dyn Node>) -> Arc<dyn Node> {
        node
    }
}
