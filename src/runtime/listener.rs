use tracing::{debug, error, trace};

use crate::runtime::action::{Action, IncidentAction};
use crate::runtime::environment::Environment;
use crate::runtime::node::Node;
use crate::runtime::state::State;

/// Observer hooks around action handling and node execution.
pub trait Listener: Send + Sync {
    fn on_action(&self, _action: &Action, _state: &State, _env: &Environment) {}
    fn before_node_execution(&self, _node: &dyn Node, _state: &State) {}
    fn after_node_execution(&self, _node: &dyn Node, _state: &State) {}
}

/// Traces every action and node execution.
#[derive(Debug, Default)]
pub struct TracingListener;

impl Listener for TracingListener {
    fn on_action(&self, action: &Action, state: &State, env: &Environment) {
        debug!(
            action = action.name(),
            process = env.process_id(),
            node = %state.node_ref.node_id,
            "handling action"
        );
        trace!(?action);
    }

    fn before_node_execution(&self, node: &dyn Node, state: &State) {
        debug!(node = node.id(), token = %state.node_ref.token_id, reentry = state.is_reentry, "executing node");
    }

    fn after_node_execution(&self, node: &dyn Node, state: &State) {
        trace!(node = node.id(), properties = ?state.properties, "node executed");
    }
}

/// Sink for per-node failures.
pub trait IncidentHandler: Send + Sync {
    fn handle(&self, incident: &IncidentAction);
}

#[derive(Debug, Default)]
pub struct LoggingIncidentHandler;

impl IncidentHandler for LoggingIncidentHandler {
    fn handle(&self, incident: &IncidentAction) {
        error!(node = %incident.node_ref, message = %incident.message, "incident");
    }
}
