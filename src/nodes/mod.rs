pub mod common;
pub mod event;
pub mod flow;
pub mod task;

use crate::runtime::action::{Action, CompleteAction, IncidentAction};
use crate::runtime::environment::Environment;
use crate::runtime::state::State;

/// Complete the node without surfacing the token, then follow every outgoing flow.
pub(crate) fn leave(id: &str, state: State, env: &Environment) -> (State, Vec<Action>) {
    let targets = env.get_outgoing_nodes(id);
    leave_to(id, state, targets)
}

pub(crate) fn leave_to(id: &str, mut state: State, targets: Vec<String>) -> (State, Vec<Action>) {
    state.is_reentry = false;
    let mut actions = Vec::with_capacity(targets.len() + 1);
    actions.push(Action::Complete(CompleteAction {
        id: id.to_string(),
        save_state: false,
        consume_token: false,
    }));
    actions.extend(targets.into_iter().map(Action::continue_to));
    (state, actions)
}

/// End this branch with an incident.
pub(crate) fn incident(state: State, message: impl Into<String>) -> (State, Vec<Action>) {
    let action = Action::Incident(IncidentAction {
        node_ref: state.node_ref.clone(),
        message: message.into(),
    });
    (state, vec![action])
}
