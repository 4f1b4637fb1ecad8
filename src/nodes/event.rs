use async_trait::async_trait;
use anyhow::Result;

use crate::dsl::Trigger;
use crate::nodes::leave;
use crate::runtime::action::{Action, QueueAction};
use crate::runtime::environment::Environment;
use crate::runtime::node::Node;
use crate::runtime::state::State;

/// Parks the token until its trigger is delivered, then moves on.
///
/// Backs intermediate catch events, boundary events, and receive, user and
/// manual tasks.
#[derive(Debug)]
pub struct WaitNode {
    pub id: String,
    pub trigger: Trigger,
}

#[async_trait]
impl Node for WaitNode {
    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(&self, state: State, env: &Environment) -> Result<(State, Vec<Action>)> {
        if state.is_reentry {
            return Ok(leave(&self.id, state, env));
        }

        let queue = Action::Queue(QueueAction {
            event: Some(self.trigger.to_event(env.group())),
            consumable: true,
            save_state: true,
        });
        Ok((state, vec![queue]))
    }
}

/// Throws its trigger and moves on. Backs intermediate throw events and send tasks.
#[derive(Debug)]
pub struct ThrowNode {
    pub id: String,
    pub trigger: Trigger,
}

#[async_trait]
impl Node for ThrowNode {
    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(&self, state: State, env: &Environment) -> Result<(State, Vec<Action>)> {
        let throw = Action::emit(self.trigger.to_event(env.group()));
        let (state, mut actions) = leave(&self.id, state, env);
        // own token first, so its results lead
        actions.push(throw);
        Ok((state, actions))
    }
}
