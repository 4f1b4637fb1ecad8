use async_trait::async_trait;
use anyhow::Result;

use crate::dsl::Trigger;
use crate::nodes::leave;
use crate::runtime::action::{Action, CompleteAction};
use crate::runtime::environment::Environment;
use crate::runtime::event::EventKind;
use crate::runtime::node::Node;
use crate::runtime::state::State;

#[derive(Debug)]
pub struct StartEventNode {
    pub id: String,
}

#[async_trait]
impl Node for StartEventNode {
    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(&self, state: State, env: &Environment) -> Result<(State, Vec<Action>)> {
        Ok(leave(&self.id, state, env))
    }
}

/// End event. Message and signal ends complete, then throw; an error end only
/// throws, leaving the token to whichever boundary event catches it.
#[derive(Debug)]
pub struct EndEventNode {
    pub id: String,
    pub trigger: Option<Trigger>,
}

#[async_trait]
impl Node for EndEventNode {
    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(&self, state: State, env: &Environment) -> Result<(State, Vec<Action>)> {
        let complete = Action::Complete(CompleteAction {
            id: self.id.clone(),
            save_state: false,
            consume_token: true,
        });

        let actions = match &self.trigger {
            None => vec![complete],
            Some(t) if t.kind == EventKind::Error => vec![Action::emit(t.to_event(env.group()))],
            Some(t) => vec![complete, Action::emit(t.to_event(env.group()))],
        };
        Ok((state, actions))
    }
}
