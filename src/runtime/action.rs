use crate::runtime::event::Event;
use crate::runtime::refs::NodeRef;
use crate::runtime::state::Properties;

/// Unit of work dispatched by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Continue(ContinueAction),
    Complete(CompleteAction),
    Queue(QueueAction),
    Dequeue(DequeueAction),
    Cascade(CascadeAction),
    Resume(ResumeAction),
    Incident(IncidentAction),
    Event(EventAction),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Continue(_) => "continue",
            Action::Complete(_) => "complete",
            Action::Queue(_) => "queue",
            Action::Dequeue(_) => "dequeue",
            Action::Cascade(_) => "cascade",
            Action::Resume(_) => "resume",
            Action::Incident(_) => "incident",
            Action::Event(_) => "event",
        }
    }

    pub fn continue_to(id: impl Into<String>) -> Self {
        Action::Continue(ContinueAction::new(id))
    }

    pub fn emit(event: Event) -> Self {
        Action::Event(EventAction { event })
    }
}

/// Move the token to node `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinueAction {
    pub id: String,
    /// Set when entering a boundary event; the boundary shares the host's visit ids.
    pub host: Option<NodeRef>,
}

impl ContinueAction {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), host: None }
    }

    pub fn boundary(id: impl Into<String>, host: NodeRef) -> Self {
        Self {
            id: id.into(),
            host: Some(host),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompleteAction {
    pub id: String,
    pub save_state: bool,
    /// Surface the state as a result when the token stops here.
    pub consume_token: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueAction {
    pub event: Option<Event>,
    pub consumable: bool,
    pub save_state: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DequeueAction {
    pub event: Event,
}

/// Start `process_id` as a child of `parent_reference`.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeAction {
    pub process_id: String,
    pub init_state: Properties,
    pub parent_reference: NodeRef,
}

/// Re-enter the node at `reference` with the current properties.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeAction {
    pub reference: NodeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncidentAction {
    pub node_ref: NodeRef,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventAction {
    pub event: Event,
}
