use thiserror::Error;

use crate::runtime::event::Event;
use crate::runtime::refs::{NodeRef, ProcessRef};

/// Precondition failures that abort an invocation.
///
/// Public APIs return `anyhow::Result`; callers that need to tell these apart
/// use `err.downcast_ref::<EngineError>()`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no subscriptions found for {0}")]
    NoSubscriptions(Event),

    #[error("no node found with id {0}")]
    NodeNotFound(String),

    #[error("process not found: {0}")]
    ProcessNotFound(ProcessRef),

    #[error("no persisted state for {0}")]
    StateNotFound(NodeRef),

    #[error("invalid process definition '{process_id}': {reason}")]
    InvalidDefinition { process_id: String, reason: String },

    #[error("error while invoking process {0}")]
    InvocationFailed(ProcessRef),
}
