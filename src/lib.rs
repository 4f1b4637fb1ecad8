//! Embeddable BPMN process engine.
//!
//! Processes are deployed from YAML documents (or built with
//! [`dsl::builder::ProcessBuilder`]), compiled into executable nodes, and run
//! by [`SequentialBpmnEngine`], a single-threaded interpreter that passes a
//! token through the graph as a stream of [`runtime::action::Action`]s.
//!
//! ```no_run
//! use bpmn_runtime::{ProcessRef, SequentialBpmnEngine};
//! # async fn run(source: &str) -> anyhow::Result<()> {
//! let engine = SequentialBpmnEngine::new();
//! engine.deploy("default", source).await?;
//! let state = engine
//!     .invoke_by_id(&ProcessRef::new("default", "orders"), Default::default(), Default::default())
//!     .await?;
//! println!("{:?}", state.properties);
//! # Ok(())
//! # }
//! ```

pub mod compiler;
pub mod dsl;
pub mod error;
pub mod expression;
pub mod nodes;
pub mod runtime;
pub mod services;

pub use error::EngineError;
pub use runtime::engine::{EngineBuilder, SequentialBpmnEngine};
pub use runtime::event::{Event, EventKind};
pub use runtime::refs::{NodeRef, ProcessRef};
pub use runtime::state::{Properties, State};
