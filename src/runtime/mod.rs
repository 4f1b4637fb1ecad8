pub mod action;
pub mod engine;
pub mod environment;
pub mod event;
pub mod listener;
pub mod node;
pub mod refs;
pub mod state;
pub mod storage;
