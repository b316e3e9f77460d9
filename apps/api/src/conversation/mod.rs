//! Incremental merge across conversation turns, one explicit state machine per session.

pub mod answers;
pub mod handlers;
pub mod models;
pub mod state;
pub mod store;
