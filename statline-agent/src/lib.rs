//! # Statline Agent
//!
//! The data-aware responder. The loop:
//! 1. The question goes to the model with a fixed analyst instruction and
//!    the table's shape (columns, row count)
//! 2. The model may request table tools (list columns, preview, top-by,
//!    sum-by) instead of answering
//! 3. Tools run serially against the in-memory table; results go back as
//!    tool messages
//! 4. Repeat until the model answers in plain text or the step budget runs out
//!
//! The model never sees or executes code; the table is only reachable
//! through the typed tools in [`tools`].

mod agent;
pub mod tools;

pub use agent::{Agent, AgentAnswer, AgentConfig, AgentStep};
pub use tools::schema_summary;
