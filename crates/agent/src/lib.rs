//! Dispatch boundary for sensorwatch sessions.
//!
//! Operator text goes through an [`conversation::IntentRouter`] that yields
//! [`sensorwatch_core::SessionCommand`]s; structured callers use the JSON
//! tools in [`tools::ToolRegistry`]. [`runtime::AgentRuntime`] owns the
//! sessions and serializes each one behind its own lock.
//!
//! Routing never decides limits, readings or alert outcomes. Those come from
//! the core operations only.

pub mod conversation;
pub mod replies;
pub mod runtime;
pub mod tools;

pub use conversation::{IntentRouter, KeywordIntentRouter, RoutedIntent};
pub use replies::{AgentReply, ReplyBuilder};
pub use runtime::AgentRuntime;
pub use tools::{Tool, ToolError, ToolRegistry};
