//! Domain models for the guardrail training corpus

pub mod decision;
pub mod example;

// Re-exports
pub use decision::{Decision, DecisionKind};
pub use example::{ChatMessage, Example, Role};
