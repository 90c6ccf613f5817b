//! Guardrail Policy Module
//!
//! Declarative rulesets that decide whether an agent's tool call passes or is
//! blocked, and the interpreter every generated label is checked against.
//!
//! # Architecture
//!
//! - types.rs: Rule schema (Rule, Condition, ConditionGroup, ToolCall, history)
//! - context.rs: Field resolution (arguments, session context, history aggregates)
//! - interpreter.rs: Condition / rule / ruleset evaluation
//! - validation.rs: Structural ruleset checks
//!
//! # Semantics
//!
//! A rule fires only when it is enabled, lists the called tool, and its
//! predicate holds: every condition of a flat list (an empty list never
//! holds), or every condition of at least one group. A ruleset blocks iff at
//! least one firing rule has action `block`.

pub mod context;
pub mod interpreter;
pub mod types;
pub mod validation;

pub use context::{parse_timestamp, EvalContext, TIMESTAMP_FORMAT};
pub use interpreter::{
    compile_pattern, evaluate, evaluate_condition, evaluate_rule, evaluate_ruleset, EvalError,
    Verdict,
};
pub use types::{
    CallHistoryEntry, Condition, ConditionGroup, Operator, Rule, RuleAction, RulePredicate,
    Severity, ToolCall,
};
pub use validation::{validate_ruleset, ValidationError, ValidationResult};
