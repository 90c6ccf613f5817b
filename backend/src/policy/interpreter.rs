// Guardrail Rule Interpreter
//
// Evaluates conditions, rules and whole rulesets against a tool call.
// Every label emitted by a scenario generator is checked against this module.

use crate::models::DecisionKind;
use crate::policy::context::EvalContext;
use crate::policy::types::{
    CallHistoryEntry, Condition, Operator, Rule, RuleAction, RulePredicate, ToolCall,
};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};
use thiserror::Error;

/// Compiled `matches` patterns, shared by every evaluation in the process
static PATTERNS: LazyLock<Mutex<HashMap<String, Regex>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Errors that can occur during rule interpretation
#[derive(Debug, Error, PartialEq)]
pub enum EvalError {
    #[error("Invalid regular expression '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Operator not_in on field '{0}' requires a list literal")]
    ExpectedList(String),
}

/// Outcome of evaluating a full ruleset
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub decision: DecisionKind,

    /// Ids of every firing block rule, in ruleset order
    pub matched_rules: Vec<String>,
}

// ============================================================================
// CONDITION EVALUATION
// ============================================================================

/// Evaluate a single condition against the context
///
/// # Example
///
/// ```rust
/// use guardrail_corpus_core_rs::policy::{
///     evaluate_condition, Condition, EvalContext, Operator, ToolCall,
/// };
/// use serde_json::{json, Map};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let call = ToolCall::new("transfer_funds").arg("amount", 10_000);
/// let context = EvalContext::build(&call, &[], &Map::new());
///
/// let cond = Condition::new("arguments.amount", Operator::GreaterThan, json!(10_000));
/// assert!(!evaluate_condition(&cond, &context)?); // strict inequality
/// # Ok(())
/// # }
/// ```
pub fn evaluate_condition(condition: &Condition, context: &EvalContext) -> Result<bool, EvalError> {
    let actual = context.resolve(&condition.field);
    let expected = &condition.value;

    let result = match condition.operator {
        Operator::Equals => values_equal(&actual, expected),
        Operator::NotEquals => !values_equal(&actual, expected),
        Operator::GreaterThan => compare_numeric(&actual, expected, |a, b| a > b),
        Operator::LessThan => compare_numeric(&actual, expected, |a, b| a < b),
        Operator::NotIn => match expected {
            Value::Array(items) => !items.iter().any(|item| values_equal(&actual, item)),
            _ => return Err(EvalError::ExpectedList(condition.field.clone())),
        },
        Operator::StartsWith => match (actual.as_str(), expected.as_str()) {
            (Some(v), Some(prefix)) => v.starts_with(prefix),
            _ => false,
        },
        Operator::Contains => match (actual.as_str(), expected.as_str()) {
            (Some(v), Some(needle)) => v.contains(needle),
            _ => false,
        },
        Operator::Matches => match (actual.as_str(), expected.as_str()) {
            (Some(v), Some(pattern)) => compile_pattern(pattern)?.is_match(v),
            _ => false,
        },
    };

    Ok(result)
}

/// Compile a `matches` pattern, or fetch it from the pattern cache
///
/// Invalid patterns are not cached and fail on every call.
pub fn compile_pattern(pattern: &str) -> Result<Regex, EvalError> {
    let mut patterns = PATTERNS.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(regex) = patterns.get(pattern) {
        return Ok(regex.clone());
    }

    let regex = Regex::new(pattern).map_err(|e| EvalError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;
    patterns.insert(pattern.to_string(), regex.clone());
    Ok(regex)
}

#[cfg(test)]
fn is_cached(pattern: &str) -> bool {
    PATTERNS
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .contains_key(pattern)
}

/// JSON equality, except that numbers compare by value (10000 == 10000.0)
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        _ => left == right,
    }
}

/// Numeric view of a resolved value: numbers as-is, lists by length
fn numeric_operand(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Array(items) => Some(items.len() as f64),
        _ => None,
    }
}

fn compare_numeric(actual: &Value, expected: &Value, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (numeric_operand(actual), expected.as_f64()) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

// ============================================================================
// RULE EVALUATION
// ============================================================================

fn all_hold(conditions: &[Condition], context: &EvalContext) -> Result<bool, EvalError> {
    // Vacuous truth is not a match
    if conditions.is_empty() {
        return Ok(false);
    }
    for condition in conditions {
        if !evaluate_condition(condition, context)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Whether a rule fires for the context
///
/// Disabled rules and rules not listing the called tool never fire. A flat
/// condition list is AND-combined, condition groups are OR-combined.
pub fn evaluate_rule(rule: &Rule, context: &EvalContext) -> Result<bool, EvalError> {
    if !rule.enabled || !rule.applies_to(context.tool()) {
        return Ok(false);
    }

    match &rule.predicate {
        RulePredicate::Conditions(conditions) => all_hold(conditions, context),
        RulePredicate::ConditionGroups(groups) => {
            for group in groups {
                if all_hold(group.conditions(), context)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

/// Convenience wrapper building the context from its parts
pub fn evaluate(
    rule: &Rule,
    tool_call: &ToolCall,
    call_history: &[CallHistoryEntry],
    session_context: &Map<String, Value>,
) -> Result<bool, EvalError> {
    let context = EvalContext::build(tool_call, call_history, session_context);
    evaluate_rule(rule, &context)
}

// ============================================================================
// RULESET AGGREGATION
// ============================================================================

/// Decide a tool call against an ordered ruleset
///
/// `block` iff at least one enabled, applicable block rule fires.
pub fn evaluate_ruleset(rules: &[Rule], context: &EvalContext) -> Result<Verdict, EvalError> {
    let mut matched_rules = Vec::new();
    for rule in rules {
        if rule.action == RuleAction::Block && evaluate_rule(rule, context)? {
            matched_rules.push(rule.id.clone());
        }
    }

    let decision = if matched_rules.is_empty() {
        DecisionKind::Pass
    } else {
        DecisionKind::Block
    };

    Ok(Verdict {
        decision,
        matched_rules,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::types::Severity;
    use serde_json::json;

    fn ctx(call: ToolCall) -> EvalContext {
        EvalContext::build(&call, &[], &Map::new())
    }

    fn check(field: &str, op: Operator, value: Value, call: ToolCall) -> bool {
        evaluate_condition(&Condition::new(field, op, value), &ctx(call)).unwrap()
    }

    #[test]
    fn test_equals_null_matches_missing_field() {
        let call = ToolCall::new("query_customer_data").arg("customer_id", "CUST-10001");
        assert!(check("arguments.ticket_id", Operator::Equals, Value::Null, call.clone()));

        let with_ticket = call.arg("ticket_id", "TKT-123456");
        assert!(!check("arguments.ticket_id", Operator::Equals, Value::Null, with_ticket));
    }

    #[test]
    fn test_equals_numbers_compare_by_value() {
        let call = ToolCall::new("t").arg("amount", 10_000);
        assert!(check("arguments.amount", Operator::Equals, json!(10_000.0), call));
    }

    #[test]
    fn test_not_equals_true_on_missing_flag() {
        let call = ToolCall::new("approve_loan");
        assert!(check("arguments.credit_checked", Operator::NotEquals, json!(true), call));
    }

    #[test]
    fn test_greater_than_is_strict() {
        let at = ToolCall::new("t").arg("amount", 10_000);
        let above = ToolCall::new("t").arg("amount", 10_001);
        assert!(!check("arguments.amount", Operator::GreaterThan, json!(10_000), at));
        assert!(check("arguments.amount", Operator::GreaterThan, json!(10_000), above));
    }

    #[test]
    fn test_greater_than_uses_list_length() {
        let call = ToolCall::new("t").arg("accounts", json!(["A", "B", "C", "D"]));
        assert!(check("arguments.accounts", Operator::GreaterThan, json!(3), call.clone()));
        assert!(!check("arguments.accounts", Operator::GreaterThan, json!(4), call));
    }

    #[test]
    fn test_less_than_non_numeric_is_false() {
        let call = ToolCall::new("t").arg("amount", "lots");
        assert!(!check("arguments.amount", Operator::LessThan, json!(10), call));
    }

    #[test]
    fn test_not_in() {
        let allow = json!(["ACC-SELF-001", "ACC-SELF-002"]);
        let inside = ToolCall::new("t").arg("account_id", "ACC-SELF-001");
        let outside = ToolCall::new("t").arg("account_id", "ACC-99999");
        assert!(!check("arguments.account_id", Operator::NotIn, allow.clone(), inside));
        assert!(check("arguments.account_id", Operator::NotIn, allow, outside));
    }

    #[test]
    fn test_not_in_requires_list() {
        let cond = Condition::new("arguments.account_id", Operator::NotIn, json!("ACC"));
        let err = evaluate_condition(&cond, &ctx(ToolCall::new("t"))).unwrap_err();
        assert_eq!(err, EvalError::ExpectedList("arguments.account_id".to_string()));
    }

    #[test]
    fn test_string_operators_are_case_sensitive() {
        let call = ToolCall::new("t").arg("to_account", "ext-acc-self-001");
        assert!(!check("arguments.to_account", Operator::StartsWith, json!("EXT-"), call.clone()));
        assert!(check("arguments.to_account", Operator::Contains, json!("acc-self"), call));
    }

    #[test]
    fn test_matches_is_unanchored_search() {
        let call = ToolCall::new("t").arg("command", "sudo chmod   777 /etc");
        assert!(check("arguments.command", Operator::Matches, json!("chmod\\s+777"), call));

        let near_miss = ToolCall::new("t").arg("command", "chmod 775 /var/log");
        assert!(!check("arguments.command", Operator::Matches, json!("chmod\\s+777"), near_miss));
    }

    #[test]
    fn test_matches_invalid_pattern_errors() {
        let cond = Condition::new("arguments.command", Operator::Matches, json!("(unclosed"));
        let call = ToolCall::new("t").arg("command", "ls");
        assert!(matches!(
            evaluate_condition(&cond, &ctx(call)),
            Err(EvalError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_matches_compiles_each_pattern_once() {
        let pattern = "rm\\s+-[a-z]*f[a-z]*\\s+/opt";
        assert!(!is_cached(pattern));

        let hit = ToolCall::new("t").arg("command", "rm -rf /opt/app");
        let miss = ToolCall::new("t").arg("command", "rm -r /opt/app");
        for _ in 0..3 {
            assert!(check("arguments.command", Operator::Matches, json!(pattern), hit.clone()));
            assert!(!check("arguments.command", Operator::Matches, json!(pattern), miss.clone()));
        }
        assert!(is_cached(pattern));
        assert!(compile_pattern(pattern).unwrap().is_match("rm -f /opt"));
    }

    #[test]
    fn test_invalid_pattern_is_not_cached() {
        let pattern = "[unclosed-class";
        assert!(compile_pattern(pattern).is_err());
        assert!(compile_pattern(pattern).is_err());
        assert!(!is_cached(pattern));
    }

    #[test]
    fn test_rule_skips_other_tools() {
        let rule = Rule::block(
            "r",
            "r",
            Severity::High,
            &["transfer_funds"],
            vec![Condition::new("arguments.amount", Operator::GreaterThan, json!(1))],
        );
        let call = ToolCall::new("wire_transfer").arg("amount", 50);
        assert!(!evaluate_rule(&rule, &ctx(call)).unwrap());
    }

    #[test]
    fn test_pass_rules_never_block() {
        let mut rule = Rule::block(
            "allow-small",
            "Allow small",
            Severity::Low,
            &["transfer_funds"],
            vec![Condition::new("arguments.amount", Operator::LessThan, json!(100))],
        );
        rule.action = RuleAction::Pass;
        let call = ToolCall::new("transfer_funds").arg("amount", 5);
        let context = ctx(call);

        assert!(evaluate_rule(&rule, &context).unwrap());
        let verdict = evaluate_ruleset(&[rule], &context).unwrap();
        assert_eq!(verdict.decision, DecisionKind::Pass);
        assert!(verdict.matched_rules.is_empty());
    }
}
