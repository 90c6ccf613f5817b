// Guardrail Ruleset Validation
//
// Structural checks run on every ruleset before it is embedded in an example:
// - Rule id uniqueness
// - Non-empty ids and tool lists
// - Literal shapes the interpreter requires (not_in lists, compilable regexes)

use crate::policy::interpreter::compile_pattern;
use crate::policy::types::{Condition, Operator, Rule, RulePredicate};
use std::collections::HashSet;
use thiserror::Error;

/// Ruleset validation errors
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate rule id: {0}")]
    DuplicateRuleId(String),

    #[error("Rule has an empty id")]
    EmptyRuleId,

    #[error("Rule '{0}' applies to no tools")]
    NoTools(String),

    #[error("Rule '{rule_id}': not_in on '{field}' needs a list literal")]
    NotInRequiresList { rule_id: String, field: String },

    #[error("Rule '{rule_id}': invalid pattern '{pattern}'")]
    InvalidPattern { rule_id: String, pattern: String },
}

/// Result of ruleset validation
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Validate an ordered ruleset, collecting every problem found
///
/// An empty `conditions` list is accepted: such a rule is well formed, it
/// simply never fires.
pub fn validate_ruleset(rules: &[Rule]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for rule in rules {
        if rule.id.is_empty() {
            errors.push(ValidationError::EmptyRuleId);
        } else if !seen.insert(rule.id.as_str()) {
            errors.push(ValidationError::DuplicateRuleId(rule.id.clone()));
        }

        if rule.tools.is_empty() {
            errors.push(ValidationError::NoTools(rule.id.clone()));
        }

        for condition in rule_conditions(rule) {
            check_literal(&rule.id, condition, &mut errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn rule_conditions(rule: &Rule) -> Vec<&Condition> {
    match &rule.predicate {
        RulePredicate::Conditions(conditions) => conditions.iter().collect(),
        RulePredicate::ConditionGroups(groups) => groups
            .iter()
            .flat_map(|group| group.conditions().iter())
            .collect(),
    }
}

fn check_literal(rule_id: &str, condition: &Condition, errors: &mut Vec<ValidationError>) {
    match condition.operator {
        Operator::NotIn if !condition.value.is_array() => {
            errors.push(ValidationError::NotInRequiresList {
                rule_id: rule_id.to_string(),
                field: condition.field.clone(),
            });
        }
        Operator::Matches => {
            if let Some(pattern) = condition.value.as_str() {
                if compile_pattern(pattern).is_err() {
                    errors.push(ValidationError::InvalidPattern {
                        rule_id: rule_id.to_string(),
                        pattern: pattern.to_string(),
                    });
                }
            }
        }
        _ => {}
    }
}
