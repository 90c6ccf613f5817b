// Guardrail Rule Schema - Type Definitions
//
// Declarative ruleset format used by the guardrail classifier.
// All types round-trip through JSON so generated rulesets can be inspected,
// re-loaded and re-evaluated.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// CONDITIONS
// ============================================================================

/// Comparison operator of a single condition
///
/// `v` is the resolved field value, `x` the condition's literal:
/// - equals / not_equals: `v == x` / `v != x` (numbers compare numerically)
/// - greater_than / less_than: strict numeric comparison; list-valued `v`
///   compares by length
/// - not_in: `v` is not a member of list `x`
/// - starts_with / contains: string prefix / substring, case sensitive
/// - matches: `v` matches regular expression `x` (unanchored)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    NotIn,
    StartsWith,
    Contains,
    Matches,
}

impl Operator {
    /// Wire name, as it appears in rendered rulesets
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not_equals",
            Operator::GreaterThan => "greater_than",
            Operator::LessThan => "less_than",
            Operator::NotIn => "not_in",
            Operator::StartsWith => "starts_with",
            Operator::Contains => "contains",
            Operator::Matches => "matches",
        }
    }
}

/// A single field comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Dotted path: `arguments.amount`, `context.call_count_last_minute`, ...
    pub field: String,

    pub operator: Operator,

    /// Literal operand (scalar, list or null)
    pub value: Value,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

/// AND-combined set of conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionGroup(pub Vec<Condition>);

impl ConditionGroup {
    pub fn conditions(&self) -> &[Condition] {
        &self.0
    }
}

// ============================================================================
// RULES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// Action taken when a rule's conditions hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Pass,
    Block,
}

impl RuleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleAction::Pass => "pass",
            RuleAction::Block => "block",
        }
    }
}

/// Either a flat AND list or an OR of AND groups, never both
///
/// Serialized as a `conditions` or `condition_groups` key on the rule itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RulePredicate {
    /// All conditions must hold. An empty list never matches.
    Conditions(Vec<Condition>),

    /// At least one group must hold entirely.
    ConditionGroups(Vec<ConditionGroup>),
}

/// A policy rule
///
/// Parsed through [`RawRule`]: at most one of `conditions` and
/// `condition_groups` may be present, and a rule with neither carries an
/// empty condition list (which never fires).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRule")]
pub struct Rule {
    /// Unique within a ruleset
    pub id: String,

    pub name: String,

    /// Disabled rules never fire
    pub enabled: bool,

    pub severity: Severity,

    pub action: RuleAction,

    /// Tool names this rule applies to
    pub tools: Vec<String>,

    #[serde(flatten)]
    pub predicate: RulePredicate,
}

/// Wire form of [`Rule`] with both predicate keys optional
#[derive(Deserialize)]
struct RawRule {
    id: String,
    name: String,
    enabled: bool,
    severity: Severity,
    action: RuleAction,
    tools: Vec<String>,
    #[serde(default)]
    conditions: Option<Vec<Condition>>,
    #[serde(default)]
    condition_groups: Option<Vec<ConditionGroup>>,
}

impl TryFrom<RawRule> for Rule {
    type Error = String;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        let predicate = match (raw.conditions, raw.condition_groups) {
            (Some(_), Some(_)) => {
                return Err(format!(
                    "rule '{}' has both conditions and condition_groups",
                    raw.id
                ))
            }
            (Some(conditions), None) => RulePredicate::Conditions(conditions),
            (None, Some(groups)) => RulePredicate::ConditionGroups(groups),
            (None, None) => RulePredicate::Conditions(Vec::new()),
        };

        Ok(Self {
            id: raw.id,
            name: raw.name,
            enabled: raw.enabled,
            severity: raw.severity,
            action: raw.action,
            tools: raw.tools,
            predicate,
        })
    }
}

impl Rule {
    /// Enabled block rule with a flat condition list
    pub fn block(
        id: &str,
        name: &str,
        severity: Severity,
        tools: &[&str],
        conditions: Vec<Condition>,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            enabled: true,
            severity,
            action: RuleAction::Block,
            tools: tools.iter().map(|t| t.to_string()).collect(),
            predicate: RulePredicate::Conditions(conditions),
        }
    }

    /// Enabled block rule whose condition groups are OR-combined
    pub fn block_any(
        id: &str,
        name: &str,
        severity: Severity,
        tools: &[&str],
        groups: Vec<Vec<Condition>>,
    ) -> Self {
        Self {
            predicate: RulePredicate::ConditionGroups(
                groups.into_iter().map(ConditionGroup).collect(),
            ),
            ..Self::block(id, name, severity, tools, Vec::new())
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn applies_to(&self, tool: &str) -> bool {
        self.tools.iter().any(|t| t == tool)
    }
}

// ============================================================================
// TOOL CALLS & HISTORY
// ============================================================================

/// A simulated agent tool invocation
///
/// Argument order is insertion order (serde_json `preserve_order`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool: String,

    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            arguments: Map::new(),
        }
    }

    /// Builder-style argument insertion
    pub fn arg(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.to_string(), value.into());
        self
    }
}

/// A prior call in the same session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallHistoryEntry {
    pub tool: String,

    #[serde(default)]
    pub arguments: Map<String, Value>,

    /// Whether the guardrail let the call through
    pub allowed: bool,

    /// ISO-8601 UTC, `%Y-%m-%dT%H:%M:%SZ`
    pub timestamp: String,
}

impl CallHistoryEntry {
    pub fn new(tool: impl Into<String>, allowed: bool, timestamp: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            arguments: Map::new(),
            allowed,
            timestamp: timestamp.into(),
        }
    }

    pub fn arg(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.to_string(), value.into());
        self
    }
}
