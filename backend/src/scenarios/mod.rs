//! Scenario generation for the guardrail training corpus.
//!
//! Each `ScenarioCategory` has one generator producing fully labeled
//! scenarios: a tool call, the ruleset it is judged against, an optional call
//! history, and the decision. All generation is deterministic based on the
//! RNG seed.
//!
//! # Key Principles
//!
//! 1. **Determinism**: Same seed + same plan → same scenarios
//! 2. **Mechanical labels**: Every generator's output is re-evaluated with
//!    `policy::evaluate_ruleset`; a label the interpreter disagrees with is an
//!    error, never an emitted example
//! 3. **Static dispatch**: Categories are a closed enum; the assembler walks a
//!    fixed, ordered list
//!
//! # Example
//!
//! ```
//! use guardrail_corpus_core_rs::pools::ValuePools;
//! use guardrail_corpus_core_rs::rng::RngManager;
//! use guardrail_corpus_core_rs::scenarios::ScenarioCategory;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut rng = RngManager::new(42);
//! let pools = ValuePools::finance();
//! let scenarios = ScenarioCategory::EdgeExactLimit.generate(&mut rng, &pools, 3)?;
//! assert_eq!(scenarios.len(), 3);
//! # Ok(())
//! # }
//! ```

pub mod edge;
pub mod multi_step;
pub mod normal;
pub mod rules;

use crate::models::{Decision, DecisionKind};
use crate::policy::{
    evaluate_ruleset, validate_ruleset, CallHistoryEntry, EvalContext, EvalError, Rule, ToolCall,
    ValidationError, TIMESTAMP_FORMAT,
};
use crate::pools::ValuePools;
use crate::rng::RngManager;
use crate::weights::{assign_weights, band, render_reasoning, ReasoningVars};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised while generating a scenario
#[derive(Debug, Error, PartialEq)]
pub enum ScenarioError {
    #[error("Value pool '{0}' is empty")]
    EmptyPool(&'static str),

    #[error("Value pool '{pool}' holds {available} distinct values, {required} required")]
    PoolTooSmall {
        pool: &'static str,
        available: usize,
        required: usize,
    },

    #[error("Invalid calendar value: {0}")]
    InvalidTimestamp(String),

    #[error("{category:?}: generated ruleset is invalid: {errors:?}")]
    InvalidRuleset {
        category: ScenarioCategory,
        errors: Vec<ValidationError>,
    },

    #[error("{category:?}: interpreter decided {actual:?}, category requires {expected:?}")]
    LabelMismatch {
        category: ScenarioCategory,
        expected: DecisionKind,
        actual: DecisionKind,
    },

    #[error("{category:?}: pass weight {pass_weight} outside its band")]
    WeightOutOfBand {
        category: ScenarioCategory,
        pass_weight: f64,
    },

    #[error("{category:?}: reasoning template failed to render: {reason}")]
    Reasoning {
        category: ScenarioCategory,
        reason: String,
    },

    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),
}

// ============================================================================
// CORPORA & CATEGORIES
// ============================================================================

/// The three output corpora
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorpusKind {
    NormalPass,
    EdgeCases,
    MultiStep,
}

impl CorpusKind {
    /// Fixed build order
    pub const ALL: [CorpusKind; 3] = [
        CorpusKind::NormalPass,
        CorpusKind::EdgeCases,
        CorpusKind::MultiStep,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            CorpusKind::NormalPass => "finance_pass_normal.jsonl",
            CorpusKind::EdgeCases => "finance_edge_cases.jsonl",
            CorpusKind::MultiStep => "finance_multi_step.jsonl",
        }
    }

    /// Examples per category in the default plan
    pub fn default_count_per_category(&self) -> usize {
        match self {
            CorpusKind::NormalPass => 200,
            CorpusKind::EdgeCases => 100,
            CorpusKind::MultiStep => 160,
        }
    }

    /// Categories of this corpus, in generation order
    pub fn categories(&self) -> Vec<ScenarioCategory> {
        ScenarioCategory::ALL
            .iter()
            .copied()
            .filter(|c| c.corpus() == *self)
            .collect()
    }

    /// Size of the corpus in the default plan
    pub fn default_target_size(&self) -> usize {
        self.categories().len() * self.default_count_per_category()
    }
}

/// One labeled scenario category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioCategory {
    // Normal pass
    PassTransferUnderLimit,
    PassAuthorizedAccountAccess,
    PassProperApproval,
    PassPiiWithTicket,
    PassLoanWithCreditCheck,
    PassExportWithoutPii,
    PassTradesWithinLimit,
    PassBalanceChecks,

    // Edge cases
    EdgeExactLimit,
    EdgeLooksInternal,
    EdgeDisabledRules,
    EdgePartialMatch,
    EdgeNearMissRegex,
    EdgeEmptyConditions,
    EdgeWhitelistedHighAmount,
    EdgeTimezoneBoundary,

    // Multi-step
    MultiBalanceEnumerationExport,
    MultiFailedTransfersClosure,
    MultiPiiSequenceExport,
    MultiReconPrivilegeEscalation,
    MultiBenignPatterns,
}

impl ScenarioCategory {
    /// Every category, in generation order
    pub const ALL: [ScenarioCategory; 21] = [
        ScenarioCategory::PassTransferUnderLimit,
        ScenarioCategory::PassAuthorizedAccountAccess,
        ScenarioCategory::PassProperApproval,
        ScenarioCategory::PassPiiWithTicket,
        ScenarioCategory::PassLoanWithCreditCheck,
        ScenarioCategory::PassExportWithoutPii,
        ScenarioCategory::PassTradesWithinLimit,
        ScenarioCategory::PassBalanceChecks,
        ScenarioCategory::EdgeExactLimit,
        ScenarioCategory::EdgeLooksInternal,
        ScenarioCategory::EdgeDisabledRules,
        ScenarioCategory::EdgePartialMatch,
        ScenarioCategory::EdgeNearMissRegex,
        ScenarioCategory::EdgeEmptyConditions,
        ScenarioCategory::EdgeWhitelistedHighAmount,
        ScenarioCategory::EdgeTimezoneBoundary,
        ScenarioCategory::MultiBalanceEnumerationExport,
        ScenarioCategory::MultiFailedTransfersClosure,
        ScenarioCategory::MultiPiiSequenceExport,
        ScenarioCategory::MultiReconPrivilegeEscalation,
        ScenarioCategory::MultiBenignPatterns,
    ];

    pub fn corpus(&self) -> CorpusKind {
        use ScenarioCategory::*;

        match self {
            PassTransferUnderLimit
            | PassAuthorizedAccountAccess
            | PassProperApproval
            | PassPiiWithTicket
            | PassLoanWithCreditCheck
            | PassExportWithoutPii
            | PassTradesWithinLimit
            | PassBalanceChecks => CorpusKind::NormalPass,

            EdgeExactLimit
            | EdgeLooksInternal
            | EdgeDisabledRules
            | EdgePartialMatch
            | EdgeNearMissRegex
            | EdgeEmptyConditions
            | EdgeWhitelistedHighAmount
            | EdgeTimezoneBoundary => CorpusKind::EdgeCases,

            MultiBalanceEnumerationExport
            | MultiFailedTransfersClosure
            | MultiPiiSequenceExport
            | MultiReconPrivilegeEscalation
            | MultiBenignPatterns => CorpusKind::MultiStep,
        }
    }

    /// The only legal label for this category
    pub fn expected_decision(&self) -> DecisionKind {
        use ScenarioCategory::*;

        match self {
            MultiBalanceEnumerationExport
            | MultiFailedTransfersClosure
            | MultiPiiSequenceExport
            | MultiReconPrivilegeEscalation => DecisionKind::Block,
            _ => DecisionKind::Pass,
        }
    }

    /// Whether scenarios of this category carry a call history
    pub fn has_history(&self) -> bool {
        self.corpus() == CorpusKind::MultiStep
    }

    /// Generate `count` scenarios of this category
    pub fn generate(
        &self,
        rng: &mut RngManager,
        pools: &ValuePools,
        count: usize,
    ) -> Result<Vec<Scenario>, ScenarioError> {
        use ScenarioCategory::*;

        match self {
            PassTransferUnderLimit => normal::transfer_under_limit(rng, pools, count),
            PassAuthorizedAccountAccess => normal::authorized_account_access(rng, pools, count),
            PassProperApproval => normal::proper_approval(rng, pools, count),
            PassPiiWithTicket => normal::pii_with_ticket(rng, pools, count),
            PassLoanWithCreditCheck => normal::loan_with_credit_check(rng, pools, count),
            PassExportWithoutPii => normal::export_without_pii(rng, pools, count),
            PassTradesWithinLimit => normal::trades_within_limit(rng, pools, count),
            PassBalanceChecks => normal::balance_checks(rng, pools, count),

            EdgeExactLimit => edge::exact_limit(rng, pools, count),
            EdgeLooksInternal => edge::looks_internal(rng, pools, count),
            EdgeDisabledRules => edge::disabled_rules(rng, pools, count),
            EdgePartialMatch => edge::partial_match(rng, pools, count),
            EdgeNearMissRegex => edge::near_miss_regex(rng, pools, count),
            EdgeEmptyConditions => edge::empty_conditions(rng, pools, count),
            EdgeWhitelistedHighAmount => edge::whitelisted_high_amount(rng, pools, count),
            EdgeTimezoneBoundary => edge::timezone_boundary(rng, pools, count),

            MultiBalanceEnumerationExport => {
                multi_step::balance_enumeration_export(rng, pools, count)
            }
            MultiFailedTransfersClosure => multi_step::failed_transfers_closure(rng, pools, count),
            MultiPiiSequenceExport => multi_step::pii_sequence_export(rng, pools, count),
            MultiReconPrivilegeEscalation => {
                multi_step::recon_privilege_escalation(rng, pools, count)
            }
            MultiBenignPatterns => multi_step::benign_patterns(rng, pools, count),
        }
    }
}

// ============================================================================
// SCENARIO
// ============================================================================

/// A fully labeled scenario, ready to be formatted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub category: ScenarioCategory,

    pub tool_call: ToolCall,

    /// Ordered ruleset
    pub rules: Vec<Rule>,

    /// Chronological prior calls, empty outside the multi-step corpus
    #[serde(default)]
    pub call_history: Vec<CallHistoryEntry>,

    /// Session context visible to `context.*` fields
    #[serde(default)]
    pub context: Map<String, Value>,

    pub decision: Decision,
}

impl Scenario {
    pub fn eval_context(&self) -> EvalContext {
        EvalContext::build(&self.tool_call, &self.call_history, &self.context)
    }
}

/// Unlabeled scenario inputs produced by a generator
#[derive(Debug, Clone)]
pub(crate) struct Draft {
    pub tool_call: ToolCall,
    pub rules: Vec<Rule>,
    pub call_history: Vec<CallHistoryEntry>,
    pub vars: ReasoningVars,
}

impl Draft {
    pub fn new(tool_call: ToolCall, rules: Vec<Rule>, vars: ReasoningVars) -> Self {
        Self {
            tool_call,
            rules,
            call_history: Vec::new(),
            vars,
        }
    }

    pub fn with_history(mut self, call_history: Vec<CallHistoryEntry>) -> Self {
        self.call_history = call_history;
        self
    }
}

/// Validate, evaluate and label a draft
///
/// The interpreter's verdict must equal the category's legal decision; the
/// weight split and reasoning are then drawn for that decision.
pub(crate) fn label(
    category: ScenarioCategory,
    draft: Draft,
    rng: &mut RngManager,
) -> Result<Scenario, ScenarioError> {
    validate_ruleset(&draft.rules)
        .map_err(|errors| ScenarioError::InvalidRuleset { category, errors })?;

    let context = Map::new();
    let eval_context = EvalContext::build(&draft.tool_call, &draft.call_history, &context);
    let verdict = evaluate_ruleset(&draft.rules, &eval_context)?;

    let expected = category.expected_decision();
    if verdict.decision != expected {
        return Err(ScenarioError::LabelMismatch {
            category,
            expected,
            actual: verdict.decision,
        });
    }

    let split = assign_weights(category, rng);
    if !band(category).contains(split.pass_weight) {
        return Err(ScenarioError::WeightOutOfBand {
            category,
            pass_weight: split.pass_weight,
        });
    }
    let reasoning =
        render_reasoning(category, &draft.vars, rng).map_err(|e| ScenarioError::Reasoning {
            category,
            reason: e.to_string(),
        })?;

    let matched_rules = match verdict.decision {
        DecisionKind::Block => Some(verdict.matched_rules),
        DecisionKind::Pass => None,
    };

    Ok(Scenario {
        category,
        tool_call: draft.tool_call,
        rules: draft.rules,
        call_history: draft.call_history,
        context,
        decision: Decision {
            pass_weight: split.pass_weight,
            block_weight: split.block_weight,
            decision: verdict.decision,
            reasoning,
            matched_rules,
        },
    })
}

// ============================================================================
// SHARED SAMPLING HELPERS
// ============================================================================

pub(crate) fn pick<'a>(
    rng: &mut RngManager,
    items: &'a [String],
    pool: &'static str,
) -> Result<&'a str, ScenarioError> {
    rng.choose(items)
        .map(|s| s.as_str())
        .ok_or(ScenarioError::EmptyPool(pool))
}

/// Pick an element different from `other`
pub(crate) fn pick_other<'a>(
    rng: &mut RngManager,
    items: &'a [String],
    other: &str,
    pool: &'static str,
) -> Result<&'a str, ScenarioError> {
    let candidates: Vec<&'a String> = items.iter().filter(|s| s.as_str() != other).collect();
    rng.choose(&candidates)
        .copied()
        .map(|s| s.as_str())
        .ok_or(ScenarioError::EmptyPool(pool))
}

pub(crate) fn ticket_id(rng: &mut RngManager, pools: &ValuePools) -> Result<String, ScenarioError> {
    let prefix = pick(rng, &pools.ticket_prefixes, "ticket_prefixes")?;
    Ok(format!("{}-{}", prefix, rng.range_inclusive(100_000, 999_999)))
}

/// Random 2024 session start between `hour_min` and `hour_max` (inclusive)
pub(crate) fn session_start(
    rng: &mut RngManager,
    max_month: u32,
    hour_min: u32,
    hour_max: u32,
) -> Result<NaiveDateTime, ScenarioError> {
    let month = rng.range_inclusive(1, i64::from(max_month)) as u32;
    let day = rng.range_inclusive(1, 28) as u32;
    let hour = rng.range_inclusive(i64::from(hour_min), i64::from(hour_max)) as u32;
    let minute = rng.range_inclusive(0, 59) as u32;

    NaiveDate::from_ymd_opt(2024, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .ok_or_else(|| {
            ScenarioError::InvalidTimestamp(format!("2024-{}-{} {}:{}", month, day, hour, minute))
        })
}

/// `base + offset_minutes`, formatted as a history timestamp
pub(crate) fn timestamp_at(base: NaiveDateTime, offset_minutes: i64) -> String {
    (base + Duration::minutes(offset_minutes))
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

/// A 2024 calendar date
pub(crate) fn date_2024(month: u32, day: u32) -> Result<NaiveDate, ScenarioError> {
    NaiveDate::from_ymd_opt(2024, month, day)
        .ok_or_else(|| ScenarioError::InvalidTimestamp(format!("2024-{}-{}", month, day)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_partition() {
        assert_eq!(CorpusKind::NormalPass.categories().len(), 8);
        assert_eq!(CorpusKind::EdgeCases.categories().len(), 8);
        assert_eq!(CorpusKind::MultiStep.categories().len(), 5);

        assert_eq!(CorpusKind::NormalPass.default_target_size(), 1600);
        assert_eq!(CorpusKind::EdgeCases.default_target_size(), 800);
        assert_eq!(CorpusKind::MultiStep.default_target_size(), 800);
    }

    #[test]
    fn test_only_four_multi_step_categories_block() {
        let blocking: Vec<ScenarioCategory> = ScenarioCategory::ALL
            .iter()
            .copied()
            .filter(|c| c.expected_decision() == DecisionKind::Block)
            .collect();
        assert_eq!(blocking.len(), 4);
        assert!(blocking.iter().all(|c| c.corpus() == CorpusKind::MultiStep));
    }

    #[test]
    fn test_category_serde_names() {
        let json = serde_json::to_string(&ScenarioCategory::EdgeNearMissRegex).unwrap();
        assert_eq!(json, "\"edge_near_miss_regex\"");
    }

    #[test]
    fn test_pick_other_never_returns_excluded() {
        let pools = ValuePools::finance();
        let mut rng = RngManager::new(11);
        for _ in 0..100 {
            let other = pick_other(&mut rng, &pools.authorized_accounts, "ACC-SELF-001", "a").unwrap();
            assert_ne!(other, "ACC-SELF-001");
        }
    }

    #[test]
    fn test_timestamp_at_formats_utc() {
        let base = NaiveDate::from_ymd_opt(2024, 1, 15)
            .and_then(|d| d.and_hms_opt(23, 50, 0))
            .unwrap();
        assert_eq!(timestamp_at(base, 15), "2024-01-16T00:05:00Z");
    }
}
