//! Guardrail decision model
//!
//! The assistant turn of every example is the JSON encoding of a `Decision`.

use serde::{Deserialize, Serialize};

/// Final label of a tool call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionKind {
    Pass,
    Block,
}

impl DecisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionKind::Pass => "pass",
            DecisionKind::Block => "block",
        }
    }
}

/// A labeled guardrail decision
///
/// Field order is the serialized order:
/// `pass_weight, block_weight, decision, reasoning[, matched_rules]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Confidence the call is safe, two decimals in [0, 1]
    pub pass_weight: f64,

    /// Confidence the call violates a rule, two decimals in [0, 1]
    pub block_weight: f64,

    pub decision: DecisionKind,

    /// Human-readable justification
    pub reasoning: String,

    /// Ids of firing block rules; present only for `block`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_rules: Option<Vec<String>>,
}

impl Decision {
    /// Two-decimal sum of the weight split
    pub fn weight_sum(&self) -> f64 {
        ((self.pass_weight + self.block_weight) * 100.0).round() / 100.0
    }

    /// Whether the weight split points the same way as the label
    pub fn weights_consistent(&self) -> bool {
        match self.decision {
            DecisionKind::Pass => self.pass_weight > self.block_weight,
            DecisionKind::Block => self.block_weight > self.pass_weight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_decision_omits_matched_rules() {
        let decision = Decision {
            pass_weight: 0.93,
            block_weight: 0.07,
            decision: DecisionKind::Pass,
            reasoning: "ok".to_string(),
            matched_rules: None,
        };
        let json = serde_json::to_string(&decision).unwrap();
        assert_eq!(
            json,
            r#"{"pass_weight":0.93,"block_weight":0.07,"decision":"pass","reasoning":"ok"}"#
        );
    }

    #[test]
    fn test_block_decision_lists_matched_rules() {
        let decision = Decision {
            pass_weight: 0.02,
            block_weight: 0.98,
            decision: DecisionKind::Block,
            reasoning: "blocked".to_string(),
            matched_rules: Some(vec!["bulk-pii-export".to_string()]),
        };
        let value = serde_json::to_value(&decision).unwrap();
        assert_eq!(value["matched_rules"][0], "bulk-pii-export");
        assert!(decision.weights_consistent());
        assert_eq!(decision.weight_sum(), 1.0);
    }
}
