//! Weight & Reasoning Assigner
//!
//! Maps a scenario category to a confidence band and picks the
//! `(pass_weight, block_weight)` split inside it. Bands are disjoint by tier:
//!
//! | tier                  | pass_weight band      |
//! |-----------------------|-----------------------|
//! | clear pass            | within [0.85, 0.99]   |
//! | settled edge pass     | within [0.80, 0.95]   |
//! | ambiguous edge pass   | within [0.51, 0.78]   |
//! | clear block           | within [0.01, 0.10]   |
//!
//! Edge cases carry lower confidence even though their label is fixed. Edge
//! cases whose rule text settles the question outright (disabled rule, empty
//! condition list, whitelisted counterparty) sit in the settled tier. Weights
//! are drawn as whole hundredths, so `block_weight = 1 - pass_weight` is exact
//! at two decimals.

pub mod reasoning;

pub use reasoning::{fill, render_reasoning, templates, thousands, ReasoningVars};

use crate::models::DecisionKind;
use crate::rng::RngManager;
use crate::scenarios::ScenarioCategory;

/// Confidence tier of a category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceTier {
    ClearPass,
    SettledEdgePass,
    AmbiguousEdgePass,
    ClearBlock,
}

impl ConfidenceTier {
    /// Envelope every band of the tier lies in
    pub fn envelope(&self) -> WeightBand {
        match self {
            ConfidenceTier::ClearPass => WeightBand::new(85, 99),
            ConfidenceTier::SettledEdgePass => WeightBand::new(80, 95),
            ConfidenceTier::AmbiguousEdgePass => WeightBand::new(51, 78),
            ConfidenceTier::ClearBlock => WeightBand::new(1, 10),
        }
    }
}

/// Inclusive pass-weight band, in hundredths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightBand {
    pub min_cents: u8,
    pub max_cents: u8,
}

impl WeightBand {
    pub const fn new(min_cents: u8, max_cents: u8) -> Self {
        Self {
            min_cents,
            max_cents,
        }
    }

    pub fn min(&self) -> f64 {
        f64::from(self.min_cents) / 100.0
    }

    pub fn max(&self) -> f64 {
        f64::from(self.max_cents) / 100.0
    }

    /// Whether a two-decimal pass weight falls inside the band
    pub fn contains(&self, pass_weight: f64) -> bool {
        let cents = (pass_weight * 100.0).round();
        cents >= f64::from(self.min_cents) && cents <= f64::from(self.max_cents)
    }

    /// Whether every weight in the band agrees with `decision`
    pub fn agrees_with(&self, decision: DecisionKind) -> bool {
        match decision {
            DecisionKind::Pass => self.min_cents > 50 && self.max_cents <= 100,
            DecisionKind::Block => self.max_cents < 50,
        }
    }
}

/// A two-decimal weight split
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightSplit {
    pub pass_weight: f64,
    pub block_weight: f64,
}

/// Pass-weight band of a category
pub fn band(category: ScenarioCategory) -> WeightBand {
    use ScenarioCategory::*;

    match category {
        PassTransferUnderLimit
        | PassAuthorizedAccountAccess
        | PassProperApproval
        | PassPiiWithTicket
        | PassLoanWithCreditCheck
        | PassExportWithoutPii
        | PassTradesWithinLimit
        | PassBalanceChecks
        | MultiBenignPatterns => WeightBand::new(85, 99),

        EdgeExactLimit => WeightBand::new(55, 70),
        EdgeLooksInternal => WeightBand::new(60, 75),
        EdgeDisabledRules => WeightBand::new(85, 95),
        EdgePartialMatch => WeightBand::new(65, 78),
        EdgeNearMissRegex => WeightBand::new(55, 72),
        EdgeEmptyConditions => WeightBand::new(80, 92),
        EdgeWhitelistedHighAmount => WeightBand::new(82, 94),
        // Deliberately wide and low: the business-hours boundary is undefined
        EdgeTimezoneBoundary => WeightBand::new(51, 65),

        MultiBalanceEnumerationExport => WeightBand::new(1, 5),
        MultiFailedTransfersClosure => WeightBand::new(3, 10),
        MultiPiiSequenceExport => WeightBand::new(1, 4),
        MultiReconPrivilegeEscalation => WeightBand::new(1, 5),
    }
}

/// Confidence tier of a category
pub fn tier(category: ScenarioCategory) -> ConfidenceTier {
    use ScenarioCategory::*;

    match category {
        EdgeDisabledRules | EdgeEmptyConditions | EdgeWhitelistedHighAmount => {
            ConfidenceTier::SettledEdgePass
        }
        EdgeExactLimit | EdgeLooksInternal | EdgePartialMatch | EdgeNearMissRegex
        | EdgeTimezoneBoundary => ConfidenceTier::AmbiguousEdgePass,
        _ => match category.expected_decision() {
            DecisionKind::Pass => ConfidenceTier::ClearPass,
            DecisionKind::Block => ConfidenceTier::ClearBlock,
        },
    }
}

/// Draw a weight split for a category
pub fn assign_weights(category: ScenarioCategory, rng: &mut RngManager) -> WeightSplit {
    let band = band(category);
    let cents = rng.range_inclusive(i64::from(band.min_cents), i64::from(band.max_cents));
    WeightSplit {
        pass_weight: cents as f64 / 100.0,
        block_weight: (100 - cents) as f64 / 100.0,
    }
}
