//! Property Tests - Weights, Thresholds and Labels
//!
//! Randomized checks over seeds, amounts and categories.
//!
//! Critical invariants tested:
//! - Weight splits always sum to 1.00 and stay inside the category band
//! - The high-value threshold is strict for every amount
//! - Ranged draws never leave their bounds
//! - Any seed yields labels that agree with the interpreter

use guardrail_corpus_core_rs::policy::{evaluate, evaluate_ruleset, ToolCall};
use guardrail_corpus_core_rs::pools::ValuePools;
use guardrail_corpus_core_rs::scenarios::rules::{self, HIGH_VALUE_THRESHOLD};
use guardrail_corpus_core_rs::weights::{assign_weights, band};
use guardrail_corpus_core_rs::{RngManager, ScenarioCategory};
use proptest::prelude::*;
use serde_json::Map;

fn category_strategy() -> impl Strategy<Value = ScenarioCategory> {
    (0..ScenarioCategory::ALL.len()).prop_map(|i| ScenarioCategory::ALL[i])
}

proptest! {
    #[test]
    fn weight_split_sums_to_one_and_stays_in_band(seed in any::<u64>(), category in category_strategy()) {
        let mut rng = RngManager::new(seed);
        let split = assign_weights(category, &mut rng);

        prop_assert_eq!(((split.pass_weight + split.block_weight) * 100.0).round(), 100.0);
        prop_assert!(band(category).contains(split.pass_weight));
        prop_assert!(band(category).agrees_with(category.expected_decision()));
    }

    #[test]
    fn high_value_threshold_is_strict(amount in -1_000_000i64..1_000_000i64, approved in any::<bool>()) {
        let call = ToolCall::new("transfer_funds")
            .arg("amount", amount)
            .arg("approved", approved);
        let fired = evaluate(&rules::high_value_transfer_unapproved(), &call, &[], &Map::new()).unwrap();
        prop_assert_eq!(fired, amount > HIGH_VALUE_THRESHOLD && !approved);
    }

    #[test]
    fn range_inclusive_stays_in_bounds(seed in any::<u64>(), min in -10_000i64..10_000, span in 0i64..10_000) {
        let mut rng = RngManager::new(seed);
        for _ in 0..32 {
            let value = rng.range_inclusive(min, min + span);
            prop_assert!(value >= min && value <= min + span);
        }
    }

    #[test]
    fn unauthorized_access_fires_for_foreign_accounts(account in "[A-Z]{3}-[A-Z0-9]{3,8}") {
        let pools = ValuePools::finance();
        let call = ToolCall::new("get_balance").arg("account_id", account.as_str());
        let fired = evaluate(&rules::unauthorized_account_access(&pools), &call, &[], &Map::new()).unwrap();
        prop_assert_eq!(fired, !pools.authorized_accounts.contains(&account));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn any_seed_labels_agree_with_interpreter(seed in any::<u64>(), category in category_strategy()) {
        let mut rng = RngManager::new(seed);
        let scenarios = category.generate(&mut rng, &ValuePools::finance(), 4).unwrap();
        for scenario in &scenarios {
            let verdict = evaluate_ruleset(&scenario.rules, &scenario.eval_context()).unwrap();
            prop_assert_eq!(verdict.decision, scenario.decision.decision);
            prop_assert_eq!(scenario.decision.decision, category.expected_decision());
            prop_assert!(band(category).contains(scenario.decision.pass_weight));
        }
    }
}
