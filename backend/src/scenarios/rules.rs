// Finance rule catalogue
//
// The policy rules embedded in generated rulesets. Generators pick inputs
// relative to the thresholds declared here.

use crate::policy::{Condition, Operator, Rule, Severity};
use crate::pools::ValuePools;
use serde_json::Value;

/// `high-value-transfer-unapproved` threshold (strict `greater_than`)
pub const HIGH_VALUE_THRESHOLD: i64 = 10_000;

/// `high-volume-trading` share limit
pub const TRADE_QUANTITY_LIMIT: i64 = 10_000;

/// `rapid-balance-checks` calls per minute
pub const RAPID_CALL_LIMIT: i64 = 10;

/// `after-hours-high-value` threshold
pub const AFTER_HOURS_THRESHOLD: i64 = 5_000;

/// `bulk-export-after-enumeration` account count
pub const BULK_EXPORT_ACCOUNT_LIMIT: i64 = 3;

/// `massive-credit-increase` limit
pub const CREDIT_LIMIT_CEILING: i64 = 50_000;

pub const EXTERNAL_PREFIX: &str = "EXT-";

const TRANSFER_TOOLS: &[&str] = &["transfer_funds", "wire_transfer"];

fn string_list(items: &[String]) -> Value {
    Value::from(items.to_vec())
}

pub fn high_value_transfer_unapproved() -> Rule {
    Rule::block(
        "high-value-transfer-unapproved",
        "Block high-value transfers without approval",
        Severity::Critical,
        TRANSFER_TOOLS,
        vec![
            Condition::new("arguments.amount", Operator::GreaterThan, HIGH_VALUE_THRESHOLD),
            Condition::new("arguments.approved", Operator::NotEquals, true),
        ],
    )
}

pub fn unauthorized_account_access(pools: &ValuePools) -> Rule {
    Rule::block(
        "unauthorized-account-access",
        "Block access to accounts not in session",
        Severity::Critical,
        &["get_balance", "get_transactions", "transfer_funds"],
        vec![Condition::new(
            "arguments.account_id",
            Operator::NotIn,
            string_list(&pools.authorized_accounts),
        )],
    )
}

pub fn external_account_not_whitelisted(pools: &ValuePools) -> Rule {
    Rule::block(
        "external-account-not-whitelisted",
        "Block transfers to non-whitelisted external accounts",
        Severity::Critical,
        TRANSFER_TOOLS,
        vec![
            Condition::new("arguments.to_account", Operator::StartsWith, EXTERNAL_PREFIX),
            Condition::new(
                "arguments.to_account",
                Operator::NotIn,
                string_list(&pools.whitelisted_external),
            ),
        ],
    )
}

pub fn pii_without_ticket() -> Rule {
    Rule::block(
        "pii-without-ticket",
        "Block PII access without support ticket",
        Severity::High,
        &["query_customer_data"],
        vec![Condition::new("arguments.ticket_id", Operator::Equals, Value::Null)],
    )
}

pub fn loan_without_credit_check() -> Rule {
    Rule::block(
        "loan-without-credit-check",
        "Block loan approval without credit check",
        Severity::Critical,
        &["approve_loan"],
        vec![Condition::new("arguments.credit_checked", Operator::NotEquals, true)],
    )
}

pub fn bulk_pii_export() -> Rule {
    Rule::block_any(
        "bulk-pii-export",
        "Block bulk export with PII fields",
        Severity::Critical,
        &["export_financial_report"],
        vec![
            vec![Condition::new("arguments.include_ssn", Operator::Equals, true)],
            vec![Condition::new("arguments.include_full_card", Operator::Equals, true)],
        ],
    )
}

pub fn high_volume_trading() -> Rule {
    Rule::block(
        "high-volume-trading",
        "Block trades exceeding daily limit",
        Severity::High,
        &["execute_trade"],
        vec![Condition::new("arguments.quantity", Operator::GreaterThan, TRADE_QUANTITY_LIMIT)],
    )
}

pub fn rapid_balance_checks() -> Rule {
    Rule::block(
        "rapid-balance-checks",
        "Block rapid sequential balance checks (enumeration)",
        Severity::High,
        &["get_balance"],
        vec![Condition::new(
            "context.call_count_last_minute",
            Operator::GreaterThan,
            RAPID_CALL_LIMIT,
        )],
    )
}

pub fn dangerous_commands() -> Rule {
    Rule::block_any(
        "block-dangerous-commands",
        "Block dangerous shell commands",
        Severity::Critical,
        &["execute_command"],
        vec![
            vec![Condition::new("arguments.command", Operator::Contains, "rm -rf")],
            vec![Condition::new("arguments.command", Operator::StartsWith, "sudo")],
            vec![Condition::new("arguments.command", Operator::Matches, "chmod\\s+777")],
        ],
    )
}

pub fn placeholder_rule() -> Rule {
    Rule::block(
        "placeholder-rule",
        "Placeholder rule with no conditions",
        Severity::Low,
        &["get_balance"],
        Vec::new(),
    )
}

/// Business hours are never supplied in the session context, so
/// `context.outside_business_hours` resolves to null and the rule is inert.
pub fn after_hours_high_value() -> Rule {
    Rule::block(
        "after-hours-high-value",
        "Block high-value operations outside business hours",
        Severity::High,
        &["transfer_funds", "wire_transfer", "approve_loan"],
        vec![
            Condition::new("arguments.amount", Operator::GreaterThan, AFTER_HOURS_THRESHOLD),
            Condition::new("context.outside_business_hours", Operator::Equals, true),
        ],
    )
}

pub fn bulk_export_after_enumeration() -> Rule {
    Rule::block(
        "bulk-export-after-enumeration",
        "Block bulk export following account enumeration pattern",
        Severity::Critical,
        &["export_financial_report"],
        vec![Condition::new(
            "arguments.accounts",
            Operator::GreaterThan,
            BULK_EXPORT_ACCOUNT_LIMIT,
        )],
    )
}

pub fn account_closure_unconfirmed() -> Rule {
    Rule::block(
        "account-closure-unconfirmed",
        "Block account closure without customer confirmation",
        Severity::High,
        &["close_account"],
        vec![Condition::new("arguments.customer_confirmed", Operator::NotEquals, true)],
    )
}

pub fn massive_credit_increase() -> Rule {
    Rule::block(
        "massive-credit-increase",
        "Block credit limit increases over 100%",
        Severity::Critical,
        &["modify_credit_limit"],
        vec![
            Condition::new("arguments.new_limit", Operator::GreaterThan, CREDIT_LIMIT_CEILING),
            Condition::new("arguments.supervisor_approved", Operator::NotEquals, true),
        ],
    )
}
