// Normal pass generators
//
// Ordinary, policy-compliant tool calls. Every ruleset contains exactly the
// rule the call could trip, with inputs chosen on the safe side of it.

use super::rules::{self, HIGH_VALUE_THRESHOLD, TRADE_QUANTITY_LIMIT};
use super::{
    date_2024, label, pick, pick_other, ticket_id, Draft, Scenario, ScenarioCategory, ScenarioError,
};
use crate::policy::ToolCall;
use crate::pools::ValuePools;
use crate::rng::RngManager;
use crate::weights::ReasoningVars;
use chrono::Duration;
use serde_json::Value;

const PII_FIELD_SETS: &[&[&str]] = &[
    &["name", "email"],
    &["name", "phone"],
    &["name", "address"],
    &["name", "ssn"],
    &["name", "email", "phone"],
    &["name", "address", "phone"],
    &["email", "phone", "address"],
];

const PII_PURPOSES: &[&str] = &[
    "customer support",
    "account verification",
    "fraud investigation",
    "billing inquiry",
    "service request",
    "compliance audit",
];

const LOAN_TERMS: &[i64] = &[12, 24, 36, 48, 60, 72, 84, 120, 180, 240, 360];

const COLLATERAL: &[Option<&str>] = &[None, Some("property"), Some("vehicle"), Some("securities")];

const REPORT_TYPES: &[&str] = &[
    "statement",
    "transactions",
    "summary",
    "analytics",
    "audit_log",
    "balance_history",
];

const ORDER_TYPES: &[&str] = &["market", "limit", "stop", "stop_limit"];

const TRADE_ACTIONS: &[&str] = &["buy", "sell"];

fn two_decimals(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn choose_str(rng: &mut RngManager, items: &[&'static str]) -> &'static str {
    rng.choose(items).copied().unwrap_or_default()
}

/// Internal transfers of 100..=9950 in steps of 50, cycling through a shuffled
/// amount list so small corpora still spread over the range
pub fn transfer_under_limit(
    rng: &mut RngManager,
    pools: &ValuePools,
    count: usize,
) -> Result<Vec<Scenario>, ScenarioError> {
    let mut amounts: Vec<i64> = (100..HIGH_VALUE_THRESHOLD).step_by(50).collect();
    rng.shuffle(&mut amounts);

    let mut scenarios = Vec::with_capacity(count);
    for i in 0..count {
        let amount = amounts[i % amounts.len()];
        let from = pick(rng, &pools.authorized_accounts, "authorized_accounts")?;
        let to = pick_other(rng, &pools.authorized_accounts, from, "authorized_accounts")?;

        let call = ToolCall::new("transfer_funds")
            .arg("from_account", from)
            .arg("to_account", to)
            .arg("amount", amount)
            .arg("currency", pick(rng, &pools.currencies, "currencies")?)
            .arg("approved", rng.coin())
            .arg("memo", pick(rng, &pools.memos, "memos")?)
            .arg("transfer_type", "internal");

        let vars = ReasoningVars::new().amount("amount", "amount_fmt", amount);
        let draft = Draft::new(call, vec![rules::high_value_transfer_unapproved()], vars);
        scenarios.push(label(ScenarioCategory::PassTransferUnderLimit, draft, rng)?);
    }
    Ok(scenarios)
}

pub fn authorized_account_access(
    rng: &mut RngManager,
    pools: &ValuePools,
    count: usize,
) -> Result<Vec<Scenario>, ScenarioError> {
    let mut scenarios = Vec::with_capacity(count);
    for _ in 0..count {
        let account = pick(rng, &pools.authorized_accounts, "authorized_accounts")?;
        let call = ToolCall::new("get_balance")
            .arg("account_id", account)
            .arg("include_pending", rng.coin());

        let vars = ReasoningVars::new().set("account", account);
        let draft = Draft::new(call, vec![rules::unauthorized_account_access(pools)], vars);
        scenarios.push(label(ScenarioCategory::PassAuthorizedAccountAccess, draft, rng)?);
    }
    Ok(scenarios)
}

/// High-value external transfers that carry the approval flag
pub fn proper_approval(
    rng: &mut RngManager,
    pools: &ValuePools,
    count: usize,
) -> Result<Vec<Scenario>, ScenarioError> {
    let mut scenarios = Vec::with_capacity(count);
    for _ in 0..count {
        let amount = rng.range_inclusive(HIGH_VALUE_THRESHOLD + 1, 100_000);
        let call = ToolCall::new("transfer_funds")
            .arg("from_account", pick(rng, &pools.authorized_accounts, "authorized_accounts")?)
            .arg("to_account", pick(rng, &pools.whitelisted_external, "whitelisted_external")?)
            .arg("amount", amount)
            .arg("currency", pick(rng, &pools.currencies, "currencies")?)
            .arg("approved", true)
            .arg("memo", pick(rng, &pools.memos, "memos")?)
            .arg("transfer_type", "external");

        let vars = ReasoningVars::new().amount("amount", "amount_fmt", amount);
        let draft = Draft::new(call, vec![rules::high_value_transfer_unapproved()], vars);
        scenarios.push(label(ScenarioCategory::PassProperApproval, draft, rng)?);
    }
    Ok(scenarios)
}

pub fn pii_with_ticket(
    rng: &mut RngManager,
    pools: &ValuePools,
    count: usize,
) -> Result<Vec<Scenario>, ScenarioError> {
    let mut scenarios = Vec::with_capacity(count);
    for _ in 0..count {
        let ticket = ticket_id(rng, pools)?;
        let fields = rng.choose(PII_FIELD_SETS).copied().unwrap_or_default();

        let call = ToolCall::new("query_customer_data")
            .arg("customer_id", pools.customer_id(rng)?)
            .arg("fields", fields.to_vec())
            .arg("purpose", choose_str(rng, PII_PURPOSES))
            .arg("ticket_id", ticket.as_str());

        let vars = ReasoningVars::new().set("ticket", &ticket);
        let draft = Draft::new(call, vec![rules::pii_without_ticket()], vars);
        scenarios.push(label(ScenarioCategory::PassPiiWithTicket, draft, rng)?);
    }
    Ok(scenarios)
}

pub fn loan_with_credit_check(
    rng: &mut RngManager,
    pools: &ValuePools,
    count: usize,
) -> Result<Vec<Scenario>, ScenarioError> {
    let mut scenarios = Vec::with_capacity(count);
    for _ in 0..count {
        let amount = rng.range_inclusive(5_000, 500_000);
        let term = rng.choose(LOAN_TERMS).copied().unwrap_or(12);
        let rate = two_decimals(rng.uniform(3.5, 18.9));
        let collateral = match rng.choose(COLLATERAL).copied().flatten() {
            Some(kind) => Value::from(kind),
            None => Value::Null,
        };

        let call = ToolCall::new("approve_loan")
            .arg("application_id", format!("LOAN-{}", rng.range_inclusive(100_000, 999_999)))
            .arg("loan_type", pick(rng, &pools.loan_types, "loan_types")?)
            .arg("amount", amount)
            .arg("term_months", term)
            .arg("interest_rate", rate)
            .arg("credit_checked", true)
            .arg("collateral", collateral);

        let vars = ReasoningVars::new()
            .amount("amount", "amount_fmt", amount)
            .set("term", term);
        let draft = Draft::new(call, vec![rules::loan_without_credit_check()], vars);
        scenarios.push(label(ScenarioCategory::PassLoanWithCreditCheck, draft, rng)?);
    }
    Ok(scenarios)
}

/// Reports over one to three owned accounts, PII flags off
pub fn export_without_pii(
    rng: &mut RngManager,
    pools: &ValuePools,
    count: usize,
) -> Result<Vec<Scenario>, ScenarioError> {
    if pools.authorized_accounts.is_empty() {
        return Err(ScenarioError::EmptyPool("authorized_accounts"));
    }

    let mut scenarios = Vec::with_capacity(count);
    for _ in 0..count {
        let start = date_2024(rng.range_inclusive(1, 6) as u32, 1)?;
        let end = start + Duration::days(rng.range_inclusive(30, 90));
        let max_accounts = pools.authorized_accounts.len().min(3) as i64;
        let k = rng.range_inclusive(1, max_accounts) as usize;
        let accounts = rng.sample(&pools.authorized_accounts, k);

        let call = ToolCall::new("export_financial_report")
            .arg("report_type", choose_str(rng, REPORT_TYPES))
            .arg("accounts", accounts)
            .arg("start_date", start.format("%Y-%m-%d").to_string())
            .arg("end_date", end.format("%Y-%m-%d").to_string())
            .arg("format", pick(rng, &pools.report_formats, "report_formats")?)
            .arg("include_ssn", false)
            .arg("include_full_card", false);

        let draft = Draft::new(call, vec![rules::bulk_pii_export()], ReasoningVars::new());
        scenarios.push(label(ScenarioCategory::PassExportWithoutPii, draft, rng)?);
    }
    Ok(scenarios)
}

pub fn trades_within_limit(
    rng: &mut RngManager,
    pools: &ValuePools,
    count: usize,
) -> Result<Vec<Scenario>, ScenarioError> {
    let mut scenarios = Vec::with_capacity(count);
    for _ in 0..count {
        let quantity = rng.range_inclusive(1, TRADE_QUANTITY_LIMIT - 1);
        let symbol = pick(rng, &pools.symbols, "symbols")?;
        let action = choose_str(rng, TRADE_ACTIONS);
        let order_type = choose_str(rng, ORDER_TYPES);
        let account = pick(rng, &pools.authorized_accounts, "authorized_accounts")?;
        let limit_price = if rng.coin() {
            Value::from(two_decimals(rng.uniform(10.0, 5_000.0)))
        } else {
            Value::Null
        };

        let call = ToolCall::new("execute_trade")
            .arg("symbol", symbol)
            .arg("action", action)
            .arg("quantity", quantity)
            .arg("order_type", order_type)
            .arg("account_id", account)
            .arg("limit_price", limit_price);

        let vars = ReasoningVars::new()
            .set("quantity", quantity)
            .set("symbol", symbol);
        let draft = Draft::new(call, vec![rules::high_volume_trading()], vars);
        scenarios.push(label(ScenarioCategory::PassTradesWithinLimit, draft, rng)?);
    }
    Ok(scenarios)
}

/// Single balance checks; the rate rule reads a context counter that a
/// history-free call never raises
pub fn balance_checks(
    rng: &mut RngManager,
    pools: &ValuePools,
    count: usize,
) -> Result<Vec<Scenario>, ScenarioError> {
    let mut scenarios = Vec::with_capacity(count);
    for _ in 0..count {
        let account = pick(rng, &pools.authorized_accounts, "authorized_accounts")?;
        let call = ToolCall::new("get_balance")
            .arg("account_id", account)
            .arg("include_pending", rng.coin());

        let vars = ReasoningVars::new().set("account", account);
        let draft = Draft::new(call, vec![rules::rapid_balance_checks()], vars);
        scenarios.push(label(ScenarioCategory::PassBalanceChecks, draft, rng)?);
    }
    Ok(scenarios)
}
