// Reasoning templates
//
// Hand-authored justifications per category, rendered with handlebars in
// strict mode: a placeholder with no value is a render error. `_fmt`
// variables carry thousands separators.

use crate::rng::RngManager;
use crate::scenarios::ScenarioCategory;
use handlebars::{no_escape, Handlebars, RenderError};
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Example-specific values interpolated into a template
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReasoningVars {
    values: Map<String, Value>,
}

impl ReasoningVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: impl ToString) -> Self {
        self.values
            .insert(key.to_string(), Value::String(value.to_string()));
        self
    }

    /// Sets `key` (plain digits) and `fmt_key` (thousands separators)
    pub fn amount(self, key: &str, fmt_key: &str, value: i64) -> Self {
        self.set(key, value).set(fmt_key, thousands(value))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// Template data
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }
}

/// `1234567` → `1,234,567`
pub fn thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Justification templates of a category
pub fn templates(category: ScenarioCategory) -> &'static [&'static str] {
    use ScenarioCategory::*;

    match category {
        PassTransferUnderLimit => &[
            "Transfer of ${{amount}} is below $10,000 threshold, no additional approval required",
            "${{amount_fmt}} internal transfer stays under the $10,000 approval limit",
            "Amount ${{amount}} does not exceed 10000, high-value rule not triggered",
            "Transfer between own accounts for ${{amount_fmt}}, under approval threshold",
        ],
        PassAuthorizedAccountAccess => &[
            "Account {{account}} is in authorized session list, access permitted",
            "Balance check for {{account}} allowed, account is in user's authorized accounts",
            "{{account}} present in authorized accounts list, balance inquiry approved",
            "User has authorization for {{account}}, balance check proceeds normally",
        ],
        PassProperApproval => &[
            "Transfer of ${{amount_fmt}} has proper approval flag set, proceeding",
            "High-value transfer approved, ${{amount_fmt}} with approval=true bypasses block",
            "${{amount_fmt}} transfer approved per policy, approval flag validated",
            "Approved high-value transfer of ${{amount_fmt}} meets all requirements",
        ],
        PassPiiWithTicket => &[
            "PII access authorized with ticket {{ticket}}, audit trail established",
            "Valid ticket_id {{ticket}} provided for customer data access",
            "Customer data query approved, ticket {{ticket}} validates request",
            "Ticket {{ticket}} present, PII access for support purposes allowed",
        ],
        PassLoanWithCreditCheck => &[
            "Loan of ${{amount_fmt}} approved with credit check completed",
            "Credit verification passed, ${{amount_fmt}} loan approval proceeds",
            "${{amount_fmt}} loan meets credit check requirement, approval valid",
            "Credit check flag verified, loan for ${{amount_fmt}} over {{term}} months approved",
        ],
        PassExportWithoutPii => &[
            "Export excludes PII fields (SSN/card), report generation allowed",
            "Financial report without sensitive PII fields approved for export",
            "No SSN or full card numbers in export, passes PII restriction",
            "Report export approved, include_ssn and include_full_card both false",
        ],
        PassTradesWithinLimit => &[
            "Trade of {{quantity}} shares {{symbol}} within daily limit of 10,000",
            "{{quantity}} unit {{symbol}} trade approved, under volume threshold",
            "Order for {{quantity}} {{symbol}} within acceptable trading limits",
            "{{symbol}} trade quantity {{quantity}} below 10,000 share limit",
        ],
        PassBalanceChecks => &[
            "Standard balance check for {{account}}, no rate limiting triggered",
            "Single balance inquiry for {{account}} within normal usage patterns",
            "Balance request for {{account}} approved, call rate below threshold",
            "Normal balance check on {{account}}, not flagged for enumeration",
        ],
        EdgeExactLimit => &[
            "Transfer of exactly $10,000 at threshold boundary, greater_than requires >10000",
            "$10,000 precisely at limit, rule triggers on amounts exceeding 10000",
            "Boundary case: $10,000 does not exceed threshold, technically passes",
            "Edge: amount equals limit of $10,000, greater_than condition not met",
        ],
        EdgeLooksInternal => &[
            "Account {{account}} doesn't match EXT- prefix, rule not triggered",
            "Transfer to {{account}} passes, starts_with 'EXT-' condition not met",
            "Ambiguous account name {{account}} not caught by external account rule",
            "{{account}} bypasses rule as it lacks required EXT- prefix",
        ],
        EdgeDisabledRules => &[
            "Rule high-value-transfer-unapproved is disabled, ${{amount_fmt}} transfer allowed",
            "Transfer of ${{amount_fmt}} passes, blocking rule not enabled",
            "Disabled rule cannot block ${{amount_fmt}} unapproved transfer",
            "${{amount_fmt}} transfer proceeds, enabled: false bypasses rule check",
        ],
        EdgePartialMatch => &[
            "${{amount}} below $10k threshold and internal account, no rule fully matches",
            "Partial condition met (unapproved) but amount ${{amount}} under limit",
            "Two rules checked, neither fully triggered: amount ok, account internal",
            "Transfer ${{amount}} passes both rules: under limit and not external",
        ],
        EdgeNearMissRegex => &[
            "Command '{{command_excerpt}}...' doesn't match dangerous patterns exactly",
            "Near-miss: command similar to blocked pattern but not exact match",
            "Pattern check passed: no exact match for rm -rf, sudo prefix, or chmod 777",
            "Command resembles but doesn't match blocked patterns precisely",
        ],
        EdgeEmptyConditions => &[
            "Rule has empty conditions array, cannot match any criteria",
            "No conditions defined in rule, passes by default",
            "Empty conditions list means rule cannot trigger a block",
            "Rule placeholder-rule has no conditions to evaluate",
        ],
        EdgeWhitelistedHighAmount => &[
            "${{amount_fmt}} to {{account}}: high value approved, external whitelisted",
            "Both rules pass: approved=true for amount, {{account}} in whitelist",
            "Large transfer to whitelisted {{account}} with approval, both conditions met",
            "${{amount_fmt}} transfer approved to trusted external account {{account}}",
        ],
        EdgeTimezoneBoundary => &[
            "Boundary time {{timestamp}}, business hours interpretation varies by timezone",
            "${{amount}} at time boundary, rule interpretation depends on local TZ",
            "Transfer at {{timestamp}} near business hours edge, ambiguous enforcement",
            "Timezone boundary case: {{timestamp}} may or may not be after-hours",
        ],
        MultiBalanceEnumerationExport => &[
            "Bulk export of {{count}} accounts after sequential balance enumeration detected",
            "Pattern: {{count}} rapid balance checks followed by bulk export attempt",
            "Enumeration-to-exfiltration pattern: {{count}} accounts enumerated then exported",
            "Blocked: {{count}} account export after suspicious sequential access",
        ],
        MultiFailedTransfersClosure => &[
            "Account closure attempt after {{count}} blocked transfers, no customer confirmation",
            "Pattern: {{count}} failed external transfers then unconfirmed closure",
            "Suspicious: closure request follows {{count}} denied transfer attempts",
            "Blocked closure: {{count}} prior transfer failures, missing confirmation",
        ],
        MultiPiiSequenceExport => &[
            "SSN export blocked after {{count}} sequential PII lookups",
            "Pattern: {{count}} customer data queries followed by SSN export attempt",
            "Bulk PII export with include_ssn=true after {{count}} customer queries",
            "Blocked: SSN data export following {{count}} customer reconnaissance calls",
        ],
        MultiReconPrivilegeEscalation => &[
            "Credit increase to ${{amount_fmt}} blocked after {{count}} account lookups, no supervisor approval",
            "Pattern: reconnaissance on {{count}} accounts then ${{amount_fmt}} limit escalation",
            "Blocked: ${{amount_fmt}} credit increase following suspicious balance enumeration",
            "Privilege escalation attempt: ${{amount_fmt}} credit after {{count}} account scans",
        ],
        MultiBenignPatterns => &[
            "Normal pattern: balance check then ${{amount}} transfer, all within limits",
            "Benign sequence: account inquiry followed by ${{amount}} internal transfer",
            "Standard usage: ${{amount}} transfer after reviewing balance/transactions",
            "Legitimate flow: checking balances then ${{amount}} transfer between own accounts",
        ],
    }
}

fn engine() -> &'static Handlebars<'static> {
    static ENGINE: OnceLock<Handlebars<'static>> = OnceLock::new();
    ENGINE.get_or_init(|| {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        // Plain text output, commands and accounts are kept verbatim
        handlebars.register_escape_fn(no_escape);
        handlebars
    })
}

/// Render one template against `vars`
pub fn fill(template: &str, vars: &ReasoningVars) -> Result<String, RenderError> {
    engine().render_template(template, &vars.to_value())
}

/// Pick one template of the category and render it
pub fn render_reasoning(
    category: ScenarioCategory,
    vars: &ReasoningVars,
    rng: &mut RngManager,
) -> Result<String, RenderError> {
    match rng.choose(templates(category)) {
        Some(template) => fill(template, vars),
        None => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_vars() -> ReasoningVars {
        ReasoningVars::new()
            .amount("amount", "amount_fmt", 120_000)
            .set("account", "EXT-PAYROLL-001")
            .set("ticket", "TKT-123456")
            .set("term", 36)
            .set("quantity", 500)
            .set("symbol", "AAPL")
            .set("command_excerpt", "chmod 755 /var/log")
            .set("timestamp", "2024-01-15T08:59:59Z")
            .set("count", 4)
    }

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(10_000), "10,000");
        assert_eq!(thousands(1_234_567), "1,234,567");
        assert_eq!(thousands(-45_000), "-45,000");
    }

    #[test]
    fn test_fill_placeholders() {
        assert_eq!(
            fill("${{amount_fmt}} to {{account}}: ok ({{amount}})", &all_vars()).unwrap(),
            "$120,000 to EXT-PAYROLL-001: ok (120000)"
        );
    }

    #[test]
    fn test_unknown_placeholder_is_an_error() {
        assert!(fill("keep {{acount}}", &all_vars()).is_err());
        assert!(fill("{{amount}}", &ReasoningVars::new()).is_err());
    }

    #[test]
    fn test_values_are_not_html_escaped() {
        let vars = ReasoningVars::new().set("command_excerpt", "a && b > 'c'");
        assert_eq!(fill("{{command_excerpt}}", &vars).unwrap(), "a && b > 'c'");
    }

    #[test]
    fn test_every_template_renders() {
        for category in ScenarioCategory::ALL {
            for template in templates(category) {
                let text = fill(template, &all_vars())
                    .unwrap_or_else(|e| panic!("{:?}: {}", category, e));
                assert!(!text.contains("{{"), "{:?}: {}", category, text);
            }
        }
    }

    #[test]
    fn test_near_miss_excerpt_is_elided() {
        let text = fill(templates(ScenarioCategory::EdgeNearMissRegex)[0], &all_vars()).unwrap();
        assert_eq!(
            text,
            "Command 'chmod 755 /var/log...' doesn't match dangerous patterns exactly"
        );
    }

    #[test]
    fn test_every_category_has_several_templates() {
        for category in ScenarioCategory::ALL {
            assert!(templates(category).len() >= 4, "{:?}", category);
        }
    }
}
