//! Read-only value pools shared by every scenario generator
//!
//! Pools are plain configuration data: constructed once, validated, then
//! borrowed immutably for the whole corpus build.

use crate::rng::RngManager;
use crate::scenarios::ScenarioError;
use serde::{Deserialize, Serialize};

/// Sampling pools for the finance domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuePools {
    /// Accounts belonging to the session's user
    pub authorized_accounts: Vec<String>,

    /// External counterparties explicitly allowed
    pub whitelisted_external: Vec<String>,

    pub currencies: Vec<String>,

    pub report_formats: Vec<String>,

    pub memos: Vec<String>,

    pub ticket_prefixes: Vec<String>,

    /// Customer ids are `CUST-nnnnn` for n in [start, end)
    pub customer_id_range: (u32, u32),

    pub symbols: Vec<String>,

    pub loan_types: Vec<String>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl ValuePools {
    /// Default finance pools
    pub fn finance() -> Self {
        Self {
            authorized_accounts: owned(&["ACC-SELF-001", "ACC-SELF-002", "ACC-JOINT-001"]),
            whitelisted_external: owned(&["EXT-PAYROLL-001", "EXT-VENDOR-002", "EXT-PARTNER-003"]),
            currencies: owned(&["USD", "EUR", "GBP", "CAD", "AUD", "CHF", "JPY"]),
            report_formats: owned(&["pdf", "csv", "xlsx"]),
            memos: owned(&[
                "Monthly savings transfer",
                "Rent payment",
                "Utility bill",
                "Investment deposit",
                "Emergency fund",
                "Vacation savings",
                "Car payment",
                "Insurance premium",
                "Child education fund",
                "Medical expenses",
                "Home repair fund",
                "Business expense",
                "Charity donation",
                "Gift transfer",
                "Loan repayment",
                "Tax payment",
            ]),
            ticket_prefixes: owned(&["TKT", "INC", "SR", "REQ", "CASE", "SUP"]),
            customer_id_range: (10_000, 99_999),
            symbols: owned(&[
                "AAPL", "GOOGL", "MSFT", "AMZN", "META", "NVDA", "TSLA", "BRK.A", "JPM", "V",
                "MA", "HD", "DIS", "NFLX", "PYPL",
            ]),
            loan_types: owned(&[
                "personal",
                "auto",
                "home_improvement",
                "debt_consolidation",
                "business",
                "student",
            ]),
        }
    }

    /// Names of pools that cannot be sampled from
    ///
    /// The authorized account pool needs at least two entries: internal
    /// transfers pick distinct source and destination accounts.
    pub fn empty_pools(&self) -> Vec<&'static str> {
        let mut empty = Vec::new();
        let lists: [(&'static str, &Vec<String>); 8] = [
            ("authorized_accounts", &self.authorized_accounts),
            ("whitelisted_external", &self.whitelisted_external),
            ("currencies", &self.currencies),
            ("report_formats", &self.report_formats),
            ("memos", &self.memos),
            ("ticket_prefixes", &self.ticket_prefixes),
            ("symbols", &self.symbols),
            ("loan_types", &self.loan_types),
        ];
        for (name, list) in lists {
            if list.is_empty() {
                empty.push(name);
            }
        }
        if self.authorized_accounts.len() == 1 {
            empty.push("authorized_accounts");
        }
        if self.customer_id_range.0 >= self.customer_id_range.1 {
            empty.push("customer_id_range");
        }
        empty
    }

    /// Fails on the first pool that cannot be sampled from
    pub fn validate(&self) -> Result<(), ScenarioError> {
        match self.empty_pools().first() {
            Some(name) => Err(ScenarioError::EmptyPool(*name)),
            None => Ok(()),
        }
    }

    /// Number of distinct customer ids
    pub fn customer_id_count(&self) -> usize {
        self.customer_id_range.1.saturating_sub(self.customer_id_range.0) as usize
    }

    /// Draw one customer id
    pub fn customer_id(&self, rng: &mut RngManager) -> Result<String, ScenarioError> {
        let (start, end) = self.customer_id_range;
        if start >= end {
            return Err(ScenarioError::EmptyPool("customer_id_range"));
        }
        Ok(format!("CUST-{:05}", rng.range(i64::from(start), i64::from(end))))
    }

    /// Draw `k` distinct customer ids, in draw order
    pub fn distinct_customer_ids(
        &self,
        rng: &mut RngManager,
        k: usize,
    ) -> Result<Vec<String>, ScenarioError> {
        let available = self.customer_id_count();
        if available < k {
            return Err(ScenarioError::PoolTooSmall {
                pool: "customer_id_range",
                available,
                required: k,
            });
        }

        let mut picked: Vec<String> = Vec::with_capacity(k);
        while picked.len() < k {
            let id = self.customer_id(rng)?;
            if !picked.contains(&id) {
                picked.push(id);
            }
        }
        Ok(picked)
    }
}

impl Default for ValuePools {
    fn default() -> Self {
        Self::finance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finance_pools_complete() {
        assert!(ValuePools::finance().empty_pools().is_empty());
    }

    #[test]
    fn test_reports_empty_pools() {
        let mut pools = ValuePools::finance();
        pools.memos.clear();
        pools.customer_id_range = (5, 5);
        assert_eq!(pools.empty_pools(), vec!["memos", "customer_id_range"]);
        assert_eq!(pools.validate(), Err(ScenarioError::EmptyPool("memos")));
    }

    #[test]
    fn test_distinct_customer_ids() {
        let pools = ValuePools::finance();
        let mut rng = RngManager::new(3);
        let ids = pools.distinct_customer_ids(&mut rng, 5).unwrap();
        assert_eq!(ids.len(), 5);
        for id in &ids {
            assert!(id.starts_with("CUST-") && id.len() == 10, "bad id {}", id);
        }
        let mut deduped = ids.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), 5);
    }

    #[test]
    fn test_inverted_customer_range_is_an_error() {
        let mut pools = ValuePools::finance();
        pools.customer_id_range = (500, 100);
        let mut rng = RngManager::new(3);
        assert_eq!(
            pools.customer_id(&mut rng),
            Err(ScenarioError::EmptyPool("customer_id_range"))
        );
    }

    #[test]
    fn test_too_few_customer_ids() {
        let mut pools = ValuePools::finance();
        pools.customer_id_range = (100, 103);
        let mut rng = RngManager::new(3);
        assert_eq!(
            pools.distinct_customer_ids(&mut rng, 5),
            Err(ScenarioError::PoolTooSmall {
                pool: "customer_id_range",
                available: 3,
                required: 5
            })
        );
        assert_eq!(pools.distinct_customer_ids(&mut rng, 3).unwrap().len(), 3);
    }
}
