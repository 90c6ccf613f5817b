// Corpus configuration
//
// A seed plus one ordered plan per output corpus. The default reproduces the
// finance corpora: normal-pass 8 x 200, edge-cases 8 x 100, multi-step 5 x 160.

use crate::pools::ValuePools;
use crate::scenarios::{CorpusKind, ScenarioCategory};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use thiserror::Error;

pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid config JSON: {0}")]
    Parse(String),

    #[error("Corpus {0:?} has no categories or a zero target size")]
    EmptyPlan(CorpusKind),

    #[error("Corpus {0:?} is planned twice")]
    DuplicateCorpus(CorpusKind),

    #[error("Corpus {corpus:?}: category counts sum to {sum}, target is {target}")]
    SizeMismatch {
        corpus: CorpusKind,
        target: usize,
        sum: usize,
    },

    #[error("Category {category:?} belongs to {expected:?}, planned under {planned:?}")]
    WrongCorpus {
        category: ScenarioCategory,
        expected: CorpusKind,
        planned: CorpusKind,
    },

    #[error("Category {0:?} is planned twice")]
    DuplicateCategory(ScenarioCategory),

    #[error("Value pool '{0}' is empty")]
    EmptyPool(&'static str),

    #[error("Config serialization failed: {0}")]
    Serialization(String),
}

/// Examples requested for one category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: ScenarioCategory,
    pub count: usize,
}

/// Ordered composition of one output corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusPlan {
    pub corpus: CorpusKind,
    pub target_size: usize,
    pub categories: Vec<CategoryCount>,
}

impl CorpusPlan {
    /// Every category of `corpus` at its default count
    pub fn default_for(corpus: CorpusKind) -> Self {
        let per_category = corpus.default_count_per_category();
        let categories: Vec<CategoryCount> = corpus
            .categories()
            .into_iter()
            .map(|category| CategoryCount {
                category,
                count: per_category,
            })
            .collect();
        Self {
            corpus,
            target_size: categories.len() * per_category,
            categories,
        }
    }

    pub fn planned_size(&self) -> usize {
        self.categories.iter().map(|c| c.count).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusConfig {
    pub seed: u64,

    pub plans: Vec<CorpusPlan>,

    #[serde(default)]
    pub pools: ValuePools,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            plans: CorpusKind::ALL.iter().map(|c| CorpusPlan::default_for(*c)).collect(),
            pools: ValuePools::finance(),
        }
    }
}

impl CorpusConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Config from optional JSON (default plan otherwise), with the seed
    /// replaced only when an override is given
    pub fn resolve(config_json: Option<&str>, seed: Option<u64>) -> Result<Self, ConfigError> {
        let config = match config_json {
            Some(json) => Self::from_json(json)?,
            None => Self::default(),
        };
        Ok(match seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        })
    }

    /// Check every plan and the pools; nothing is generated from an invalid
    /// configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = self.pools.empty_pools().first() {
            return Err(ConfigError::EmptyPool(*name));
        }

        let mut corpora = HashSet::new();
        for plan in &self.plans {
            if !corpora.insert(plan.corpus) {
                return Err(ConfigError::DuplicateCorpus(plan.corpus));
            }
            if plan.categories.is_empty() || plan.target_size == 0 {
                return Err(ConfigError::EmptyPlan(plan.corpus));
            }

            let mut seen = HashSet::new();
            for entry in &plan.categories {
                if entry.category.corpus() != plan.corpus {
                    return Err(ConfigError::WrongCorpus {
                        category: entry.category,
                        expected: entry.category.corpus(),
                        planned: plan.corpus,
                    });
                }
                if !seen.insert(entry.category) {
                    return Err(ConfigError::DuplicateCategory(entry.category));
                }
            }

            let sum = plan.planned_size();
            if sum != plan.target_size {
                return Err(ConfigError::SizeMismatch {
                    corpus: plan.corpus,
                    target: plan.target_size,
                    sum,
                });
            }
        }
        Ok(())
    }

    /// SHA-256 of the canonical (sorted-key) JSON form
    ///
    /// Two configs with the same hash produce byte-identical corpora.
    pub fn config_hash(&self) -> Result<String, ConfigError> {
        use serde_json::Value;
        use std::collections::BTreeMap;

        let value =
            serde_json::to_value(self).map_err(|e| ConfigError::Serialization(e.to_string()))?;

        fn canonicalize(value: Value) -> Value {
            match value {
                Value::Object(map) => {
                    let sorted: BTreeMap<String, Value> =
                        map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                    Value::Object(sorted.into_iter().collect())
                }
                Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
                other => other,
            }
        }

        let json = serde_json::to_string(&canonicalize(value))
            .map_err(|e| ConfigError::Serialization(e.to_string()))?;

        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CorpusConfig::default();
        assert_eq!(config.seed, 42);
        assert!(config.validate().is_ok());
        let sizes: Vec<usize> = config.plans.iter().map(|p| p.target_size).collect();
        assert_eq!(sizes, vec![1600, 800, 800]);
    }

    #[test]
    fn test_size_mismatch() {
        let mut config = CorpusConfig::default();
        config.plans[1].target_size = 801;
        assert_eq!(
            config.validate(),
            Err(ConfigError::SizeMismatch {
                corpus: CorpusKind::EdgeCases,
                target: 801,
                sum: 800
            })
        );
    }

    #[test]
    fn test_category_in_wrong_corpus() {
        let mut config = CorpusConfig::default();
        config.plans[0].categories[0].category = ScenarioCategory::EdgeExactLimit;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WrongCorpus { planned: CorpusKind::NormalPass, .. })
        ));
    }

    #[test]
    fn test_duplicate_category() {
        let mut config = CorpusConfig::default();
        let first = config.plans[2].categories[0];
        config.plans[2].categories[1] = first;
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateCategory(first.category))
        );
    }

    #[test]
    fn test_empty_pool_rejected() {
        let mut config = CorpusConfig::default();
        config.pools.whitelisted_external.clear();
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyPool("whitelisted_external"))
        );
    }

    #[test]
    fn test_json_round_trip_and_hash() {
        let config = CorpusConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed = CorpusConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(parsed.config_hash().unwrap(), config.config_hash().unwrap());
        assert_ne!(
            config.clone().with_seed(7).config_hash().unwrap(),
            config.config_hash().unwrap()
        );
    }

    #[test]
    fn test_resolve_keeps_config_seed_without_override() {
        let json = serde_json::to_string(&CorpusConfig::default().with_seed(7)).unwrap();

        assert_eq!(CorpusConfig::resolve(Some(&json), None).unwrap().seed, 7);
        assert_eq!(CorpusConfig::resolve(Some(&json), Some(9)).unwrap().seed, 9);
        assert_eq!(CorpusConfig::resolve(None, None).unwrap().seed, 42);
        assert_eq!(CorpusConfig::resolve(None, Some(3)).unwrap(), CorpusConfig::default().with_seed(3));
        assert!(matches!(
            CorpusConfig::resolve(Some("not json"), Some(1)),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_pools_default_when_omitted() {
        let json = r#"{
            "seed": 7,
            "plans": [{
                "corpus": "multi_step",
                "target_size": 3,
                "categories": [{"category": "multi_benign_patterns", "count": 3}]
            }]
        }"#;
        let config = CorpusConfig::from_json(json).unwrap();
        assert_eq!(config.pools, ValuePools::finance());
        assert!(config.validate().is_ok());
    }
}
