//! Corpus Assembler
//!
//! Drives every planned category's generator in fixed order from a single
//! seeded RNG, collects the scenarios per corpus, formats them, and hands the
//! records to a `CorpusWriter`.
//!
//! # Determinism
//!
//! The RNG is seeded once per build and threaded through the plans in order
//! (normal-pass, edge-cases, multi-step by default). The same config always
//! yields byte-identical files.
//!
//! # Example
//!
//! ```
//! use guardrail_corpus_core_rs::corpus::{CorpusAssembler, CorpusConfig, MemoryWriter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let assembler = CorpusAssembler::new(CorpusConfig::default())?;
//! let mut writer = MemoryWriter::new();
//! let reports = assembler.run(&mut writer)?;
//! assert_eq!(reports[0].written.records, 1600);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod writer;

pub use config::{CategoryCount, ConfigError, CorpusConfig, CorpusPlan, DEFAULT_SEED};
pub use writer::{jsonl_digest, CorpusWriter, JsonlFileWriter, MemoryWriter, WriterError, WrittenCorpus};

use crate::format::format_example;
use crate::models::DecisionKind;
use crate::policy::evaluate_ruleset;
use crate::rng::RngManager;
use crate::scenarios::{CorpusKind, Scenario, ScenarioCategory, ScenarioError};
use crate::weights::band;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Generation error: {0}")]
    Scenario(#[from] ScenarioError),

    #[error("Formatting error: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Write error: {0}")]
    Writer(#[from] WriterError),

    #[error("{corpus:?}: assembled {actual} records, planned {expected}")]
    Composition {
        corpus: CorpusKind,
        expected: usize,
        actual: usize,
    },

    #[error("{category:?} example {index} violates its label: {reason}")]
    Invariant {
        category: ScenarioCategory,
        index: usize,
        reason: String,
    },
}

// ============================================================================
// ASSEMBLED CORPUS
// ============================================================================

/// Decision counts of one corpus
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CorpusStats {
    pub total: usize,
    pub pass: usize,
    pub block: usize,
    pub per_category: BTreeMap<ScenarioCategory, usize>,
}

impl CorpusStats {
    pub fn from_scenarios(scenarios: &[Scenario]) -> Self {
        let mut stats = CorpusStats::default();
        for scenario in scenarios {
            stats.total += 1;
            match scenario.decision.decision {
                DecisionKind::Pass => stats.pass += 1,
                DecisionKind::Block => stats.block += 1,
            }
            *stats.per_category.entry(scenario.category).or_insert(0) += 1;
        }
        stats
    }
}

/// One generated corpus, in plan order
#[derive(Debug, Clone)]
pub struct AssembledCorpus {
    pub kind: CorpusKind,
    pub scenarios: Vec<Scenario>,
    pub stats: CorpusStats,
}

impl AssembledCorpus {
    pub fn file_name(&self) -> &'static str {
        self.kind.file_name()
    }

    /// JSONL lines, one per scenario
    pub fn records(&self) -> Result<Vec<String>, serde_json::Error> {
        self.scenarios
            .iter()
            .map(|s| format_example(s)?.to_json_line())
            .collect()
    }

    /// Re-check every scenario against its label
    ///
    /// The ruleset must evaluate to the embedded decision, the weights must
    /// sum to 1 (two decimals), agree with the decision, and lie in the
    /// category's band; `matched_rules` is present exactly for blocks.
    pub fn verify(&self) -> Result<(), CorpusError> {
        for (index, scenario) in self.scenarios.iter().enumerate() {
            let violation = |reason: String| CorpusError::Invariant {
                category: scenario.category,
                index,
                reason,
            };
            let decision = &scenario.decision;

            let verdict = evaluate_ruleset(&scenario.rules, &scenario.eval_context())
                .map_err(ScenarioError::from)?;
            if verdict.decision != decision.decision {
                return Err(violation(format!(
                    "ruleset evaluates to {}, label is {}",
                    verdict.decision.as_str(),
                    decision.decision.as_str()
                )));
            }
            if (decision.weight_sum() - 1.0).abs() > 0.01 {
                return Err(violation(format!("weights sum to {}", decision.weight_sum())));
            }
            if !decision.weights_consistent() {
                return Err(violation("weights contradict the decision".to_string()));
            }
            if !band(scenario.category).contains(decision.pass_weight) {
                return Err(violation(format!(
                    "pass_weight {} outside band",
                    decision.pass_weight
                )));
            }
            let expects_matches = decision.decision == DecisionKind::Block;
            if decision.matched_rules.is_some() != expects_matches {
                return Err(violation("matched_rules presence mismatch".to_string()));
            }
        }
        Ok(())
    }
}

/// Outcome of one corpus build and write
#[derive(Debug, Clone)]
pub struct CorpusReport {
    pub kind: CorpusKind,
    pub stats: CorpusStats,
    pub written: WrittenCorpus,
}

// ============================================================================
// ASSEMBLER
// ============================================================================

#[derive(Debug, Clone)]
pub struct CorpusAssembler {
    config: CorpusConfig,
}

impl CorpusAssembler {
    /// Validates the config; an invalid config never reaches generation
    pub fn new(config: CorpusConfig) -> Result<Self, CorpusError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CorpusConfig {
        &self.config
    }

    /// Generate every planned corpus
    pub fn assemble(&self) -> Result<Vec<AssembledCorpus>, CorpusError> {
        let mut rng = RngManager::new(self.config.seed);
        let mut corpora = Vec::with_capacity(self.config.plans.len());

        for plan in &self.config.plans {
            let mut scenarios = Vec::with_capacity(plan.target_size);
            for entry in &plan.categories {
                let batch = entry
                    .category
                    .generate(&mut rng, &self.config.pools, entry.count)?;
                debug!(
                    corpus = ?plan.corpus,
                    category = ?entry.category,
                    count = batch.len(),
                    "category generated"
                );
                scenarios.extend(batch);
            }

            if scenarios.len() != plan.target_size {
                return Err(CorpusError::Composition {
                    corpus: plan.corpus,
                    expected: plan.target_size,
                    actual: scenarios.len(),
                });
            }

            let stats = CorpusStats::from_scenarios(&scenarios);
            info!(
                corpus = ?plan.corpus,
                total = stats.total,
                pass = stats.pass,
                block = stats.block,
                "corpus assembled"
            );
            corpora.push(AssembledCorpus {
                kind: plan.corpus,
                scenarios,
                stats,
            });
        }
        Ok(corpora)
    }

    /// Format and write assembled corpora, in order
    pub fn write_all<W: CorpusWriter + ?Sized>(
        &self,
        corpora: &[AssembledCorpus],
        writer: &mut W,
    ) -> Result<Vec<CorpusReport>, CorpusError> {
        let mut reports = Vec::with_capacity(corpora.len());
        for corpus in corpora {
            let lines = corpus.records()?;
            let written = writer.write_corpus(corpus.file_name(), &lines)?;
            reports.push(CorpusReport {
                kind: corpus.kind,
                stats: corpus.stats.clone(),
                written,
            });
        }
        Ok(reports)
    }

    /// Assemble, verify and write every corpus
    pub fn run<W: CorpusWriter + ?Sized>(
        &self,
        writer: &mut W,
    ) -> Result<Vec<CorpusReport>, CorpusError> {
        let corpora = self.assemble()?;
        for corpus in &corpora {
            corpus.verify()?;
        }
        self.write_all(&corpora, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> CorpusConfig {
        let mut config = CorpusConfig::default();
        for plan in &mut config.plans {
            for entry in &mut plan.categories {
                entry.count = 3;
            }
            plan.target_size = plan.categories.len() * 3;
        }
        config
    }

    #[test]
    fn test_assembles_in_plan_order() {
        let assembler = CorpusAssembler::new(small_config()).unwrap();
        let corpora = assembler.assemble().unwrap();
        let kinds: Vec<CorpusKind> = corpora.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, CorpusKind::ALL.to_vec());
        assert_eq!(corpora[0].scenarios[0].category, ScenarioCategory::PassTransferUnderLimit);
        assert_eq!(corpora[2].stats.block, 12);
        assert_eq!(corpora[2].stats.pass, 3);
        for corpus in &corpora {
            corpus.verify().unwrap();
        }
    }

    #[test]
    fn test_invalid_config_rejected_before_generation() {
        let mut config = small_config();
        config.plans[0].target_size += 1;
        assert!(matches!(
            CorpusAssembler::new(config),
            Err(CorpusError::Config(ConfigError::SizeMismatch { .. }))
        ));
    }

    #[test]
    fn test_verify_catches_tampered_label() {
        let assembler = CorpusAssembler::new(small_config()).unwrap();
        let mut corpora = assembler.assemble().unwrap();
        corpora[2].scenarios[0].decision.decision = DecisionKind::Pass;
        assert!(matches!(
            corpora[2].verify(),
            Err(CorpusError::Invariant { index: 0, .. })
        ));
    }

    #[test]
    fn test_stats_serialize_category_names() {
        let assembler = CorpusAssembler::new(small_config()).unwrap();
        let corpora = assembler.assemble().unwrap();
        let json = serde_json::to_value(&corpora[1].stats).unwrap();
        assert_eq!(json["per_category"]["edge_exact_limit"], 3);
    }
}
