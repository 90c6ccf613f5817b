//! Guardrail Corpus Core - Rust Engine
//!
//! Deterministic generator of labeled training data for a tool-call guardrail
//! classifier.
//!
//! # Architecture
//!
//! - **policy**: Rule schema and the evaluator every label is checked against
//! - **pools**: Shared sampling pools (accounts, currencies, memos, ...)
//! - **scenarios**: Per-category scenario generators
//! - **weights**: Confidence bands and reasoning templates
//! - **format**: Three-turn conversation rendering
//! - **corpus**: Configuration, assembly and JSONL writing
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. Every emitted decision equals the interpreter's verdict on its ruleset
//! 2. All randomness is deterministic (one seeded RNG per build)
//! 3. `pass_weight + block_weight = 1.00` and the larger weight matches the decision

// Module declarations
pub mod corpus;
pub mod format;
pub mod models;
pub mod policy;
pub mod pools;
pub mod rng;
pub mod scenarios;
pub mod weights;

// Re-exports for convenience
pub use corpus::{
    AssembledCorpus, ConfigError, CorpusAssembler, CorpusConfig, CorpusError, CorpusReport,
    CorpusStats, CorpusWriter, JsonlFileWriter, MemoryWriter, WrittenCorpus,
};
pub use format::format_example;
pub use models::{Decision, DecisionKind, Example};
pub use policy::{evaluate, evaluate_ruleset, CallHistoryEntry, Condition, Rule, ToolCall};
pub use pools::ValuePools;
pub use rng::RngManager;
pub use scenarios::{CorpusKind, Scenario, ScenarioCategory, ScenarioError};

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn guardrail_corpus_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(ffi::corpus::generate_corpora, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::corpus::config_hash, m)?)?;
    Ok(())
}
