//! PyO3 wrapper for corpus generation

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use crate::corpus::{CorpusAssembler, CorpusConfig, MemoryWriter};

/// Generate every corpus and return `{file_name: [jsonl_line, ...]}`
///
/// `seed` overrides the seed of `config_json` only when given; with neither,
/// the default seed 42 is used.
///
/// # Example (from Python)
///
/// ```python
/// from guardrail_corpus_core_rs import generate_corpora
///
/// corpora = generate_corpora(seed=42)
/// print(len(corpora["finance_multi_step.jsonl"]))  # 800
/// ```
///
/// # Errors
///
/// Raises ValueError if `config_json` does not parse or fails validation,
/// RuntimeError if generation fails.
#[pyfunction]
#[pyo3(signature = (seed=None, config_json=None))]
pub fn generate_corpora<'py>(
    py: Python<'py>,
    seed: Option<u64>,
    config_json: Option<&str>,
) -> PyResult<Bound<'py, PyDict>> {
    let config = CorpusConfig::resolve(config_json, seed)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;

    let assembler =
        CorpusAssembler::new(config).map_err(|e| PyValueError::new_err(e.to_string()))?;

    let mut writer = MemoryWriter::new();
    assembler
        .run(&mut writer)
        .map_err(|e| PyRuntimeError::new_err(format!("Corpus generation failed: {}", e)))?;

    let dict = PyDict::new_bound(py);
    for (file_name, lines) in writer.into_inner() {
        dict.set_item(file_name, PyList::new_bound(py, lines))?;
    }
    Ok(dict)
}

/// SHA-256 fingerprint of the effective configuration
#[pyfunction]
#[pyo3(signature = (seed=None, config_json=None))]
pub fn config_hash(seed: Option<u64>, config_json: Option<&str>) -> PyResult<String> {
    CorpusConfig::resolve(config_json, seed)
        .and_then(|config| config.config_hash())
        .map_err(|e| PyValueError::new_err(e.to_string()))
}
