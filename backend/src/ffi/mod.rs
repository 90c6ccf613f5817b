//! Python bindings
//!
//! Built only with the `pyo3` feature. Training pipelines call
//! `generate_corpora` to build the corpora in-process instead of reading the
//! JSONL files back from disk.

pub mod corpus;
