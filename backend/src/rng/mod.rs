//! Deterministic random number generation
//!
//! Uses xorshift64* algorithm for fast, deterministic random number generation.
//! CRITICAL: All randomness in corpus generation MUST go through this module.
//! A single `RngManager` is constructed per corpus build and passed by mutable
//! reference to every scenario generator, in a fixed order.

mod xorshift;

pub use xorshift::RngManager;
