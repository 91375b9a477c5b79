//! Library side of the news collector: configuration, the per-source query
//! runner, the accumulator, and the CSV merge/clean step. The binary in
//! `main.rs` wires these together for each selected source.

pub mod accumulate;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod merge;
pub mod models;
pub mod pipeline;
pub mod query;
pub mod utils;
