//! rankfuse - rank fusion and query expansion for TREC-style runs.
//!
//! Loads ranked lists and topics, fuses runs from several retrieval systems
//! and rewrites queries from pseudo-relevant feedback documents.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod expansion;
pub mod fusion;
pub mod pipeline;
pub mod run;
pub mod topics;

#[doc(hidden)]
pub mod test_utils;

pub use error::{RankfuseError, Result};
