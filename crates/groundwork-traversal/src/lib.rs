//! Groundwork Traversal
//!
//! The per-query log of explicit inspection actions: list sources, describe
//! a table, preview rows, verify a claimed origin. Steps are kept in call
//! order so that "was this source queried at all" has a single answer.

#![warn(missing_docs)]

mod engine;

pub use engine::{OriginVerification, TraversalEngine};
