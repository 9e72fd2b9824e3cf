//! rstree: a generic tree engine.
//!
//! The [`domain`] layer holds the engine: depth-first traversal with
//! per-node metadata injection ([`domain::each`]), a plain walk
//! ([`domain::parse`]) and reconstruction of a root-to-node branch from a
//! known relation chain ([`domain::relation_to_tree`]). The remaining layers
//! load JSON tree documents, read settings and drive the engine from the
//! command line.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
