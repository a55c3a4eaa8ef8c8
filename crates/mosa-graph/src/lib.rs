//! MOSA dependency graph
//!
//! Derives the structural dependency graph between branch-spine goals from
//! read-only control-flow facts, together with the root set and the id ->
//! goal indexes used for trace-driven coverage.
//!
//! # Example
//!
//! ```rust,ignore
//! use mosa_graph::DependencyGraphBuilder;
//!
//! let graph = DependencyGraphBuilder::new(&facts).build(&goals);
//! for root in graph.roots() {
//!     println!("initial objective: {root}");
//! }
//! ```

#![warn(missing_docs)]

pub mod graph;
pub mod index;

// Re-exports
pub use graph::{DependencyGraph, DependencyGraphBuilder, GraphStats};
pub use index::GoalIndex;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
