//! MOSA archive
//!
//! Keeps the smallest known covering test per goal together with the
//! covered / uncovered / current goal partitions of one search run.
//!
//! # Example
//!
//! ```rust,ignore
//! use mosa_archive::{Archive, CoverageUpdate};
//!
//! let mut archive = Archive::new(goals, roots)?;
//! if archive.record_coverage(&goal, &test)? == CoverageUpdate::Installed {
//!     println!("{goal} covered for the first time");
//! }
//! ```

#![warn(missing_docs)]

pub mod archive;
pub mod candidate;
pub mod error;

// Re-exports
pub use archive::{Archive, ArchiveSummary, CoverageUpdate};
pub use candidate::{TestCandidate, TestId};
pub use error::ArchiveError;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
