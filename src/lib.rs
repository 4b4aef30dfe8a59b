//! Goal Planner
//!
//! An inflation-aware goal planning and portfolio allocation engine.
//!
//! ## Architecture
//!
//! ```text
//! Goal Projector → Constraint Policy → Mean-Variance Solver → Contribution Calculator
//!                                            ↓ (failure)
//!                                     Fallback Allocator
//! ```
//!
//! The engine is a pure function from (statistics snapshot, request) to
//! (allocation, contribution plan): no persistence, no fetching, no
//! rendering. Statistics are supplied by an external collaborator through
//! [`stats::SnapshotStore`].

pub mod config;
pub mod contribution;
pub mod error;
pub mod inflation;
pub mod planner;
pub mod policy;
pub mod server;
pub mod solver;
pub mod stats;
pub mod types;

#[cfg(test)]
mod integration_tests;
