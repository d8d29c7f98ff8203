//! Core routines for building the weekly least-cost dispatch optimisation problem.
//!
//! For each simulated week and Monte-Carlo scenario, this crate sizes and allocates the sparse
//! LP buffer representing the dispatch problem across interconnected areas, grows its constraint
//! matrix as terms are appended, populates the per-step linear cost coefficients and hands the
//! finished problem to the LP solver. Scenario orchestration, topology loading and result
//! reporting live outside this crate.
#![warn(missing_docs)]
pub mod area;
pub mod correspondence;
pub mod costs;
pub mod interconnection;
pub mod log;
pub mod problem;
pub mod solver;
pub mod week;

#[cfg(test)]
mod fixture;
