#![doc = include_str!("../README.md")]

//! SMT term language and solver integration for frame-based model checking.
//!
//! Terms are plain values, solvers are reached through the [`solver::SmtSolver`]
//! trait, and every query runs inside a [`session::ProverSession`] so that
//! assertion scopes never leak between queries.

pub mod backends;
pub mod session;
pub mod solver;
pub mod sorts;
pub mod terms;
