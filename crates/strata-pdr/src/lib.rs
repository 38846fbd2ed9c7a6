#![doc = include_str!("../README.md")]

//! Delta-encoded frame set for PDR/IC3 safety proofs.
//!
//! The frame set depends on two narrow collaborators: a
//! [`transition::TransitionSystem`] (initial condition, property, transition
//! relation, primed/unprimed renaming) and a [`strata_smt::solver::SmtSolver`].
//! The PDR main loop drives it through the [`frames::FrameSet`] trait.

pub mod cancel;
pub mod error;
pub mod frames;
pub mod options;
pub mod stats;
pub mod transition;
