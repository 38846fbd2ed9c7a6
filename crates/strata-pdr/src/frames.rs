//! Delta-encoded PDR frames.
//!
//! Frame `0` holds the initial condition. Every other frame stores only the
//! clauses whose highest known level is that frame, so the clauses that hold
//! at level `i >= 1` are the union of the frames `i..=frontier`.

use std::fmt;
use std::io;
use std::time::Instant;

use indexmap::IndexSet;
use strata_smt::backends::smtlib_printer::to_smtlib_script;
use strata_smt::session::{is_unsat, ProverSession};
use strata_smt::solver::SmtSolver;
use strata_smt::terms::SmtTerm;
use tracing::{debug, info};

use crate::cancel::CancellationToken;
use crate::error::FrameSetError;
use crate::options::FrameSetOptions;
use crate::stats::{FrameSetStatistics, StatisticsReport};
use crate::transition::TransitionSystem;

pub type Frame = IndexSet<SmtTerm>;

/// How a level argument is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameLevel {
    /// Level 0: the initial states only.
    Initial,
    /// Level `i >= 1`: the union of the stored frames `i..=frontier`.
    Delta(usize),
}

impl FrameLevel {
    pub fn of(level: usize) -> Self {
        if level == 0 {
            FrameLevel::Initial
        } else {
            FrameLevel::Delta(level)
        }
    }
}

/// The frame operations a PDR main loop is written against.
pub trait FrameSet {
    /// Append a frame seeded with the safety property.
    fn open_next_frame(&mut self);

    fn frontier_level(&self) -> usize;

    /// Clauses that hold at `level`.
    fn get_states(&self, level: usize) -> Result<Frame, FrameSetError>;

    /// Record that `states` are unreachable within `max_level` steps.
    fn block_states(&mut self, states: &SmtTerm, max_level: usize) -> Result<(), FrameSetError>;

    /// Push relatively inductive clauses forward. Returns `true` once some
    /// frame became empty, i.e. two adjacent levels agree.
    fn propagate(&mut self, cancel: &CancellationToken) -> Result<bool, FrameSetError>;
}

pub struct DeltaEncodedFrameSet<'a, S: SmtSolver, T: TransitionSystem> {
    solver: &'a mut S,
    system: &'a T,
    options: FrameSetOptions,
    frames: Vec<Frame>,
    stats: FrameSetStatistics,
}

fn union_of(frames: &[Frame]) -> Frame {
    frames.iter().flatten().cloned().collect()
}

impl<'a, S: SmtSolver, T: TransitionSystem> DeltaEncodedFrameSet<'a, S, T> {
    pub fn new(solver: &'a mut S, system: &'a T, options: FrameSetOptions) -> Self {
        let mut frames = Vec::with_capacity(options.initial_capacity.max(1));
        let mut initial = Frame::new();
        initial.insert(system.as_unprimed(system.initial_condition()));
        frames.push(initial);
        Self {
            solver,
            system,
            options,
            frames,
            stats: FrameSetStatistics {
                frames: 1,
                ..FrameSetStatistics::default()
            },
        }
    }

    pub fn options(&self) -> &FrameSetOptions {
        &self.options
    }

    pub fn statistics(&self) -> &FrameSetStatistics {
        &self.stats
    }

    /// The clauses stored at exactly `level`, without the higher frames.
    pub fn stored_clauses(&self, level: usize) -> Result<&Frame, FrameSetError> {
        self.check_level(level)?;
        self.frames
            .get(level)
            .ok_or(FrameSetError::LevelOutOfRange {
                level,
                frontier: self.frontier(),
            })
    }

    /// SMT-LIB script of the query that decides whether `clause` can move
    /// from `level` to `level + 1`. UNSAT means it can.
    pub fn relative_induction_script(
        &self,
        level: usize,
        clause: &SmtTerm,
    ) -> Result<String, FrameSetError> {
        let states = self.get_states(level)?;
        let mut assertions = Vec::with_capacity(states.len() + 2);
        assertions.push(self.system.transition_relation().clone());
        assertions.extend(states);
        assertions.push(self.system.as_primed(&clause.negate()));
        Ok(to_smtlib_script(self.system.declarations(), &assertions))
    }

    fn frontier(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    fn check_level(&self, level: usize) -> Result<(), FrameSetError> {
        let frontier = self.frontier();
        if level > frontier {
            return Err(FrameSetError::LevelOutOfRange { level, frontier });
        }
        Ok(())
    }

    fn states_at(&self, level: FrameLevel) -> Frame {
        match level {
            FrameLevel::Initial => self.frames.first().cloned().unwrap_or_default(),
            FrameLevel::Delta(level) => union_of(self.frames.get(level..).unwrap_or_default()),
        }
    }

    fn sync_clause_count(&mut self) {
        let stored: usize = self.frames.iter().skip(1).map(Frame::len).sum();
        self.stats.clauses = stored as u64;
    }

    fn propagate_levels(&mut self, cancel: &CancellationToken) -> Result<bool, FrameSetError> {
        for level in 1..self.frontier() {
            self.stats.levels_propagated = self.stats.levels_propagated.saturating_add(1);
            self.push_inductive_clauses(level, cancel)?;

            if self.options.subsumption {
                let started = Instant::now();
                let result = self.remove_subsumed_clauses(level, cancel);
                self.stats.subsumption.record(started.elapsed());
                result?;
            }

            if self.frames[level].is_empty() {
                info!(level, "pdr: fixpoint reached");
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Move every clause `c` of frame `level` with
    /// `UNSAT[T & F_level & not(c)']` to frame `level + 1`.
    fn push_inductive_clauses(
        &mut self,
        level: usize,
        cancel: &CancellationToken,
    ) -> Result<(), FrameSetError> {
        let system = self.system;
        let effective = union_of(&self.frames[level..]);
        let candidates: Vec<SmtTerm> = self.frames[level].iter().cloned().collect();

        let mut session = ProverSession::open(&mut *self.solver, system.declarations())?;
        session.push_all(std::iter::once(system.transition_relation()).chain(effective.iter()))?;

        for clause in candidates {
            let query = system.as_primed(&clause.negate());
            let started = Instant::now();
            let verdict = session.is_unsat_with(&query);
            self.stats.propagation_solver.record(started.elapsed());
            if verdict? {
                debug!(level, clause = %clause, "pdr: clause propagated");
                self.frames[level].shift_remove(&clause);
                self.frames[level + 1].insert(clause);
                self.stats.propagated_clauses = self.stats.propagated_clauses.saturating_add(1);
            }
            cancel.check()?;
        }

        session.close()?;
        Ok(())
    }

    /// Drop every clause of frame `level` implied by a clause that holds at
    /// `level + 1`.
    fn remove_subsumed_clauses(
        &mut self,
        level: usize,
        cancel: &CancellationToken,
    ) -> Result<(), FrameSetError> {
        let system = self.system;
        let declarations = system.declarations();
        let stronger = union_of(&self.frames[level + 1..]);

        for c1 in &stronger {
            let candidates: Vec<SmtTerm> = self.frames[level].iter().cloned().collect();
            for c2 in candidates {
                let query = c1.clone().implies(c2.clone()).not();
                if is_unsat(&mut *self.solver, declarations, &query)? {
                    debug!(level, clause = %c2, by = %c1, "pdr: clause subsumed");
                    self.frames[level].shift_remove(&c2);
                    self.stats.subsumed_clauses = self.stats.subsumed_clauses.saturating_add(1);
                }
                cancel.check()?;
            }
        }
        Ok(())
    }
}

impl<S: SmtSolver, T: TransitionSystem> FrameSet for DeltaEncodedFrameSet<'_, S, T> {
    fn open_next_frame(&mut self) {
        let mut frame = Frame::new();
        frame.insert(self.system.as_unprimed(self.system.safety_property()));
        self.frames.push(frame);
        self.stats.frames = self.stats.frames.saturating_add(1);
        self.stats.clauses_added = self.stats.clauses_added.saturating_add(1);
        self.sync_clause_count();
        debug!(frontier = self.frontier(), "pdr: opened frame");
    }

    fn frontier_level(&self) -> usize {
        self.frontier()
    }

    fn get_states(&self, level: usize) -> Result<Frame, FrameSetError> {
        self.check_level(level)?;
        Ok(self.states_at(FrameLevel::of(level)))
    }

    fn block_states(&mut self, states: &SmtTerm, max_level: usize) -> Result<(), FrameSetError> {
        self.check_level(max_level)?;
        let FrameLevel::Delta(level) = FrameLevel::of(max_level) else {
            return Err(FrameSetError::InitialFrameImmutable);
        };
        let clause = states.negate();
        debug!(level, clause = %clause, "pdr: blocking states");
        if self.frames[level].insert(clause) {
            self.stats.clauses_added = self.stats.clauses_added.saturating_add(1);
            self.sync_clause_count();
        }
        Ok(())
    }

    fn propagate(&mut self, cancel: &CancellationToken) -> Result<bool, FrameSetError> {
        cancel.check()?;
        info!(frontier = self.frontier(), "pdr: propagating clauses");
        let started = Instant::now();
        let result = self.propagate_levels(cancel);
        self.stats.propagation.record(started.elapsed());
        self.sync_clause_count();
        result
    }
}

impl<S: SmtSolver, T: TransitionSystem> StatisticsReport for DeltaEncodedFrameSet<'_, S, T> {
    fn name(&self) -> &str {
        self.stats.name()
    }

    fn print_statistics(&self, out: &mut dyn io::Write) -> io::Result<()> {
        self.stats.print_statistics(out)
    }
}

impl<S: SmtSolver, T: TransitionSystem> fmt::Display for DeltaEncodedFrameSet<'_, S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame set : ")?;
        for level in 0..self.frames.len() {
            write!(f, "\n  Level {level}\n :")?;
            for clause in self.states_at(FrameLevel::of(level)) {
                writeln!(f, "     {clause}")?;
            }
        }
        Ok(())
    }
}
