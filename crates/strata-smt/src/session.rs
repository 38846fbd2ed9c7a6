//! Scoped prover sessions.
//!
//! A [`ProverSession`] owns a mutable borrow of a solver for its lifetime and
//! pushes one base scope when it opens. Every scope pushed through the
//! session, including the base scope, is popped again when the session is
//! closed or dropped, so an early return (an error, a cancellation) never
//! leaves stale assertions behind for the next query.

use thiserror::Error;
use tracing::warn;

use crate::solver::{SatResult, SmtSolver};
use crate::sorts::SmtSort;
use crate::terms::SmtTerm;

#[derive(Debug, Error)]
pub enum SessionError<E: std::error::Error + 'static> {
    #[error("solver backend error: {0}")]
    Backend(#[from] E),
    #[error("solver could not decide the query: {0}")]
    Unknown(String),
    #[error("no scope left to pop in this session")]
    EmptyScope,
}

pub struct ProverSession<'s, S: SmtSolver> {
    solver: &'s mut S,
    /// Scopes currently open on the solver on behalf of this session,
    /// the base scope included.
    open_scopes: usize,
}

impl<'s, S: SmtSolver> ProverSession<'s, S> {
    /// Open a session: push a base scope and declare `declarations` in it.
    pub fn open(
        solver: &'s mut S,
        declarations: &[(String, SmtSort)],
    ) -> Result<Self, SessionError<S::Error>> {
        solver.push()?;
        let mut session = Self {
            solver,
            open_scopes: 1,
        };
        for (name, sort) in declarations {
            session.solver.declare_var(name, sort)?;
        }
        Ok(session)
    }

    /// Push a scope holding `term`.
    pub fn push(&mut self, term: &SmtTerm) -> Result<(), SessionError<S::Error>> {
        self.push_all(std::iter::once(term))
    }

    /// Push a single scope holding every term of `terms`.
    pub fn push_all<'t, I>(&mut self, terms: I) -> Result<(), SessionError<S::Error>>
    where
        I: IntoIterator<Item = &'t SmtTerm>,
    {
        self.solver.push()?;
        self.open_scopes += 1;
        for term in terms {
            self.solver.assert(term)?;
        }
        Ok(())
    }

    /// Pop the most recently pushed scope. The base scope cannot be popped.
    pub fn pop(&mut self) -> Result<(), SessionError<S::Error>> {
        if self.open_scopes <= 1 {
            return Err(SessionError::EmptyScope);
        }
        self.open_scopes -= 1;
        self.solver.pop()?;
        Ok(())
    }

    /// Number of scopes pushed on top of the base scope.
    pub fn depth(&self) -> usize {
        self.open_scopes.saturating_sub(1)
    }

    pub fn check_sat(&mut self) -> Result<SatResult, SessionError<S::Error>> {
        Ok(self.solver.check_sat()?)
    }

    /// `Ok(true)` on UNSAT, `Ok(false)` on SAT. An undecided query is an
    /// error: callers must not treat it as either answer.
    pub fn is_unsat(&mut self) -> Result<bool, SessionError<S::Error>> {
        match self.check_sat()? {
            SatResult::Unsat => Ok(true),
            SatResult::Sat => Ok(false),
            SatResult::Unknown(reason) => Err(SessionError::Unknown(reason)),
        }
    }

    /// Check whether the current assertions together with `term` are UNSAT.
    /// `term` lives in its own scope that is popped before returning.
    pub fn is_unsat_with(&mut self, term: &SmtTerm) -> Result<bool, SessionError<S::Error>> {
        self.push(term)?;
        let result = self.is_unsat();
        let pop_result = self.pop();
        match (result, pop_result) {
            (Ok(value), Ok(())) => Ok(value),
            (Err(err), Ok(())) => Err(err),
            (Ok(_), Err(pop_err)) => Err(pop_err),
            (Err(err), Err(_)) => Err(err),
        }
    }

    /// Pop every scope of the session and report the first failure.
    pub fn close(mut self) -> Result<(), SessionError<S::Error>> {
        self.release()
    }

    fn release(&mut self) -> Result<(), SessionError<S::Error>> {
        while self.open_scopes > 0 {
            self.open_scopes -= 1;
            self.solver.pop()?;
        }
        Ok(())
    }
}

impl<S: SmtSolver> Drop for ProverSession<'_, S> {
    fn drop(&mut self) {
        if self.open_scopes == 0 {
            return;
        }
        if let Err(err) = self.release() {
            warn!(error = %err, "smt session: failed to release solver scopes");
        }
    }
}

/// One-shot UNSAT check of `term` in a fresh session.
pub fn is_unsat<S: SmtSolver>(
    solver: &mut S,
    declarations: &[(String, SmtSort)],
    term: &SmtTerm,
) -> Result<bool, SessionError<S::Error>> {
    let mut session = ProverSession::open(solver, declarations)?;
    let result = session.is_unsat_with(term)?;
    session.close()?;
    Ok(result)
}
