use strata_smt::session::SessionError;
use thiserror::Error;

use crate::cancel::Interrupted;

#[derive(Debug, Error)]
pub enum FrameSetError {
    #[error("frame level {level} out of range (frontier level is {frontier})")]
    LevelOutOfRange { level: usize, frontier: usize },
    #[error("frame 0 holds the initial condition and cannot receive blocking clauses")]
    InitialFrameImmutable,
    #[error("Solver error: {0}")]
    Solver(String),
    #[error(transparent)]
    Interrupted(#[from] Interrupted),
}

impl<E: std::error::Error + 'static> From<SessionError<E>> for FrameSetError {
    fn from(err: SessionError<E>) -> Self {
        FrameSetError::Solver(err.to_string())
    }
}
