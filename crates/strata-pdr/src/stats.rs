//! Run statistics for a frame set.
//!
//! Counters use saturating arithmetic so a very long run degrades to a
//! pinned value instead of wrapping.

use std::fmt;
use std::io;
use std::time::Duration;

use serde::Serialize;

/// Accumulates measured intervals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Timer {
    pub intervals: u64,
    pub total: Duration,
    pub max: Duration,
}

impl Timer {
    pub fn record(&mut self, elapsed: Duration) {
        self.intervals = self.intervals.saturating_add(1);
        self.total = self.total.saturating_add(elapsed);
        self.max = self.max.max(elapsed);
    }

    pub fn has_intervals(&self) -> bool {
        self.intervals > 0
    }

    pub fn average(&self) -> Duration {
        match u32::try_from(self.intervals) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.total / n,
            Err(_) => Duration::from_secs_f64(self.total.as_secs_f64() / self.intervals as f64),
        }
    }
}

fn fmt_duration(d: Duration) -> String {
    format!("{:.3}s", d.as_secs_f64())
}

/// Counters and timers collected by [`crate::frames::DeltaEncodedFrameSet`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FrameSetStatistics {
    pub frames: u64,
    /// Clauses currently stored in frames above level 0.
    pub clauses: u64,
    pub clauses_added: u64,
    pub subsumed_clauses: u64,
    pub propagated_clauses: u64,
    /// Levels visited by `propagate`, summed over all runs.
    pub levels_propagated: u64,
    pub propagation: Timer,
    pub propagation_solver: Timer,
    pub subsumption: Timer,
}

/// A component whose statistics an external collector can poll.
pub trait StatisticsReport {
    fn name(&self) -> &str;
    fn print_statistics(&self, out: &mut dyn io::Write) -> io::Result<()>;
}

impl fmt::Display for FrameSetStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of frames:                        {}", self.frames)?;
        writeln!(f, "Final number of clauses in all frames:   {}", self.clauses)?;
        writeln!(
            f,
            "Number of subsumed clauses during run:   {}",
            self.subsumed_clauses
        )?;
        writeln!(
            f,
            "Total number of clauses during run:      {}",
            self.clauses.saturating_add(self.subsumed_clauses)
        )?;
        if self.propagation.has_intervals() {
            writeln!(
                f,
                "Total time for propagation:          {}",
                fmt_duration(self.propagation.total)
            )?;
            writeln!(
                f,
                "  Average time for propagation:      {}",
                fmt_duration(self.propagation.average())
            )?;
        }
        if self.propagation_solver.has_intervals() {
            writeln!(
                f,
                "Time spent in solver:                {}",
                fmt_duration(self.propagation_solver.total)
            )?;
        }
        if self.subsumption.has_intervals() {
            writeln!(
                f,
                "Total time for subsumption:          {}",
                fmt_duration(self.subsumption.total)
            )?;
            writeln!(
                f,
                "  Average time for subsumption:      {}",
                fmt_duration(self.subsumption.average())
            )?;
        }
        Ok(())
    }
}

impl StatisticsReport for FrameSetStatistics {
    fn name(&self) -> &str {
        "Frame set"
    }

    fn print_statistics(&self, out: &mut dyn io::Write) -> io::Result<()> {
        write!(out, "{self}")
    }
}
