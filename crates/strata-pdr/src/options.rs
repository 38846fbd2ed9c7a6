use serde::{Deserialize, Serialize};

/// Tuning knobs for a [`crate::frames::DeltaEncodedFrameSet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameSetOptions {
    /// Number of frames to reserve storage for up front.
    pub initial_capacity: usize,
    /// Remove clauses implied by a clause of the next level after each
    /// propagation step.
    pub subsumption: bool,
}

impl Default for FrameSetOptions {
    fn default() -> Self {
        Self {
            initial_capacity: 10,
            subsumption: true,
        }
    }
}
