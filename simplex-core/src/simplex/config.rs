use serde::{Deserialize, Serialize};

/// Limits and numeric tolerance of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Pivots allowed on the primary path before giving up.
    pub max_iterations: usize,
    /// Alternate-optimum pivots explored after the primary path terminates.
    pub max_alternates: usize,
    /// Magnitude below which an entry counts as zero.
    pub tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1_000,
            max_alternates: 64,
            tolerance: 1e-9,
        }
    }
}

impl SolverConfig {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_max_alternates(mut self, max_alternates: usize) -> Self {
        self.max_alternates = max_alternates;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}
