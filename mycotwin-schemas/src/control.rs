use crate::environment::TargetEnvironment;
use serde::{Deserialize, Serialize};

/// Feedback law used by the closed-loop evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlStrategy {
    Pid,
    BangBang,
    Adaptive,
}

/// Per-parameter half-widths of the acceptable band around the target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceBand {
    pub temperature_c: f64,
    pub humidity_percent: f64,
    pub co2_ppm: f64,
}

impl Default for ToleranceBand {
    fn default() -> Self {
        Self {
            temperature_c: 1.0,
            humidity_percent: 5.0,
            co2_ppm: 200.0,
        }
    }
}

/// Configuration for one closed-loop evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopConfig {
    pub duration_minutes: u64,
    pub strategy: ControlStrategy,
    pub target: TargetEnvironment,
    pub tolerances: ToleranceBand,
}
