use crate::room::Room;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    Baseline,
    WhatIf,
    Optimization,
    Contamination,
}

/// Which models a run invokes per room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationMode {
    /// Contamination assessment on the current state only; no stepping.
    Snapshot,
    /// Environmental projection feeding contamination assessment.
    TimeSeries,
    /// Time-series plus a closed-loop evaluation against the species target.
    StressTest,
    /// Time-series plus a closed-loop evaluation, for tuning comparisons.
    Optimization,
}

/// A named what-if experiment over a set of rooms. Created once by the
/// operator and never mutated; re-running re-reads the same definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationScenario {
    pub scenario_id: String,
    pub name: String,
    pub description: String,
    pub kind: ScenarioKind,
    pub mode: SimulationMode,
    /// Simulated wall-clock span in minutes. Must be positive.
    pub duration_minutes: u64,
    pub rooms: Vec<Room>,
    /// Free-form knobs (e.g. "control_strategy") interpreted by the runner.
    pub parameters: HashMap<String, serde_json::Value>,
}
