use crate::environment::EnvironmentalState;
use serde::{Deserialize, Serialize};

/// Qualitative judgment of an open-loop environmental trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StabilityClass {
    Stable,
    Drifting,
    Oscillating,
}

/// Qualitative judgment of a closed-loop run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopStability {
    Stable,
    Oscillating,
    Unstable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// One room's projected climate trajectory. Samples are chronological;
/// produced once per run and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalCurve {
    pub room_id: String,
    pub started_at: i64,
    pub ended_at: i64,
    pub samples: Vec<EnvironmentalState>,
    pub stability: StabilityClass,
    pub deviations: Vec<String>,
}

/// The raw signals behind a contamination score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactors {
    pub high_humidity: bool,
    pub poor_airflow: bool,
    pub stagnant_air: bool,
    pub temperature_fluctuation_c: f64,
    /// Heuristic 0-100 proxy for airborne contaminant burden; not a measurement.
    pub spore_load: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContaminationRiskMap {
    pub room_id: String,
    pub risk_level: RiskLevel,
    /// Integer score in [0, 100].
    pub score: u32,
    pub factors: RiskFactors,
    pub recommendations: Vec<String>,
    /// Ends with the model-projection disclaimer.
    pub rationale: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopStabilityReport {
    pub room_id: String,
    pub duration_minutes: u64,
    pub stability: LoopStability,
    /// Deviations are normalized: 1.0 sits exactly on the tolerance boundary.
    pub average_deviation: f64,
    pub max_deviation: f64,
    /// Total off->on and on->off transitions across all actuators.
    pub actuation_cycles: u32,
    pub energy_kwh: f64,
    pub recommendations: Vec<String>,
    /// Reported only when the loop is classified as oscillating.
    pub oscillation_frequency_cph: Option<f64>,
}

/// The immutable outcome of one scenario run. Every run appends a fresh
/// report; reports are never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub report_id: String,
    pub scenario_id: String,
    pub generated_at: i64,
    pub duration_minutes: u64,
    pub curves: Vec<EnvironmentalCurve>,
    pub risk_maps: Vec<ContaminationRiskMap>,
    pub loop_reports: Vec<LoopStabilityReport>,
    pub total_energy_kwh: f64,
    pub summary: String,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}
