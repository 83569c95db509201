use crate::error::MycotwinError;
use crate::events::{AuditLog, EventCategory};
use crate::simulation::{contamination, control, environment, targets};
use mycotwin_schemas::{
    control::{ControlStrategy, LoopConfig, ToleranceBand},
    report::{
        ContaminationRiskMap, EnvironmentalCurve, LoopStability, LoopStabilityReport, RiskLevel,
        SimulationReport, StabilityClass,
    },
    scenario::{ScenarioKind, SimulationMode, SimulationScenario},
};
use std::collections::HashMap;

/// Closed-loop evaluations are expensive; cap them regardless of scenario
/// duration.
pub const LOOP_DURATION_CAP_MINUTES: u64 = 120;

/// Upper bound on scenario duration (one week of minutes). Runs execute to
/// completion with no cancellation, so the bound keeps a single run's work
/// finite.
pub const MAX_DURATION_MINUTES: u64 = 10_080;

const STEP_MINUTES: u64 = 1;

const SUMMARY_DISCLAIMER: &str = "All figures are model-based projections \
for relative comparison between scenarios, not real-world guarantees.";

/// Owns the scenario registry, the append-only report list and the audit
/// log, and composes the per-room models into one report per run.
#[derive(Default)]
pub struct SimulationCenter {
    scenarios: HashMap<String, SimulationScenario>,
    reports: Vec<SimulationReport>,
    audit: AuditLog,
}

impl SimulationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a scenario after validating its configuration. Scenarios
    /// are immutable once registered; re-running re-reads the same
    /// definition.
    pub fn create_scenario(&mut self, scenario: SimulationScenario) -> Result<(), MycotwinError> {
        if scenario.duration_minutes == 0 {
            return Err(MycotwinError::InvalidDuration(scenario.duration_minutes));
        }
        if scenario.duration_minutes > MAX_DURATION_MINUTES {
            return Err(MycotwinError::DurationExceedsCap(
                scenario.duration_minutes,
                MAX_DURATION_MINUTES,
            ));
        }
        for room in &scenario.rooms {
            if room.volume_m3 <= 0.0 {
                return Err(MycotwinError::InvalidVolume {
                    room_id: room.room_id.clone(),
                    volume_m3: room.volume_m3,
                });
            }
        }
        if self.scenarios.contains_key(&scenario.scenario_id) {
            return Err(MycotwinError::DuplicateScenario(scenario.scenario_id));
        }

        self.audit.record(
            EventCategory::Simulation,
            "scenario created",
            serde_json::json!({
                "scenario_id": scenario.scenario_id,
                "rooms": scenario.rooms.len(),
                "duration_minutes": scenario.duration_minutes,
            }),
        );
        self.scenarios
            .insert(scenario.scenario_id.clone(), scenario);
        Ok(())
    }

    /// Scenarios in id order, so listings are reproducible.
    pub fn list_scenarios(&self) -> Vec<&SimulationScenario> {
        let mut scenarios: Vec<&SimulationScenario> = self.scenarios.values().collect();
        scenarios.sort_by(|a, b| a.scenario_id.cmp(&b.scenario_id));
        scenarios
    }

    pub fn get_scenario(&self, scenario_id: &str) -> Option<&SimulationScenario> {
        self.scenarios.get(scenario_id)
    }

    pub fn list_reports(&self) -> &[SimulationReport] {
        &self.reports
    }

    pub fn get_report(&self, report_id: &str) -> Option<&SimulationReport> {
        self.reports.iter().find(|r| r.report_id == report_id)
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Runs a registered scenario end-to-end and appends the resulting
    /// report. Every run produces a fresh report; nothing already stored is
    /// touched.
    pub fn run_simulation(
        &mut self,
        scenario_id: &str,
        started_at: i64,
    ) -> Result<SimulationReport, MycotwinError> {
        let scenario = self
            .scenarios
            .get(scenario_id)
            .ok_or_else(|| MycotwinError::ScenarioNotFound(scenario_id.to_string()))?
            .clone();

        let strategy = strategy_from_parameters(&scenario);

        let mut curves: Vec<EnvironmentalCurve> = Vec::new();
        let mut risk_maps: Vec<ContaminationRiskMap> = Vec::new();
        let mut loop_reports: Vec<LoopStabilityReport> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();

        for room in &scenario.rooms {
            match scenario.mode {
                SimulationMode::Snapshot => {
                    let risk = contamination::assess_contamination_risk(room, None);
                    self.record_risk_event(&risk);
                    push_risk_warning(&mut warnings, &risk);
                    risk_maps.push(risk);
                }
                SimulationMode::TimeSeries
                | SimulationMode::StressTest
                | SimulationMode::Optimization => {
                    let curve = environment::simulate_time_series(
                        room,
                        scenario.duration_minutes,
                        STEP_MINUTES,
                    )?;
                    self.audit.record(
                        EventCategory::Environmental,
                        "environmental projection complete",
                        serde_json::json!({
                            "room_id": curve.room_id,
                            "duration_minutes": scenario.duration_minutes,
                            "stability": stability_label(curve.stability),
                            "deviations": curve.deviations.len(),
                        }),
                    );
                    if curve.stability != StabilityClass::Stable {
                        warnings.push(format!(
                            "Room '{}' environment is {} over the projection",
                            room.room_id,
                            stability_label(curve.stability)
                        ));
                    }

                    let risk = contamination::assess_contamination_risk(room, Some(&curve.samples));
                    self.record_risk_event(&risk);
                    push_risk_warning(&mut warnings, &risk);

                    let run_loop = matches!(
                        scenario.mode,
                        SimulationMode::StressTest | SimulationMode::Optimization
                    );
                    if run_loop {
                        // Skipped entirely when the species/stage target is
                        // undefined; never invoked with a partial target.
                        if let Some(target) =
                            targets::target_environment(room.species.as_deref(), room.stage.as_deref())
                        {
                            let config = LoopConfig {
                                duration_minutes: scenario
                                    .duration_minutes
                                    .min(LOOP_DURATION_CAP_MINUTES),
                                strategy,
                                target,
                                tolerances: ToleranceBand::default(),
                            };
                            let loop_report = control::run_closed_loop(room, &config)?;
                            self.audit.record(
                                EventCategory::Loop,
                                "closed-loop evaluation complete",
                                serde_json::json!({
                                    "room_id": loop_report.room_id,
                                    "stability": loop_label(loop_report.stability),
                                    "cycles": loop_report.actuation_cycles,
                                    "energy_kwh": loop_report.energy_kwh,
                                }),
                            );
                            if loop_report.stability != LoopStability::Stable {
                                warnings.push(format!(
                                    "Room '{}' control loop is {}",
                                    room.room_id,
                                    loop_label(loop_report.stability)
                                ));
                            }
                            loop_reports.push(loop_report);
                        }
                    }

                    curves.push(curve);
                    risk_maps.push(risk);
                }
            }
        }

        let recommendations = scenario_recommendations(&scenario, &risk_maps);
        let summary = build_summary(&scenario, &curves, &risk_maps, &loop_reports);
        let total_energy_kwh = loop_reports.iter().map(|r| r.energy_kwh).sum();

        let report = SimulationReport {
            report_id: format!("report-{}-{:04}", scenario.scenario_id, self.reports.len() + 1),
            scenario_id: scenario.scenario_id.clone(),
            generated_at: started_at,
            duration_minutes: scenario.duration_minutes,
            curves,
            risk_maps,
            loop_reports,
            total_energy_kwh,
            summary,
            warnings,
            recommendations,
        };

        self.audit.record(
            EventCategory::Simulation,
            "simulation complete",
            serde_json::json!({
                "scenario_id": report.scenario_id,
                "report_id": report.report_id,
                "warnings": report.warnings.len(),
            }),
        );
        self.reports.push(report.clone());
        Ok(report)
    }

    fn record_risk_event(&mut self, risk: &ContaminationRiskMap) {
        self.audit.record(
            EventCategory::Contamination,
            "contamination assessment complete",
            serde_json::json!({
                "room_id": risk.room_id,
                "risk_level": risk_label(risk.risk_level),
                "score": risk.score,
            }),
        );
    }
}

fn push_risk_warning(warnings: &mut Vec<String>, risk: &ContaminationRiskMap) {
    if risk.risk_level == RiskLevel::High {
        warnings.push(format!(
            "Room '{}' contamination risk is high (score {})",
            risk.room_id, risk.score
        ));
    }
}

fn strategy_from_parameters(scenario: &SimulationScenario) -> ControlStrategy {
    match scenario
        .parameters
        .get("control_strategy")
        .and_then(|v| v.as_str())
    {
        Some("bang_bang") => ControlStrategy::BangBang,
        Some("adaptive") => ControlStrategy::Adaptive,
        _ => ControlStrategy::Pid,
    }
}

fn scenario_recommendations(
    scenario: &SimulationScenario,
    risk_maps: &[ContaminationRiskMap],
) -> Vec<String> {
    let mut recommendations = Vec::new();
    match scenario.kind {
        ScenarioKind::Optimization => {
            recommendations.push(
                "Review control loop tuning and device scheduling for further savings."
                    .to_string(),
            );
        }
        ScenarioKind::Contamination => {
            let high = risk_maps
                .iter()
                .filter(|r| r.risk_level == RiskLevel::High)
                .count();
            recommendations.push(format!(
                "{} of {} rooms project high contamination risk; prioritize them for intervention.",
                high,
                risk_maps.len()
            ));
        }
        ScenarioKind::Baseline | ScenarioKind::WhatIf => {}
    }
    recommendations
}

fn build_summary(
    scenario: &SimulationScenario,
    curves: &[EnvironmentalCurve],
    risk_maps: &[ContaminationRiskMap],
    loop_reports: &[LoopStabilityReport],
) -> String {
    let mut parts = Vec::new();

    if curves.is_empty() {
        parts.push(format!(
            "Snapshot assessment of {} rooms",
            scenario.rooms.len()
        ));
    } else {
        let stable = curves
            .iter()
            .filter(|c| c.stability == StabilityClass::Stable)
            .count();
        parts.push(format!(
            "{}/{} environmental projections stable",
            stable,
            curves.len()
        ));
    }

    let high = risk_maps
        .iter()
        .filter(|r| r.risk_level == RiskLevel::High)
        .count();
    parts.push(format!("{} rooms at high contamination risk", high));

    if !loop_reports.is_empty() {
        let stable = loop_reports
            .iter()
            .filter(|r| r.stability == LoopStability::Stable)
            .count();
        parts.push(format!(
            "{}/{} control loops stable",
            stable,
            loop_reports.len()
        ));
    }

    format!("{}. {}", parts.join("; "), SUMMARY_DISCLAIMER)
}

fn stability_label(class: StabilityClass) -> &'static str {
    match class {
        StabilityClass::Stable => "stable",
        StabilityClass::Drifting => "drifting",
        StabilityClass::Oscillating => "oscillating",
    }
}

fn loop_label(stability: LoopStability) -> &'static str {
    match stability {
        LoopStability::Stable => "stable",
        LoopStability::Oscillating => "oscillating",
        LoopStability::Unstable => "unstable",
    }
}

fn risk_label(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "low",
        RiskLevel::Medium => "medium",
        RiskLevel::High => "high",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mycotwin_schemas::environment::EnvironmentalState;
    use mycotwin_schemas::room::Room;

    fn room(room_id: &str, humidity_percent: f64) -> Room {
        Room {
            room_id: room_id.to_string(),
            display_name: room_id.to_string(),
            species: Some("oyster".to_string()),
            stage: Some("fruiting".to_string()),
            volume_m3: 50.0,
            devices: vec![],
            substrate: None,
            state: EnvironmentalState {
                temperature_c: 20.0,
                humidity_percent,
                co2_ppm: 800.0,
                airflow_cfm: 100.0,
                light_lux: 0.0,
                timestamp: 0,
            },
        }
    }

    fn scenario(
        scenario_id: &str,
        mode: SimulationMode,
        kind: ScenarioKind,
        rooms: Vec<Room>,
    ) -> SimulationScenario {
        SimulationScenario {
            scenario_id: scenario_id.to_string(),
            name: scenario_id.to_string(),
            description: String::new(),
            kind,
            mode,
            duration_minutes: 60,
            rooms,
            parameters: HashMap::new(),
        }
    }

    #[test]
    fn unknown_scenario_is_not_found_and_leaves_no_report() {
        let mut center = SimulationCenter::new();
        let result = center.run_simulation("missing-id", 0);

        assert!(matches!(result, Err(MycotwinError::ScenarioNotFound(_))));
        assert!(center.list_reports().is_empty());
    }

    #[test]
    fn invalid_configuration_is_rejected_at_creation() {
        let mut center = SimulationCenter::new();

        let mut zero_duration = scenario(
            "s-bad",
            SimulationMode::TimeSeries,
            ScenarioKind::Baseline,
            vec![room("ROOM-01", 60.0)],
        );
        zero_duration.duration_minutes = 0;
        assert!(matches!(
            center.create_scenario(zero_duration),
            Err(MycotwinError::InvalidDuration(0))
        ));

        let mut oversized = scenario(
            "s-long",
            SimulationMode::TimeSeries,
            ScenarioKind::Baseline,
            vec![room("ROOM-03", 60.0)],
        );
        oversized.duration_minutes = MAX_DURATION_MINUTES + 1;
        assert!(matches!(
            center.create_scenario(oversized),
            Err(MycotwinError::DurationExceedsCap(_, _))
        ));

        let mut flat_room = room("ROOM-02", 60.0);
        flat_room.volume_m3 = 0.0;
        let bad_room = scenario(
            "s-flat",
            SimulationMode::TimeSeries,
            ScenarioKind::Baseline,
            vec![flat_room],
        );
        assert!(matches!(
            center.create_scenario(bad_room),
            Err(MycotwinError::InvalidVolume { .. })
        ));
    }

    #[test]
    fn duplicate_scenario_ids_are_rejected() {
        let mut center = SimulationCenter::new();
        let first = scenario(
            "s-1",
            SimulationMode::Snapshot,
            ScenarioKind::Baseline,
            vec![room("ROOM-01", 60.0)],
        );
        center.create_scenario(first.clone()).unwrap();
        assert!(matches!(
            center.create_scenario(first),
            Err(MycotwinError::DuplicateScenario(_))
        ));
    }

    #[test]
    fn snapshot_and_time_series_assess_different_inputs() {
        // Humidity starts just above the 90% flag threshold and drifts below
        // it over the hour: the snapshot flags it, the trajectory does not.
        let mut center = SimulationCenter::new();
        center
            .create_scenario(scenario(
                "s-snap",
                SimulationMode::Snapshot,
                ScenarioKind::Baseline,
                vec![room("ROOM-01", 90.5)],
            ))
            .unwrap();
        center
            .create_scenario(scenario(
                "s-series",
                SimulationMode::TimeSeries,
                ScenarioKind::Baseline,
                vec![room("ROOM-01", 90.5)],
            ))
            .unwrap();

        let snap = center.run_simulation("s-snap", 0).unwrap();
        let series = center.run_simulation("s-series", 0).unwrap();

        assert!(snap.curves.is_empty());
        assert_eq!(series.curves.len(), 1);
        assert!(snap.risk_maps[0].factors.high_humidity);
        assert!(!series.risk_maps[0].factors.high_humidity);
    }

    #[test]
    fn reports_are_append_only_and_reproducible() {
        let mut center = SimulationCenter::new();
        center
            .create_scenario(scenario(
                "s-1",
                SimulationMode::TimeSeries,
                ScenarioKind::WhatIf,
                vec![room("ROOM-01", 60.0), room("ROOM-02", 92.0)],
            ))
            .unwrap();

        let first = center.run_simulation("s-1", 100).unwrap();
        let second = center.run_simulation("s-1", 200).unwrap();

        assert_eq!(center.list_reports().len(), 2);
        assert_ne!(first.report_id, second.report_id);
        // Identical inputs project identical curves and risk maps.
        assert_eq!(first.curves, second.curves);
        assert_eq!(first.risk_maps, second.risk_maps);
        assert!(center.get_report(&first.report_id).is_some());
        assert!(center.get_report(&second.report_id).is_some());
    }

    #[test]
    fn optimization_mode_runs_the_loop_when_target_exists() {
        let mut center = SimulationCenter::new();
        center
            .create_scenario(scenario(
                "s-opt",
                SimulationMode::Optimization,
                ScenarioKind::Optimization,
                vec![room("ROOM-01", 60.0)],
            ))
            .unwrap();

        let report = center.run_simulation("s-opt", 0).unwrap();
        assert_eq!(report.loop_reports.len(), 1);
        assert!(report.total_energy_kwh >= 0.0);
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.contains("tuning")));
        assert!(report.summary.contains("control loops"));
    }

    #[test]
    fn loop_is_skipped_without_a_species_target() {
        let mut center = SimulationCenter::new();
        let mut unknown = room("ROOM-01", 60.0);
        unknown.species = None;
        center
            .create_scenario(scenario(
                "s-opt",
                SimulationMode::Optimization,
                ScenarioKind::Optimization,
                vec![unknown],
            ))
            .unwrap();

        let report = center.run_simulation("s-opt", 0).unwrap();
        assert!(report.loop_reports.is_empty());
        assert_eq!(report.total_energy_kwh, 0.0);
    }

    #[test]
    fn contamination_kind_counts_high_risk_rooms() {
        let mut center = SimulationCenter::new();
        // Stagnant, humid, fanless room: well into the high-risk band.
        let mut risky = room("ROOM-01", 95.0);
        risky.state.airflow_cfm = 20.0;
        risky.state.co2_ppm = 4000.0;
        risky.state.temperature_c = 24.0;

        center
            .create_scenario(scenario(
                "s-contam",
                SimulationMode::Snapshot,
                ScenarioKind::Contamination,
                vec![risky],
            ))
            .unwrap();

        let report = center.run_simulation("s-contam", 0).unwrap();
        assert_eq!(report.risk_maps[0].risk_level, RiskLevel::High);
        assert!(report.warnings.iter().any(|w| w.contains("contamination")));
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.contains("1 of 1 rooms")));
    }

    #[test]
    fn audit_trail_records_the_run() {
        let mut center = SimulationCenter::new();
        center
            .create_scenario(scenario(
                "s-1",
                SimulationMode::TimeSeries,
                ScenarioKind::Baseline,
                vec![room("ROOM-01", 60.0)],
            ))
            .unwrap();
        center.run_simulation("s-1", 0).unwrap();

        assert_eq!(center.audit().entries_for(EventCategory::Simulation).len(), 2);
        assert_eq!(
            center
                .audit()
                .entries_for(EventCategory::Environmental)
                .len(),
            1
        );
        assert_eq!(
            center
                .audit()
                .entries_for(EventCategory::Contamination)
                .len(),
            1
        );
    }

    #[test]
    fn scenario_listing_is_ordered() {
        let mut center = SimulationCenter::new();
        for id in ["s-c", "s-a", "s-b"] {
            center
                .create_scenario(scenario(
                    id,
                    SimulationMode::Snapshot,
                    ScenarioKind::Baseline,
                    vec![room("ROOM-01", 60.0)],
                ))
                .unwrap();
        }

        let ids: Vec<&str> = center
            .list_scenarios()
            .iter()
            .map(|s| s.scenario_id.as_str())
            .collect();
        assert_eq!(ids, vec!["s-a", "s-b", "s-c"]);
    }
}
