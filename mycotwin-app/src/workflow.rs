use crate::plotting;
use anyhow::{bail, Context, Result};
use mycotwin_core::{logger::CurveWriter, orchestrator::SimulationCenter};
use mycotwin_schemas::{
    file_formats::ScenarioConfig,
    report::SimulationReport,
    room::Room,
    scenario::SimulationScenario,
};
use std::{collections::HashMap, fs, path::Path};

/// Registers every scenario, runs them in id order, and writes the report
/// bundle (JSON report, curve CSVs, charts, audit export) per run.
pub fn run_all(
    rooms: HashMap<String, Room>,
    scenario_configs: Vec<ScenarioConfig>,
    output_dir: &Path,
) -> Result<()> {
    let mut center = SimulationCenter::new();

    for config in scenario_configs {
        let scenario = assemble_scenario(config, &rooms)?;
        center.create_scenario(scenario)?;
    }

    let scenario_ids: Vec<String> = center
        .list_scenarios()
        .iter()
        .map(|s| s.scenario_id.clone())
        .collect();

    for scenario_id in scenario_ids {
        println!("\n--- [Workflow] Running scenario '{}' ---", scenario_id);
        let started_at = chrono::Utc::now().timestamp();
        let report = center.run_simulation(&scenario_id, started_at)?;

        print_report_summary(&report);
        write_report_bundle(&report, output_dir)?;
    }

    let audit_path = output_dir.join("audit_log.json");
    fs::write(&audit_path, center.audit().export_json()?)
        .with_context(|| format!("Failed to write {:?}", audit_path))?;

    Ok(())
}

/// Resolves a scenario config's room references against the facility.
fn assemble_scenario(
    config: ScenarioConfig,
    rooms: &HashMap<String, Room>,
) -> Result<SimulationScenario> {
    let mut scenario_rooms = Vec::with_capacity(config.room_ids.len());
    for room_id in &config.room_ids {
        match rooms.get(room_id) {
            Some(room) => scenario_rooms.push(room.clone()),
            None => bail!(
                "Scenario '{}' references unknown room '{}'",
                config.scenario_id,
                room_id
            ),
        }
    }

    Ok(SimulationScenario {
        scenario_id: config.scenario_id,
        name: config.name,
        description: config.description,
        kind: config.kind,
        mode: config.mode,
        duration_minutes: config.duration_minutes,
        rooms: scenario_rooms,
        parameters: config.parameters,
    })
}

fn print_report_summary(report: &SimulationReport) {
    println!("\n--- [Report {}] ---", report.report_id);
    println!("========================================");
    println!("{}", report.summary);

    if !report.curves.is_empty() {
        println!("\nEnvironmental projections:");
        for curve in &report.curves {
            println!(
                "  - {:<12} | {:>4} samples | {:?} | {} deviations",
                curve.room_id,
                curve.samples.len(),
                curve.stability,
                curve.deviations.len()
            );
        }
    }

    println!("\nContamination risk:");
    for risk in &report.risk_maps {
        println!(
            "  - {:<12} | score {:>3}/100 | {:?}",
            risk.room_id, risk.score, risk.risk_level
        );
    }

    if !report.loop_reports.is_empty() {
        println!("\nControl loops:");
        for loop_report in &report.loop_reports {
            println!(
                "  - {:<12} | {:?} | avg dev {:.2} | {} cycles | {:.3} kWh",
                loop_report.room_id,
                loop_report.stability,
                loop_report.average_deviation,
                loop_report.actuation_cycles,
                loop_report.energy_kwh
            );
        }
        println!("  Total energy: {:.3} kWh", report.total_energy_kwh);
    }

    if !report.warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &report.warnings {
            println!("  ! {}", warning);
        }
    }
    if !report.recommendations.is_empty() {
        println!("\nRecommendations:");
        for recommendation in &report.recommendations {
            println!("  - {}", recommendation);
        }
    }
    println!("========================================");
}

fn write_report_bundle(report: &SimulationReport, output_dir: &Path) -> Result<()> {
    let report_path = output_dir.join(format!("{}.json", report.report_id));
    fs::write(&report_path, serde_json::to_string_pretty(report)?)
        .with_context(|| format!("Failed to write {:?}", report_path))?;

    for curve in &report.curves {
        let csv_path = output_dir.join(format!("{}_{}.csv", report.report_id, curve.room_id));
        let csv_path = csv_path
            .to_str()
            .with_context(|| format!("Non-UTF8 path {:?}", csv_path))?
            .to_string();
        let mut writer = CurveWriter::new(&csv_path)?;
        writer.write_curve(curve)?;
    }

    plotting::plot_report_curves(output_dir, report)?;
    Ok(())
}
