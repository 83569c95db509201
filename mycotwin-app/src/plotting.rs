//! Renders the climate charts for a simulation report.

use anyhow::Result;
use mycotwin_schemas::report::{EnvironmentalCurve, SimulationReport};
use plotters::prelude::*;
use std::path::Path;

pub fn plot_report_curves(output_dir: &Path, report: &SimulationReport) -> Result<()> {
    if report.curves.is_empty() {
        return Ok(());
    }
    println!("[Plotting] Generating climate charts...");
    for curve in &report.curves {
        plot_curve(output_dir, &report.report_id, curve)?;
    }
    println!("[Plotting] Charts saved to '{}'.", output_dir.display());
    Ok(())
}

/// One chart per room: temperature, humidity and CO2 (scaled to fit one
/// axis) against minutes since the projection start.
fn plot_curve(output_dir: &Path, report_id: &str, curve: &EnvironmentalCurve) -> Result<()> {
    let path = output_dir.join(format!("{}_{}.png", report_id, curve.room_id));
    let root = BitMapBackend::new(&path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let minutes = |timestamp: i64| (timestamp - curve.started_at) as f64 / 60.0;
    let max_minute = curve
        .samples
        .last()
        .map_or(1.0, |s| minutes(s.timestamp).max(1.0));

    let max_value = curve
        .samples
        .iter()
        .map(|s| {
            s.temperature_c
                .max(s.humidity_percent)
                .max(s.co2_ppm / 100.0)
        })
        .fold(0.0, f64::max);

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Climate Projection - {}", curve.room_id),
            ("sans-serif", 40).into_font(),
        )
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..max_minute, 0f64..max_value * 1.1)?;

    chart
        .configure_mesh()
        .x_desc("Time (minutes)")
        .y_desc("Value")
        .draw()?;

    let series: [(&str, RGBColor, Box<dyn Fn(&mycotwin_schemas::environment::EnvironmentalState) -> f64>); 3] = [
        ("Temperature (C)", RED, Box::new(|s| s.temperature_c)),
        ("Humidity (%RH)", BLUE, Box::new(|s| s.humidity_percent)),
        ("CO2 (x100 ppm)", GREEN, Box::new(|s| s.co2_ppm / 100.0)),
    ];

    for (label, color, value) in series {
        chart
            .draw_series(LineSeries::new(
                curve
                    .samples
                    .iter()
                    .map(|s| (minutes(s.timestamp), value(s))),
                color.stroke_width(2),
            ))?
            .label(label)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.filled())
            });
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}
