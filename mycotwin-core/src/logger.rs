use crate::error::MycotwinError;
use csv::Writer;
use mycotwin_schemas::report::EnvironmentalCurve;
use serde::Serialize;
use std::fs;

#[derive(Debug, Serialize)]
struct CurveRow {
    room_id: String,
    timestamp: i64,
    temperature_c: f64,
    humidity_percent: f64,
    co2_ppm: f64,
    airflow_cfm: f64,
    light_lux: f64,
}

/// Writes environmental curves to a CSV file, one row per sample.
pub struct CurveWriter {
    writer: Writer<fs::File>,
}

impl CurveWriter {
    pub fn new(path: &str) -> Result<Self, MycotwinError> {
        let file = fs::File::create(path)
            .map_err(|e| MycotwinError::FileIO(path.to_string(), e))?;
        Ok(Self {
            writer: Writer::from_writer(file),
        })
    }

    pub fn write_curve(&mut self, curve: &EnvironmentalCurve) -> Result<(), MycotwinError> {
        for sample in &curve.samples {
            let row = CurveRow {
                room_id: curve.room_id.clone(),
                timestamp: sample.timestamp,
                temperature_c: sample.temperature_c,
                humidity_percent: sample.humidity_percent,
                co2_ppm: sample.co2_ppm,
                airflow_cfm: sample.airflow_cfm,
                light_lux: sample.light_lux,
            };
            self.writer
                .serialize(row)
                .map_err(|e| MycotwinError::LoggingError(e.into()))?;
        }
        self.writer
            .flush()
            .map_err(|e| MycotwinError::FileIO("<flush>".to_string(), e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mycotwin_schemas::environment::EnvironmentalState;
    use mycotwin_schemas::report::StabilityClass;

    #[test]
    fn writes_one_row_per_sample() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curve.csv");
        let path = path.to_str().unwrap();

        let curve = EnvironmentalCurve {
            room_id: "ROOM-01".to_string(),
            started_at: 0,
            ended_at: 120,
            samples: vec![
                EnvironmentalState {
                    temperature_c: 20.0,
                    humidity_percent: 60.0,
                    co2_ppm: 800.0,
                    airflow_cfm: 100.0,
                    light_lux: 0.0,
                    timestamp: 0,
                },
                EnvironmentalState {
                    temperature_c: 19.99,
                    humidity_percent: 59.98,
                    co2_ppm: 800.0,
                    airflow_cfm: 100.0,
                    light_lux: 0.0,
                    timestamp: 60,
                },
            ],
            stability: StabilityClass::Stable,
            deviations: vec![],
        };

        let mut writer = CurveWriter::new(path).unwrap();
        writer.write_curve(&curve).unwrap();

        let content = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        // Header plus two samples.
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("room_id,timestamp"));
        assert!(lines[1].contains("ROOM-01"));
    }
}
