use serde::{Deserialize, Serialize};

pub const TEMPERATURE_BOUNDS_C: (f64, f64) = (5.0, 40.0);
pub const HUMIDITY_BOUNDS_PERCENT: (f64, f64) = (20.0, 100.0);
pub const CO2_BOUNDS_PPM: (f64, f64) = (400.0, 10000.0);

/// A single reading of a room's climate. Timestamps are unix seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalState {
    pub temperature_c: f64,
    pub humidity_percent: f64,
    pub co2_ppm: f64,
    pub airflow_cfm: f64,
    pub light_lux: f64,
    pub timestamp: i64,
}

impl EnvironmentalState {
    /// Pulls temperature, humidity and CO2 back inside their physical bounds.
    pub fn clamp_to_bounds(&mut self) {
        self.temperature_c = self
            .temperature_c
            .clamp(TEMPERATURE_BOUNDS_C.0, TEMPERATURE_BOUNDS_C.1);
        self.humidity_percent = self
            .humidity_percent
            .clamp(HUMIDITY_BOUNDS_PERCENT.0, HUMIDITY_BOUNDS_PERCENT.1);
        self.co2_ppm = self.co2_ppm.clamp(CO2_BOUNDS_PPM.0, CO2_BOUNDS_PPM.1);
    }

    /// Rounds temperature and humidity to two decimals and CO2 to a whole ppm,
    /// the resolution stored in curves.
    pub fn quantize(&mut self) {
        self.temperature_c = (self.temperature_c * 100.0).round() / 100.0;
        self.humidity_percent = (self.humidity_percent * 100.0).round() / 100.0;
        self.co2_ppm = self.co2_ppm.round();
    }

    pub fn is_within_bounds(&self) -> bool {
        self.temperature_c >= TEMPERATURE_BOUNDS_C.0
            && self.temperature_c <= TEMPERATURE_BOUNDS_C.1
            && self.humidity_percent >= HUMIDITY_BOUNDS_PERCENT.0
            && self.humidity_percent <= HUMIDITY_BOUNDS_PERCENT.1
            && self.co2_ppm >= CO2_BOUNDS_PPM.0
            && self.co2_ppm <= CO2_BOUNDS_PPM.1
    }
}

/// Species/stage climate setpoints. Entries in the target table are always
/// complete; a missing table entry means "no target", never a partial one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetEnvironment {
    pub temperature_c: f64,
    pub humidity_percent: f64,
    pub co2_ppm: f64,
}
