use crate::{
    room::{Device, Substrate},
    scenario::{ScenarioKind, SimulationMode},
};
use serde::Deserialize;
use std::collections::HashMap;

/// Optional overrides for a room's initial climate; anything unset falls back
/// to the facility defaults applied by the room builder.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvironmentOverrides {
    pub temperature_c: Option<f64>,
    pub humidity_percent: Option<f64>,
    pub co2_ppm: Option<f64>,
    pub airflow_cfm: Option<f64>,
    pub light_lux: Option<f64>,
    pub timestamp: Option<i64>,
}

/// The raw on-disk record a Room is built from.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomConfig {
    pub room_id: String,
    pub display_name: Option<String>,
    pub species: Option<String>,
    pub stage: Option<String>,
    pub volume_m3: Option<f64>,
    #[serde(default)]
    pub devices: Vec<Device>,
    pub substrate: Option<Substrate>,
    #[serde(default)]
    pub environment: EnvironmentOverrides,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioConfig {
    pub scenario_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub kind: ScenarioKind,
    pub mode: SimulationMode,
    pub duration_minutes: u64,
    /// Ids of facility rooms this scenario runs over, in report order.
    pub room_ids: Vec<String>,
    #[serde(default)]
    pub parameters: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct FacilityFile {
    pub schema_version: String,
    pub rooms: Vec<RoomConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ScenarioFile {
    pub schema_version: String,
    pub scenarios: Vec<ScenarioConfig>,
}
