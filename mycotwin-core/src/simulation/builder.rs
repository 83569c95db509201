use crate::error::MycotwinError;
use mycotwin_schemas::{
    environment::EnvironmentalState,
    file_formats::RoomConfig,
    room::{Device, Room, Substrate},
};

pub const DEFAULT_VOLUME_M3: f64 = 50.0;
pub const DEFAULT_TEMPERATURE_C: f64 = 20.0;
pub const DEFAULT_HUMIDITY_PERCENT: f64 = 60.0;
pub const DEFAULT_CO2_PPM: f64 = 800.0;
pub const DEFAULT_AIRFLOW_CFM: f64 = 100.0;
pub const DEFAULT_LIGHT_LUX: f64 = 0.0;

/// A fluent builder for assembling a `Room` snapshot from a configuration
/// record. Pure data construction; the simulation models trust its output
/// and do not re-validate it.
#[derive(Default)]
pub struct RoomBuilder {
    room_id: String,
    display_name: Option<String>,
    species: Option<String>,
    stage: Option<String>,
    volume_m3: Option<f64>,
    devices: Vec<Device>,
    substrate: Option<Substrate>,
    temperature_c: Option<f64>,
    humidity_percent: Option<f64>,
    co2_ppm: Option<f64>,
    airflow_cfm: Option<f64>,
    light_lux: Option<f64>,
    timestamp: Option<i64>,
}

impl RoomBuilder {
    pub fn new(room_id: &str) -> Self {
        Self {
            room_id: room_id.to_string(),
            ..Self::default()
        }
    }

    /// Seeds the builder from an on-disk room configuration record.
    pub fn from_config(config: RoomConfig) -> Self {
        Self {
            room_id: config.room_id,
            display_name: config.display_name,
            species: config.species,
            stage: config.stage,
            volume_m3: config.volume_m3,
            devices: config.devices,
            substrate: config.substrate,
            temperature_c: config.environment.temperature_c,
            humidity_percent: config.environment.humidity_percent,
            co2_ppm: config.environment.co2_ppm,
            airflow_cfm: config.environment.airflow_cfm,
            light_lux: config.environment.light_lux,
            timestamp: config.environment.timestamp,
        }
    }

    pub fn with_display_name(mut self, name: &str) -> Self {
        self.display_name = Some(name.to_string());
        self
    }

    pub fn with_species(mut self, species: &str, stage: &str) -> Self {
        self.species = Some(species.to_string());
        self.stage = Some(stage.to_string());
        self
    }

    pub fn with_volume(mut self, volume_m3: f64) -> Self {
        self.volume_m3 = Some(volume_m3);
        self
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.devices.push(device);
        self
    }

    pub fn with_substrate(mut self, substrate: Substrate) -> Self {
        self.substrate = Some(substrate);
        self
    }

    pub fn with_initial_environment(mut self, state: EnvironmentalState) -> Self {
        self.temperature_c = Some(state.temperature_c);
        self.humidity_percent = Some(state.humidity_percent);
        self.co2_ppm = Some(state.co2_ppm);
        self.airflow_cfm = Some(state.airflow_cfm);
        self.light_lux = Some(state.light_lux);
        self.timestamp = Some(state.timestamp);
        self
    }

    /// Consumes the builder and returns a fully defaulted `Room`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidVolume` when an explicit volume is not positive.
    pub fn build(self) -> Result<Room, MycotwinError> {
        let volume_m3 = self.volume_m3.unwrap_or(DEFAULT_VOLUME_M3);
        if volume_m3 <= 0.0 {
            return Err(MycotwinError::InvalidVolume {
                room_id: self.room_id,
                volume_m3,
            });
        }

        let display_name = self
            .display_name
            .unwrap_or_else(|| self.room_id.clone());

        let state = EnvironmentalState {
            temperature_c: self.temperature_c.unwrap_or(DEFAULT_TEMPERATURE_C),
            humidity_percent: self.humidity_percent.unwrap_or(DEFAULT_HUMIDITY_PERCENT),
            co2_ppm: self.co2_ppm.unwrap_or(DEFAULT_CO2_PPM),
            airflow_cfm: self.airflow_cfm.unwrap_or(DEFAULT_AIRFLOW_CFM),
            light_lux: self.light_lux.unwrap_or(DEFAULT_LIGHT_LUX),
            timestamp: self.timestamp.unwrap_or(0),
        };

        Ok(Room {
            room_id: self.room_id,
            display_name,
            species: self.species,
            stage: self.stage,
            volume_m3,
            devices: self.devices,
            substrate: self.substrate,
            state,
        })
    }
}
