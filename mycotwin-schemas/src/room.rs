//! Defines the data structures for representing a grow-room in the MycoTwin
//! knowledge base: the room itself, the climate devices installed in it, and
//! the substrate load it carries.

use crate::environment::EnvironmentalState;
use serde::{Deserialize, Serialize};

/// Enumerates the climate device classes a room can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Heater,
    Humidifier,
    Fan,
    Co2Scrubber,
    Light,
    Sensor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    On,
    Off,
    Standby,
}

/// A climate device installed in a room. Devices are value objects; their id
/// is only meaningful within the room that lists them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// A unique, machine-readable identifier within the room (e.g., "HEAT-01").
    pub device_id: String,
    pub kind: DeviceKind,
    pub status: DeviceStatus,
    /// Rated electrical draw while actuating, in watts.
    pub power_watts: f64,
    /// Effect magnitude at the 50 m3 reference volume. Unit depends on kind:
    /// degC/h for heaters, %RH/h for humidifiers, CFM for fans, ppm/h removal
    /// for scrubbers, lux for lights, unused for sensors.
    pub effect_rate: f64,
}

impl Device {
    pub fn is_on(&self) -> bool {
        self.status == DeviceStatus::On
    }
}

/// An inoculated substrate load. A background source term for heat and CO2;
/// not mutated during simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substrate {
    /// A free-form type tag (e.g., "straw", "supplemented_sawdust").
    pub kind: String,
    pub mass_kg: f64,
    pub moisture_percent: f64,
    pub co2_rate_ppm_per_hour: f64,
    pub heat_rate_watts: f64,
}

/// The digital twin of one grow-room. Volume and species are immutable for
/// the life of a simulation run; the scenario that lists the room owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub room_id: String,
    pub display_name: String,
    /// Cultivated species (e.g., "oyster"), driving target-environment lookup.
    pub species: Option<String>,
    /// Growth stage (e.g., "colonization", "fruiting").
    pub stage: Option<String>,
    /// Interior air volume in cubic metres. Must be positive.
    pub volume_m3: f64,
    pub devices: Vec<Device>,
    pub substrate: Option<Substrate>,
    pub state: EnvironmentalState,
}

impl Room {
    /// True when any fan in the room is actively running.
    pub fn has_running_fan(&self) -> bool {
        self.devices
            .iter()
            .any(|d| d.kind == DeviceKind::Fan && d.is_on())
    }
}
