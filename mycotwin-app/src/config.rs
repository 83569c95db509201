use anyhow::{Context, Result};
use mycotwin_core::simulation::builder::RoomBuilder;
use mycotwin_schemas::{
    file_formats::{FacilityFile, ScenarioFile, ScenarioConfig},
    room::Room,
};
use std::{collections::HashMap, fs, path::Path};

/// Loads the facility definition and builds a Room per configured record,
/// keyed by room id.
pub fn load_facility(path: &Path) -> Result<HashMap<String, Room>> {
    println!("Loading facility from '{}'...", path.display());
    let file: FacilityFile = load_yaml(path)?;

    let mut rooms = HashMap::new();
    for config in file.rooms {
        let room = RoomBuilder::from_config(config).build()?;
        rooms.insert(room.room_id.clone(), room);
    }
    println!("Facility loaded: {} rooms.", rooms.len());
    Ok(rooms)
}

pub fn load_scenarios(path: &Path) -> Result<Vec<ScenarioConfig>> {
    println!("Loading scenarios from '{}'...", path.display());
    let file: ScenarioFile = load_yaml(path)?;
    println!("Scenarios loaded: {}.", file.scenarios.len());
    Ok(file.scenarios)
}

fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {:?}", path))?;
    serde_yaml::from_str(&content).with_context(|| format!("Failed to parse YAML from {:?}", path))
}
