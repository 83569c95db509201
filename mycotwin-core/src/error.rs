use thiserror::Error;

#[derive(Debug, Error)]
pub enum MycotwinError {
    #[error("Scenario '{0}' not found in registry")]
    ScenarioNotFound(String),

    #[error("Scenario '{0}' is already registered")]
    DuplicateScenario(String),

    #[error("Room '{room_id}' has non-positive volume {volume_m3} m3")]
    InvalidVolume { room_id: String, volume_m3: f64 },

    #[error("Simulation duration must be positive, got {0} minutes")]
    InvalidDuration(u64),

    #[error("Simulation duration {0} minutes exceeds the {1} minute cap")]
    DurationExceedsCap(u64, u64),

    #[error("Simulation step must be positive, got {0} minutes")]
    InvalidStep(u64),

    #[error("I/O error for file '{0}': {1}")]
    FileIO(String, #[source] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    JsonExport(#[from] serde_json::Error),

    #[error("An error occurred while writing curve data: {0}")]
    LoggingError(#[from] anyhow::Error),
}
