use crate::error::MycotwinError;
use crate::simulation::environment::step_with_actuation;
use mycotwin_schemas::{
    control::{ControlStrategy, LoopConfig},
    environment::EnvironmentalState,
    report::{LoopStability, LoopStabilityReport},
    room::{Device, DeviceKind, Room},
};

const STEP_MINUTES: u64 = 1;

// Tunable law constants; the contract is the classification, energy and
// cycle accounting, not these exact values.
const DEFAULT_KP: f64 = 0.8;
const DEFAULT_KI: f64 = 0.05;
const DEFAULT_KD: f64 = 0.3;
const INTEGRAL_LIMIT: f64 = 5.0;
const MAX_KP: f64 = DEFAULT_KP * 2.0;
const KP_GROWTH: f64 = 1.05;
const GAIN_SHRINK: f64 = 0.5;

/// A device counts as actuating once its commanded intensity crosses this.
const ACTIVE_THRESHOLD: f64 = 0.05;

const SETTLING_CAP_MINUTES: u64 = 30;
const OSCILLATION_CROSSINGS: usize = 3;
const SIGN_FLIP_WINDOW: usize = 10;
const SIGN_FLIPS_FOR_RETUNE: usize = 4;
const SLUGGISH_WINDOW: usize = 5;
const HIGH_CYCLE_RATE_PER_HOUR: f64 = 30.0;

/// Which controlled parameter a device actuates, and in which direction its
/// error is measured. Positive error always means "this device should act".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    /// Heater: positive when the room is colder than target.
    Heating,
    /// Humidifier: positive when the room is drier than target.
    Humidifying,
    /// Scrubber or fan: positive when CO2 sits above target.
    Co2Removal,
}

fn channel_for(kind: DeviceKind) -> Option<Channel> {
    match kind {
        DeviceKind::Heater => Some(Channel::Heating),
        DeviceKind::Humidifier => Some(Channel::Humidifying),
        DeviceKind::Co2Scrubber | DeviceKind::Fan => Some(Channel::Co2Removal),
        DeviceKind::Light | DeviceKind::Sensor => None,
    }
}

/// Per-channel feedback state. One instance per controlled parameter, shared
/// by every device on that channel.
struct ChannelController {
    kp: f64,
    ki: f64,
    kd: f64,
    integral: f64,
    previous_error: f64,
    error_history: Vec<f64>,
}

impl ChannelController {
    fn new() -> Self {
        Self {
            kp: DEFAULT_KP,
            ki: DEFAULT_KI,
            kd: DEFAULT_KD,
            integral: 0.0,
            previous_error: 0.0,
            error_history: Vec::new(),
        }
    }

    /// Maps a normalized error (1.0 = tolerance boundary) to an actuation
    /// intensity in [0, 1].
    fn actuation(&mut self, strategy: ControlStrategy, error: f64) -> f64 {
        let intensity = match strategy {
            ControlStrategy::BangBang => {
                if error > 1.0 {
                    1.0
                } else {
                    0.0
                }
            }
            ControlStrategy::Pid | ControlStrategy::Adaptive => {
                self.integral = (self.integral + error).clamp(-INTEGRAL_LIMIT, INTEGRAL_LIMIT);
                let derivative = error - self.previous_error;
                (self.kp * error + self.ki * self.integral + self.kd * derivative).clamp(0.0, 1.0)
            }
        };

        self.previous_error = error;
        self.error_history.push(error);
        if strategy == ControlStrategy::Adaptive {
            self.retune();
        }
        intensity
    }

    /// Adaptive retuning: damp the gains when the error keeps flipping sign,
    /// push proportional gain up when the error refuses to shrink.
    fn retune(&mut self) {
        let history = &self.error_history;
        if history.len() < SIGN_FLIP_WINDOW {
            return;
        }
        let window = &history[history.len() - SIGN_FLIP_WINDOW..];
        let flips = window
            .windows(2)
            .filter(|pair| pair[0].signum() != pair[1].signum() && pair[0] != 0.0 && pair[1] != 0.0)
            .count();
        if flips >= SIGN_FLIPS_FOR_RETUNE {
            self.kp *= GAIN_SHRINK;
            self.kd *= GAIN_SHRINK;
            return;
        }

        if history.len() >= SLUGGISH_WINDOW + 1 {
            let now = history[history.len() - 1].abs();
            let then = history[history.len() - 1 - SLUGGISH_WINDOW].abs();
            if now >= then && now > 1.0 {
                self.kp = (self.kp * KP_GROWTH).min(MAX_KP);
            }
        }
    }
}

/// Simulates a feedback controller steering the room toward the target and
/// classifies the resulting dynamics. Steps the same physical model as the
/// open-loop projection, at one-minute resolution.
pub fn run_closed_loop(room: &Room, config: &LoopConfig) -> Result<LoopStabilityReport, MycotwinError> {
    if config.duration_minutes == 0 {
        return Err(MycotwinError::InvalidDuration(config.duration_minutes));
    }
    if room.volume_m3 <= 0.0 {
        return Err(MycotwinError::InvalidVolume {
            room_id: room.room_id.clone(),
            volume_m3: room.volume_m3,
        });
    }

    let steps = config.duration_minutes / STEP_MINUTES;
    let step_hours = STEP_MINUTES as f64 / 60.0;

    let mut heating = ChannelController::new();
    let mut humidifying = ChannelController::new();
    let mut co2_removal = ChannelController::new();

    let mut state = room.state.clone();
    state.clamp_to_bounds();

    // Transition counting starts from each device's configured status.
    let mut active: Vec<bool> = room.devices.iter().map(|d| d.is_on()).collect();
    let mut actuation_cycles = 0u32;
    let mut energy_kwh = 0.0;

    let mut deviations = Vec::with_capacity(steps as usize + 1);
    deviations.push(normalized_deviation(&state, config));

    for _ in 0..steps {
        let errors = ChannelErrors::measure(&state, config);

        // One controller update per channel per step; devices sharing a
        // channel receive the same command.
        let heat_command = heating.actuation(config.strategy, errors.heating);
        let humidity_command = humidifying.actuation(config.strategy, errors.humidifying);
        let co2_command = co2_removal.actuation(config.strategy, errors.co2_removal);

        let step_commands: Vec<f64> = room
            .devices
            .iter()
            .map(|device| match channel_for(device.kind) {
                Some(Channel::Heating) => heat_command,
                Some(Channel::Humidifying) => humidity_command,
                Some(Channel::Co2Removal) => co2_command,
                // Lights and sensors are not feedback-driven; they keep
                // their configured status.
                None => {
                    if device.is_on() {
                        1.0
                    } else {
                        0.0
                    }
                }
            })
            .collect();

        for (index, device) in room.devices.iter().enumerate() {
            let intensity = step_commands[index];
            if channel_for(device.kind).is_some() {
                let is_active = intensity > ACTIVE_THRESHOLD;
                if is_active != active[index] {
                    actuation_cycles += 1;
                    active[index] = is_active;
                }
                energy_kwh += device.power_watts * intensity * step_hours / 1000.0;
            } else if device.is_on() {
                energy_kwh += device.power_watts * step_hours / 1000.0;
            }
        }

        let actuation: Vec<(&Device, f64)> = room
            .devices
            .iter()
            .zip(step_commands.iter())
            .map(|(device, intensity)| (device, *intensity))
            .collect();
        state = step_with_actuation(
            &state,
            &actuation,
            room.substrate.as_ref(),
            room.volume_m3,
            STEP_MINUTES,
        );
        deviations.push(normalized_deviation(&state, config));
    }

    let (stability, oscillation_frequency_cph) =
        classify_loop(&deviations, config.duration_minutes);

    let average_deviation = deviations.iter().sum::<f64>() / deviations.len() as f64;
    let max_deviation = deviations.iter().cloned().fold(0.0, f64::max);

    let duration_hours = config.duration_minutes as f64 / 60.0;
    let mut recommendations = Vec::new();
    match stability {
        LoopStability::Oscillating => {
            recommendations.push(
                "Reduce actuator gain or widen the tolerance band to damp oscillation."
                    .to_string(),
            );
        }
        LoopStability::Unstable => {
            recommendations.push(
                "Increase device capacity; the room cannot reach or hold the target."
                    .to_string(),
            );
        }
        LoopStability::Stable => {}
    }
    if actuation_cycles as f64 / duration_hours > HIGH_CYCLE_RATE_PER_HOUR {
        recommendations.push(
            "Actuators are cycling frequently; schedule longer duty periods to reduce wear."
                .to_string(),
        );
    }

    Ok(LoopStabilityReport {
        room_id: room.room_id.clone(),
        duration_minutes: config.duration_minutes,
        stability,
        average_deviation,
        max_deviation,
        actuation_cycles,
        energy_kwh,
        recommendations,
        oscillation_frequency_cph,
    })
}

struct ChannelErrors {
    heating: f64,
    humidifying: f64,
    co2_removal: f64,
}

impl ChannelErrors {
    /// Normalized errors, each positive in the direction its actuator works.
    fn measure(state: &EnvironmentalState, config: &LoopConfig) -> Self {
        Self {
            heating: (config.target.temperature_c - state.temperature_c)
                / config.tolerances.temperature_c,
            humidifying: (config.target.humidity_percent - state.humidity_percent)
                / config.tolerances.humidity_percent,
            co2_removal: (state.co2_ppm - config.target.co2_ppm) / config.tolerances.co2_ppm,
        }
    }
}

fn normalized_deviation(state: &EnvironmentalState, config: &LoopConfig) -> f64 {
    let errors = ChannelErrors::measure(state, config);
    errors
        .heating
        .abs()
        .max(errors.humidifying.abs())
        .max(errors.co2_removal.abs())
}

/// Classifies the post-settling deviation trace. Deviation is normalized, so
/// "within tolerance" is deviation <= 1.0.
fn classify_loop(deviations: &[f64], duration_minutes: u64) -> (LoopStability, Option<f64>) {
    let settling = (duration_minutes / 4).min(SETTLING_CAP_MINUTES) as usize;
    let post = &deviations[settling.min(deviations.len() - 1)..];

    let in_band: Vec<bool> = post.iter().map(|d| *d <= 1.0).collect();
    if !in_band.iter().any(|b| *b) {
        return (LoopStability::Unstable, None);
    }

    let crossings = in_band.windows(2).filter(|pair| pair[0] != pair[1]).count();
    if crossings >= OSCILLATION_CROSSINGS {
        let post_hours = (post.len().saturating_sub(1)) as f64 / 60.0;
        let frequency = if post_hours > 0.0 {
            (crossings as f64 / 2.0) / post_hours
        } else {
            0.0
        };
        return (LoopStability::Oscillating, Some(frequency));
    }

    if let Some(last) = in_band.last() {
        if !last {
            return (LoopStability::Unstable, None);
        }
    }
    (LoopStability::Stable, None)
}
