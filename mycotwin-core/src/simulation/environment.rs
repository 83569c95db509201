use crate::error::MycotwinError;
use crate::simulation::targets::target_environment;
use mycotwin_schemas::{
    environment::EnvironmentalState,
    report::{EnvironmentalCurve, StabilityClass},
    room::{Device, DeviceKind, Room, Substrate},
};

/// All device effect rates are specified at this reference volume.
pub const REFERENCE_VOLUME_M3: f64 = 50.0;

// Ambient drift, per hour, at the reference volume.
const TEMPERATURE_DRIFT_C_PER_HOUR: f64 = -0.5;
const HUMIDITY_DRIFT_PERCENT_PER_HOUR: f64 = -1.0;
const CO2_DRIFT_PPM_PER_HOUR: f64 = -20.0;

/// A running fan exchanges air: each CFM of fan effect removes this many
/// ppm-equivalents of CO2 per hour on top of its airflow contribution.
const FAN_CO2_EXCHANGE_FACTOR: f64 = 5.0;

const MIN_SAMPLES_FOR_STABILITY: usize = 10;
const TEMPERATURE_DEVIATION_THRESHOLD_C: f64 = 2.0;
const HUMIDITY_DEVIATION_THRESHOLD_PERCENT: f64 = 10.0;
const CO2_DEVIATION_THRESHOLD_PPM: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentParameter {
    Temperature,
    Humidity,
    Co2,
    Airflow,
    Light,
}

/// The per-hour contribution of one active device to one parameter,
/// normalized for room volume. Negative magnitude means removal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceEffect {
    pub parameter: EnvironmentParameter,
    pub magnitude: f64,
}

/// Computes a device's volume-normalized effect. Sensors observe without
/// acting and yield `None`; they still draw power for energy accounting.
pub fn device_effect(device: &Device, volume_m3: f64) -> Option<DeviceEffect> {
    let volume_factor = REFERENCE_VOLUME_M3 / volume_m3;
    match device.kind {
        DeviceKind::Heater => Some(DeviceEffect {
            parameter: EnvironmentParameter::Temperature,
            magnitude: device.effect_rate * volume_factor,
        }),
        DeviceKind::Humidifier => Some(DeviceEffect {
            parameter: EnvironmentParameter::Humidity,
            magnitude: device.effect_rate * volume_factor,
        }),
        DeviceKind::Fan => Some(DeviceEffect {
            parameter: EnvironmentParameter::Airflow,
            magnitude: device.effect_rate,
        }),
        DeviceKind::Co2Scrubber => Some(DeviceEffect {
            parameter: EnvironmentParameter::Co2,
            magnitude: -device.effect_rate * volume_factor,
        }),
        DeviceKind::Light => Some(DeviceEffect {
            parameter: EnvironmentParameter::Light,
            magnitude: device.effect_rate,
        }),
        DeviceKind::Sensor => None,
    }
}

/// Advances one state by one step, with an explicit actuation intensity per
/// device. The open-loop model passes 1.0 for every running device; the
/// closed-loop evaluator passes whatever its control law decided.
pub(crate) fn step_with_actuation(
    state: &EnvironmentalState,
    devices: &[(&Device, f64)],
    substrate: Option<&Substrate>,
    volume_m3: f64,
    step_minutes: u64,
) -> EnvironmentalState {
    let step_hours = step_minutes as f64 / 60.0;
    let mut next = state.clone();
    next.timestamp = state.timestamp + (step_minutes * 60) as i64;

    // Ambient drift, damped in larger rooms.
    let drift_damping = (volume_m3 / REFERENCE_VOLUME_M3).min(2.0);
    next.temperature_c += TEMPERATURE_DRIFT_C_PER_HOUR / drift_damping * step_hours;
    next.humidity_percent += HUMIDITY_DRIFT_PERCENT_PER_HOUR / drift_damping * step_hours;
    next.co2_ppm += CO2_DRIFT_PPM_PER_HOUR / drift_damping * step_hours;

    // Substrate metabolism: a constant background source of heat and CO2.
    if let Some(substrate) = substrate {
        next.temperature_c += substrate.heat_rate_watts / (volume_m3 * 50.0) * step_hours;
        next.co2_ppm += substrate.co2_rate_ppm_per_hour * step_hours;
    }

    for (device, intensity) in devices {
        if *intensity <= 0.0 {
            continue;
        }
        let effect = match device_effect(device, volume_m3) {
            Some(effect) => effect,
            None => continue,
        };
        let delta = effect.magnitude * intensity * step_hours;
        match effect.parameter {
            EnvironmentParameter::Temperature => next.temperature_c += delta,
            EnvironmentParameter::Humidity => next.humidity_percent += delta,
            EnvironmentParameter::Co2 => next.co2_ppm += delta,
            EnvironmentParameter::Airflow => next.airflow_cfm += delta,
            EnvironmentParameter::Light => next.light_lux += delta,
        }
        if device.kind == DeviceKind::Fan {
            next.co2_ppm -= effect.magnitude * intensity * FAN_CO2_EXCHANGE_FACTOR * step_hours;
        }
    }

    next.clamp_to_bounds();
    next.quantize();
    next
}

/// Advances a room's state by one step with every running device at full
/// actuation.
pub fn step_environment(room: &Room, state: &EnvironmentalState, step_minutes: u64) -> EnvironmentalState {
    let actuation: Vec<(&Device, f64)> = room
        .devices
        .iter()
        .map(|d| (d, if d.is_on() { 1.0 } else { 0.0 }))
        .collect();
    step_with_actuation(state, &actuation, room.substrate.as_ref(), room.volume_m3, step_minutes)
}

/// Projects a room's climate forward and classifies the trajectory.
///
/// Produces `floor(duration / step) + 1` samples, inclusive of the initial
/// state, with timestamps advancing `step_minutes` per sample.
pub fn simulate_time_series(
    room: &Room,
    duration_minutes: u64,
    step_minutes: u64,
) -> Result<EnvironmentalCurve, MycotwinError> {
    if duration_minutes == 0 {
        return Err(MycotwinError::InvalidDuration(duration_minutes));
    }
    if step_minutes == 0 {
        return Err(MycotwinError::InvalidStep(step_minutes));
    }
    if room.volume_m3 <= 0.0 {
        return Err(MycotwinError::InvalidVolume {
            room_id: room.room_id.clone(),
            volume_m3: room.volume_m3,
        });
    }

    let steps = duration_minutes / step_minutes;
    let mut samples = Vec::with_capacity(steps as usize + 1);

    let mut current = room.state.clone();
    current.clamp_to_bounds();
    samples.push(current.clone());

    for _ in 0..steps {
        current = step_environment(room, &current, step_minutes);
        samples.push(current.clone());
    }

    let stability = assess_stability(&samples);
    let deviations = detect_deviations(room, &samples);

    Ok(EnvironmentalCurve {
        room_id: room.room_id.clone(),
        started_at: samples.first().map(|s| s.timestamp).unwrap_or_default(),
        ended_at: samples.last().map(|s| s.timestamp).unwrap_or_default(),
        samples,
        stability,
        deviations,
    })
}

fn population_variance(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let count = values.clone().count();
    if count == 0 {
        return 0.0;
    }
    let mean = values.clone().sum::<f64>() / count as f64;
    values.map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64
}

/// Classifies a trajectory from the variance of its temperature and humidity
/// series. Short series carry too little signal and read as stable.
pub fn assess_stability(samples: &[EnvironmentalState]) -> StabilityClass {
    if samples.len() < MIN_SAMPLES_FOR_STABILITY {
        return StabilityClass::Stable;
    }

    let temperature_variance = population_variance(samples.iter().map(|s| s.temperature_c));
    let humidity_variance = population_variance(samples.iter().map(|s| s.humidity_percent));

    if temperature_variance > 4.0 || humidity_variance > 100.0 {
        StabilityClass::Oscillating
    } else if temperature_variance > 2.0 || humidity_variance > 50.0 {
        StabilityClass::Drifting
    } else {
        StabilityClass::Stable
    }
}

/// Compares the curve's mean climate against the room's species/stage target.
/// Rooms without a known target produce no deviations.
pub fn detect_deviations(room: &Room, samples: &[EnvironmentalState]) -> Vec<String> {
    let target = match target_environment(room.species.as_deref(), room.stage.as_deref()) {
        Some(target) => target,
        None => return Vec::new(),
    };
    if samples.is_empty() {
        return Vec::new();
    }

    let count = samples.len() as f64;
    let mean_temperature = samples.iter().map(|s| s.temperature_c).sum::<f64>() / count;
    let mean_humidity = samples.iter().map(|s| s.humidity_percent).sum::<f64>() / count;
    let mean_co2 = samples.iter().map(|s| s.co2_ppm).sum::<f64>() / count;

    let mut deviations = Vec::new();
    if (mean_temperature - target.temperature_c).abs() > TEMPERATURE_DEVIATION_THRESHOLD_C {
        deviations.push(format!(
            "Mean temperature {:.1} C is more than {:.0} C away from the {:.1} C target",
            mean_temperature, TEMPERATURE_DEVIATION_THRESHOLD_C, target.temperature_c
        ));
    }
    if (mean_humidity - target.humidity_percent).abs() > HUMIDITY_DEVIATION_THRESHOLD_PERCENT {
        deviations.push(format!(
            "Mean humidity {:.1} %RH is more than {:.0} %RH away from the {:.1} %RH target",
            mean_humidity, HUMIDITY_DEVIATION_THRESHOLD_PERCENT, target.humidity_percent
        ));
    }
    if (mean_co2 - target.co2_ppm).abs() > CO2_DEVIATION_THRESHOLD_PPM {
        deviations.push(format!(
            "Mean CO2 {:.0} ppm is more than {:.0} ppm away from the {:.0} ppm target",
            mean_co2, CO2_DEVIATION_THRESHOLD_PPM, target.co2_ppm
        ));
    }
    deviations
}

#[cfg(test)]
mod tests {
    use super::*;
    use mycotwin_schemas::room::DeviceStatus;

    fn state(temperature_c: f64, humidity_percent: f64, co2_ppm: f64) -> EnvironmentalState {
        EnvironmentalState {
            temperature_c,
            humidity_percent,
            co2_ppm,
            airflow_cfm: 100.0,
            light_lux: 0.0,
            timestamp: 0,
        }
    }

    fn bare_room() -> Room {
        Room {
            room_id: "ROOM-01".to_string(),
            display_name: "Fruiting Room 1".to_string(),
            species: None,
            stage: None,
            volume_m3: 50.0,
            devices: vec![],
            substrate: None,
            state: state(20.0, 60.0, 800.0),
        }
    }

    fn heater(effect_rate: f64, status: DeviceStatus) -> Device {
        Device {
            device_id: "HEAT-01".to_string(),
            kind: DeviceKind::Heater,
            status,
            power_watts: 1500.0,
            effect_rate,
        }
    }

    #[test]
    fn sample_count_is_floor_plus_one() {
        let room = bare_room();
        let curve = simulate_time_series(&room, 10, 1).unwrap();
        assert_eq!(curve.samples.len(), 11);

        let curve = simulate_time_series(&room, 10, 3).unwrap();
        assert_eq!(curve.samples.len(), 4);
    }

    #[test]
    fn ambient_drift_cools_an_empty_room() {
        // Volume 50, no devices, no substrate: pure drift over 10 minutes.
        let room = bare_room();
        let curve = simulate_time_series(&room, 10, 1).unwrap();

        let last = curve.samples.last().unwrap();
        assert!(last.temperature_c < 20.0);
        assert_eq!(curve.stability, StabilityClass::Stable);
    }

    #[test]
    fn heater_raises_trajectory_over_baseline() {
        let baseline_room = bare_room();
        let baseline = simulate_time_series(&baseline_room, 60, 1).unwrap();

        let mut heated_room = bare_room();
        heated_room.devices.push(heater(0.5, DeviceStatus::On));
        let heated = simulate_time_series(&heated_room, 60, 1).unwrap();

        let baseline_final = baseline.samples.last().unwrap().temperature_c;
        let heated_final = heated.samples.last().unwrap().temperature_c;
        assert!(heated_final > baseline_final);
    }

    #[test]
    fn standby_devices_do_not_act() {
        let mut room = bare_room();
        room.devices.push(heater(5.0, DeviceStatus::Standby));
        let curve = simulate_time_series(&room, 60, 1).unwrap();

        let baseline = simulate_time_series(&bare_room(), 60, 1).unwrap();
        assert_eq!(
            curve.samples.last().unwrap().temperature_c,
            baseline.samples.last().unwrap().temperature_c
        );
    }

    #[test]
    fn bounds_hold_under_aggressive_devices() {
        let mut room = bare_room();
        room.devices.push(heater(100.0, DeviceStatus::On));
        room.devices.push(Device {
            device_id: "HUM-01".to_string(),
            kind: DeviceKind::Humidifier,
            status: DeviceStatus::On,
            power_watts: 300.0,
            effect_rate: 80.0,
        });
        room.substrate = Some(Substrate {
            kind: "straw".to_string(),
            mass_kg: 200.0,
            moisture_percent: 65.0,
            co2_rate_ppm_per_hour: 900.0,
            heat_rate_watts: 5000.0,
        });

        let curve = simulate_time_series(&room, 600, 1).unwrap();
        for sample in &curve.samples {
            assert!(sample.is_within_bounds(), "out of bounds: {:?}", sample);
        }
    }

    #[test]
    fn runs_are_deterministic() {
        let mut room = bare_room();
        room.devices.push(heater(0.8, DeviceStatus::On));
        room.species = Some("oyster".to_string());
        room.stage = Some("fruiting".to_string());

        let first = simulate_time_series(&room, 120, 1).unwrap();
        let second = simulate_time_series(&room, 120, 1).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn scrubber_pulls_co2_down() {
        let mut room = bare_room();
        room.state.co2_ppm = 2000.0;
        room.devices.push(Device {
            device_id: "SCRUB-01".to_string(),
            kind: DeviceKind::Co2Scrubber,
            status: DeviceStatus::On,
            power_watts: 400.0,
            effect_rate: 300.0,
        });

        let curve = simulate_time_series(&room, 60, 1).unwrap();
        assert!(curve.samples.last().unwrap().co2_ppm < 2000.0 - 20.0);
    }

    #[test]
    fn fan_exchanges_air() {
        let mut room = bare_room();
        room.state.co2_ppm = 3000.0;
        room.devices.push(Device {
            device_id: "FAN-01".to_string(),
            kind: DeviceKind::Fan,
            status: DeviceStatus::On,
            power_watts: 120.0,
            effect_rate: 50.0,
        });

        let curve = simulate_time_series(&room, 30, 1).unwrap();
        let last = curve.samples.last().unwrap();
        // Airflow accumulates while CO2 is vented beyond ambient drift.
        assert!(last.airflow_cfm > 100.0);
        assert!(last.co2_ppm < 3000.0 - 10.0);
    }

    #[test]
    fn small_rooms_drift_faster() {
        let mut small = bare_room();
        small.volume_m3 = 10.0;
        let large = bare_room();

        let small_curve = simulate_time_series(&small, 60, 1).unwrap();
        let large_curve = simulate_time_series(&large, 60, 1).unwrap();
        assert!(
            small_curve.samples.last().unwrap().temperature_c
                < large_curve.samples.last().unwrap().temperature_c
        );
    }

    #[test]
    fn stability_never_demotes_with_larger_swings() {
        // Synthesized trajectories with growing swing amplitude must never
        // fall back from oscillating to stable.
        let series = |amplitude: f64| -> Vec<EnvironmentalState> {
            (0..40)
                .map(|i| {
                    let swing = if i % 2 == 0 { amplitude } else { -amplitude };
                    state(20.0 + swing, 60.0, 800.0)
                })
                .collect()
        };

        let rank = |class: StabilityClass| match class {
            StabilityClass::Stable => 0,
            StabilityClass::Drifting => 1,
            StabilityClass::Oscillating => 2,
        };

        let mut previous = 0;
        for amplitude in [0.1, 0.5, 1.0, 1.5, 2.0, 3.0, 5.0] {
            let class = assess_stability(&series(amplitude));
            let current = rank(class);
            assert!(current >= previous, "amplitude {} demoted", amplitude);
            previous = current;
        }
        assert_eq!(previous, 2);
    }

    #[test]
    fn short_series_read_as_stable() {
        let samples: Vec<EnvironmentalState> = (0..9)
            .map(|i| state(if i % 2 == 0 { 10.0 } else { 35.0 }, 60.0, 800.0))
            .collect();
        assert_eq!(assess_stability(&samples), StabilityClass::Stable);
    }

    #[test]
    fn deviations_against_species_target() {
        let mut room = bare_room();
        room.species = Some("oyster".to_string());
        room.stage = Some("fruiting".to_string());
        // Target 18 C / 85 %RH / 1000 ppm; start at 25 C / 60 %RH / 800 ppm.
        room.state.temperature_c = 25.0;

        let curve = simulate_time_series(&room, 10, 1).unwrap();
        assert_eq!(curve.deviations.len(), 2);
        assert!(curve.deviations[0].contains("temperature"));
        assert!(curve.deviations[1].contains("humidity"));
    }

    #[test]
    fn no_target_means_no_deviations() {
        let mut room = bare_room();
        room.state.temperature_c = 39.0;
        let curve = simulate_time_series(&room, 10, 1).unwrap();
        assert!(curve.deviations.is_empty());
    }

    #[test]
    fn invalid_inputs_are_rejected_up_front() {
        let room = bare_room();
        assert!(matches!(
            simulate_time_series(&room, 0, 1),
            Err(MycotwinError::InvalidDuration(0))
        ));
        assert!(matches!(
            simulate_time_series(&room, 10, 0),
            Err(MycotwinError::InvalidStep(0))
        ));

        let mut flat = bare_room();
        flat.volume_m3 = 0.0;
        assert!(matches!(
            simulate_time_series(&flat, 10, 1),
            Err(MycotwinError::InvalidVolume { .. })
        ));
    }
}
