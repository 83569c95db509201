use mycotwin_schemas::{
    environment::EnvironmentalState,
    report::{ContaminationRiskMap, RiskFactors, RiskLevel},
    room::Room,
};

const HIGH_HUMIDITY_THRESHOLD_PERCENT: f64 = 90.0;
const LOW_AIRFLOW_THRESHOLD_CFM: f64 = 50.0;
const STAGNANT_CO2_THRESHOLD_PPM: f64 = 3000.0;
const STAGNANT_AIRFLOW_THRESHOLD_CFM: f64 = 80.0;

/// History shorter than this carries no fluctuation signal.
const MIN_HISTORY_FOR_FLUCTUATION: usize = 10;

const DISCLAIMER: &str = "Assessment is a model-based projection for relative \
comparison between scenarios; it is not a prediction of real-world outcomes.";

/// Scores a room's contamination pressure from its current state and,
/// optionally, its projected trajectory. Fully reproducible from the inputs;
/// no hidden state.
pub fn assess_contamination_risk(
    room: &Room,
    history: Option<&[EnvironmentalState]>,
) -> ContaminationRiskMap {
    let factors = analyze_risk_factors(room, history);
    let score = calculate_risk_score(&factors);
    let risk_level = categorize(score);
    let (recommendations, rationale) = explain(&factors, risk_level);

    ContaminationRiskMap {
        room_id: room.room_id.clone(),
        risk_level,
        score,
        factors,
        recommendations,
        rationale,
    }
}

/// Extracts the raw risk signals. When a trajectory is supplied, flag checks
/// read its final sample (the projected "now"); fluctuation reads the whole
/// trajectory when it is long enough to carry signal.
pub fn analyze_risk_factors(room: &Room, history: Option<&[EnvironmentalState]>) -> RiskFactors {
    let current = history
        .and_then(|samples| samples.last())
        .unwrap_or(&room.state);

    let high_humidity = current.humidity_percent > HIGH_HUMIDITY_THRESHOLD_PERCENT;
    let poor_airflow = !room.has_running_fan() || current.airflow_cfm < LOW_AIRFLOW_THRESHOLD_CFM;
    let stagnant_air = current.co2_ppm > STAGNANT_CO2_THRESHOLD_PPM
        && current.airflow_cfm < STAGNANT_AIRFLOW_THRESHOLD_CFM;

    let temperature_fluctuation_c = match history {
        Some(samples) if samples.len() > MIN_HISTORY_FOR_FLUCTUATION => {
            let max = samples.iter().map(|s| s.temperature_c).fold(f64::MIN, f64::max);
            let min = samples.iter().map(|s| s.temperature_c).fold(f64::MAX, f64::min);
            max - min
        }
        _ => 0.0,
    };

    let mut spore_load: f64 = 0.0;
    if current.humidity_percent > 85.0 {
        spore_load += 20.0;
    }
    if current.temperature_c > 20.0 && current.temperature_c < 28.0 {
        spore_load += 15.0;
    }
    if poor_airflow {
        spore_load += 25.0;
    }
    if temperature_fluctuation_c > 5.0 {
        spore_load += 10.0;
    }
    if room
        .substrate
        .as_ref()
        .map_or(false, |s| s.moisture_percent > 70.0)
    {
        spore_load += 15.0;
    }
    spore_load = spore_load.clamp(0.0, 100.0);

    RiskFactors {
        high_humidity,
        poor_airflow,
        stagnant_air,
        temperature_fluctuation_c,
        spore_load,
    }
}

/// Folds the factors into an integer score in [0, 100].
pub fn calculate_risk_score(factors: &RiskFactors) -> u32 {
    let mut score = 0.0;
    if factors.high_humidity {
        score += 20.0;
    }
    if factors.poor_airflow {
        score += 25.0;
    }
    score += 0.3 * factors.spore_load;
    if factors.stagnant_air {
        score += 15.0;
    }
    score += (2.0 * factors.temperature_fluctuation_c).min(20.0);

    score.round().clamp(0.0, 100.0) as u32
}

fn categorize(score: u32) -> RiskLevel {
    if score >= 70 {
        RiskLevel::High
    } else if score >= 40 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

fn explain(factors: &RiskFactors, risk_level: RiskLevel) -> (Vec<String>, Vec<String>) {
    let mut recommendations = Vec::new();
    let mut rationale = Vec::new();

    if factors.high_humidity {
        rationale.push("Relative humidity is above 90%, favoring mold germination.".to_string());
        recommendations.push("Lower the humidifier setpoint or increase dehumidification.".to_string());
    }
    if factors.poor_airflow {
        rationale.push("Air circulation is inadequate (no running fan or airflow below 50 CFM).".to_string());
        recommendations.push("Run circulation fans continuously or add fan capacity.".to_string());
    }
    if factors.stagnant_air {
        rationale.push("CO2 above 3000 ppm with low airflow indicates stagnant air pockets.".to_string());
        recommendations.push("Increase fresh-air exchange to vent accumulated CO2.".to_string());
    }
    if factors.temperature_fluctuation_c > 5.0 {
        rationale.push(format!(
            "Temperature swung {:.1} C over the projection, stressing the culture.",
            factors.temperature_fluctuation_c
        ));
        recommendations.push("Stabilize heating to reduce temperature swings.".to_string());
    }
    if factors.spore_load >= 50.0 {
        rationale.push(format!(
            "Estimated spore load {:.0}/100 from combined humidity, temperature and airflow conditions.",
            factors.spore_load
        ));
        recommendations.push("Review sanitation schedule and filter maintenance.".to_string());
    }

    if rationale.is_empty() {
        rationale.push("Conditions are favorable; no contamination factors triggered.".to_string());
    }
    if let RiskLevel::High = risk_level {
        recommendations.push("Isolate the room pending inspection of the substrate.".to_string());
    }
    rationale.push(DISCLAIMER.to_string());

    (recommendations, rationale)
}
