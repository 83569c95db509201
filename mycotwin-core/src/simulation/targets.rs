use mycotwin_schemas::environment::TargetEnvironment;

/// Looks up the climate setpoints for a species at a growth stage.
///
/// This table is data, not logic; it must stay in sync with the species
/// catalogue the surrounding application ships. An unset or unknown species
/// or stage yields `None`, which downstream code treats as "no deviation
/// checking applies", not as an error.
pub fn target_environment(species: Option<&str>, stage: Option<&str>) -> Option<TargetEnvironment> {
    let species = species?;
    let stage = stage?;

    let target = |temperature_c: f64, humidity_percent: f64, co2_ppm: f64| TargetEnvironment {
        temperature_c,
        humidity_percent,
        co2_ppm,
    };

    match (species, stage) {
        ("oyster", "colonization") => Some(target(24.0, 90.0, 5000.0)),
        ("oyster", "pinning") => Some(target(20.0, 95.0, 800.0)),
        ("oyster", "fruiting") => Some(target(18.0, 85.0, 1000.0)),
        ("shiitake", "colonization") => Some(target(22.0, 80.0, 4000.0)),
        ("shiitake", "fruiting") => Some(target(16.0, 85.0, 1000.0)),
        ("lions_mane", "colonization") => Some(target(22.0, 85.0, 5000.0)),
        ("lions_mane", "fruiting") => Some(target(18.0, 90.0, 800.0)),
        ("button", "colonization") => Some(target(24.0, 90.0, 5000.0)),
        ("button", "fruiting") => Some(target(17.0, 85.0, 1200.0)),
        _ => None,
    }
}
