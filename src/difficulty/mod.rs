//! Performance calculation module.
//!
//! Turns a play description into a [`ComputeConfiguration`] for a concrete map
//! and runs it through a [`PerformanceCalculator`] (rosu-pp in production).

pub mod accuracy;
pub mod builtin;
pub mod calculator;

pub use accuracy::{HitCounts, HitOverrides};
pub use builtin::OsuCalculator;
pub use calculator::{
    CalcError, ComputeConfiguration, ComputeOutcome, PerformanceCalculator, compute,
};

/// Description of the play to score, independent of any map.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Attempt {
    pub mods: u32,
    /// Target accuracy in percent; `None` means a perfect play.
    pub target_accuracy: Option<f64>,
    /// Combo reached; `None` means the map's max combo.
    pub combo: Option<u32>,
    pub overrides: HitOverrides,
    pub misses: u32,
}

/// Builds the calculator input for `attempt` on a map with `total_objects`
/// scorable objects and `max_combo` reachable combo.
pub fn build_configuration(attempt: &Attempt, total_objects: u32, max_combo: u32) -> ComputeConfiguration {
    let reconstructed = accuracy::reconstruct(attempt.target_accuracy, total_objects, attempt.misses);
    let hits = accuracy::apply_overrides(reconstructed, &attempt.overrides, total_objects);

    let combo = attempt
        .combo
        .filter(|c| *c > 0)
        .map_or(max_combo, |c| c.min(max_combo));

    ComputeConfiguration {
        combo,
        hits,
        mods: attempt.mods,
    }
}

/// Loads the map at `path`, scores `attempt` on it and returns the outcome
/// together with the configuration that produced it.
pub fn evaluate_file<C: PerformanceCalculator>(
    calculator: &C,
    path: &std::path::Path,
    attempt: &Attempt,
) -> Result<(ComputeOutcome, ComputeConfiguration), CalcError> {
    let map = calculator.load(path)?;
    let total_objects = calculator.object_count(&map);
    let attributes = calculator.difficulty(&map, attempt.mods);
    let max_combo = calculator.max_combo(&attributes);

    let config = build_configuration(attempt, total_objects, max_combo);
    let outcome = compute(calculator, attributes, &config)?;
    Ok((outcome, config))
}
