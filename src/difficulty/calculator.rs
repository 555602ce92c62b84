//! Trait definition for performance calculators and the adapter around them.
//!
//! The pp formula itself lives behind [`PerformanceCalculator`]; this module
//! only fixes the contract: one parsed map and one [`ComputeConfiguration`] in,
//! one pp value out.

use super::accuracy::HitCounts;
use std::fmt::Debug;
use std::path::Path;

/// Error type for performance calculation failures.
#[derive(Debug, Clone, PartialEq)]
pub enum CalcError {
    /// The beatmap file could not be parsed or was rejected.
    InvalidBeatmap(String),
    /// The calculator ran but produced no usable value.
    CalculationFailed(String),
}

impl std::fmt::Display for CalcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalcError::InvalidBeatmap(msg) => write!(f, "Invalid beatmap: {}", msg),
            CalcError::CalculationFailed(msg) => write!(f, "Calculation failed: {}", msg),
        }
    }
}

impl std::error::Error for CalcError {}

/// Everything the calculator needs to score one play.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputeConfiguration {
    /// Combo of the play, already capped at the map's max combo.
    pub combo: u32,
    pub hits: HitCounts,
    /// osu! mod bitset.
    pub mods: u32,
}

/// Result of a calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputeOutcome {
    pub performance_value: f64,
    /// Accuracy represented by the hit counts that were actually scored.
    pub accuracy_percent: f64,
}

/// Trait that all performance calculators must implement.
pub trait PerformanceCalculator: Send + Sync + Debug {
    /// Parsed map, opaque to the rest of the service.
    type Map: Send;
    /// Result of the difficulty pass, fed back into the performance pass.
    type Attributes: Send;

    /// Unique identifier (e.g., "osu").
    fn id(&self) -> &str;

    fn load(&self, path: &Path) -> Result<Self::Map, CalcError>;

    /// Number of scorable objects (the denominator of accuracy).
    fn object_count(&self, map: &Self::Map) -> u32;

    fn difficulty(&self, map: &Self::Map, mods: u32) -> Self::Attributes;

    fn max_combo(&self, attributes: &Self::Attributes) -> u32;

    fn calculate(
        &self,
        attributes: Self::Attributes,
        config: &ComputeConfiguration,
    ) -> Result<f64, CalcError>;
}

/// Runs the calculator once. No retries: any failure is returned as is.
pub fn compute<C: PerformanceCalculator>(
    calculator: &C,
    attributes: C::Attributes,
    config: &ComputeConfiguration,
) -> Result<ComputeOutcome, CalcError> {
    let performance_value = calculator.calculate(attributes, config)?;

    if !performance_value.is_finite() || performance_value < 0.0 {
        return Err(CalcError::CalculationFailed(format!(
            "{} returned {}",
            calculator.id(),
            performance_value
        )));
    }

    Ok(ComputeOutcome {
        performance_value,
        accuracy_percent: config.hits.accuracy_percent(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FixedCalculator(f64);

    impl PerformanceCalculator for FixedCalculator {
        type Map = ();
        type Attributes = ();

        fn id(&self) -> &str {
            "fixed"
        }

        fn load(&self, _path: &Path) -> Result<(), CalcError> {
            Ok(())
        }

        fn object_count(&self, _map: &()) -> u32 {
            4
        }

        fn difficulty(&self, _map: &(), _mods: u32) {}

        fn max_combo(&self, _attributes: &()) -> u32 {
            4
        }

        fn calculate(&self, _attributes: (), _config: &ComputeConfiguration) -> Result<f64, CalcError> {
            Ok(self.0)
        }
    }

    fn config(hits: HitCounts) -> ComputeConfiguration {
        ComputeConfiguration {
            combo: 4,
            hits,
            mods: 0,
        }
    }

    #[test]
    fn test_accuracy_comes_from_hit_counts() {
        let hits = HitCounts {
            n300: 2,
            n100: 1,
            n50: 0,
            misses: 1,
        };
        let outcome = compute(&FixedCalculator(55.0), (), &config(hits)).unwrap();

        assert_eq!(outcome.performance_value, 55.0);
        assert!((outcome.accuracy_percent - 14.0 / 24.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_value_is_rejected() {
        let result = compute(&FixedCalculator(f64::NAN), (), &config(HitCounts::perfect(4)));
        assert!(matches!(result, Err(CalcError::CalculationFailed(_))));
    }
}
