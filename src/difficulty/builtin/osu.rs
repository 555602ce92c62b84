//! osu! performance calculator using rosu-pp.

use crate::difficulty::{CalcError, ComputeConfiguration, PerformanceCalculator};
use std::path::Path;

/// osu! performance calculator using rosu-pp.
#[derive(Debug, Clone, Default)]
pub struct OsuCalculator;

impl OsuCalculator {
    pub fn new() -> Self {
        Self
    }
}

impl PerformanceCalculator for OsuCalculator {
    type Map = rosu_pp::Beatmap;
    type Attributes = rosu_pp::any::DifficultyAttributes;

    fn id(&self) -> &str {
        "osu"
    }

    fn load(&self, path: &Path) -> Result<rosu_pp::Beatmap, CalcError> {
        let map = rosu_pp::Beatmap::from_path(path)
            .map_err(|e| CalcError::InvalidBeatmap(format!("{}: {}", path.display(), e)))?;

        // Maps built to stall the calculator are refused outright.
        map.check_suspicion()
            .map_err(|e| CalcError::InvalidBeatmap(format!("{:?}", e)))?;

        Ok(map)
    }

    fn object_count(&self, map: &rosu_pp::Beatmap) -> u32 {
        map.hit_objects.len() as u32
    }

    fn difficulty(&self, map: &rosu_pp::Beatmap, mods: u32) -> rosu_pp::any::DifficultyAttributes {
        rosu_pp::Difficulty::new().mods(mods).calculate(map)
    }

    fn max_combo(&self, attributes: &rosu_pp::any::DifficultyAttributes) -> u32 {
        attributes.max_combo()
    }

    fn calculate(
        &self,
        attributes: rosu_pp::any::DifficultyAttributes,
        config: &ComputeConfiguration,
    ) -> Result<f64, CalcError> {
        // Reuses the difficulty pass instead of recomputing it from the map.
        let attrs = rosu_pp::Performance::new(attributes)
            .mods(config.mods)
            .combo(config.combo)
            .n300(config.hits.n300)
            .n100(config.hits.n100)
            .n50(config.hits.n50)
            .misses(config.hits.misses)
            .calculate();

        Ok(attrs.pp())
    }
}
