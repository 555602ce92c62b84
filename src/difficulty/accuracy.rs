//! Hit-count reconstruction from a target accuracy.
//!
//! osu! accuracy weighs a 300 as 6 units, a 100 as 2 units and a 50 as 1 unit
//! (out of 6 per object). The search below works in those units so every
//! candidate is an exact integer sum.

/// Distribution of judgements over every scorable object of a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HitCounts {
    pub n300: u32,
    pub n100: u32,
    pub n50: u32,
    pub misses: u32,
}

impl HitCounts {
    /// Every object hit as a 300.
    pub fn perfect(total_objects: u32) -> Self {
        Self {
            n300: total_objects,
            ..Self::default()
        }
    }

    pub fn total(&self) -> u64 {
        self.n300 as u64 + self.n100 as u64 + self.n50 as u64 + self.misses as u64
    }

    /// Accuracy in percent (0..=100). A map without objects reports 0.
    pub fn accuracy_percent(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let points = 6 * self.n300 as u64 + 2 * self.n100 as u64 + self.n50 as u64;
        points as f64 / (6 * total) as f64 * 100.0
    }
}

/// Caller supplied judgement counts. `None` and `Some(0)` both mean "not supplied".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HitOverrides {
    pub n300: Option<u32>,
    pub n100: Option<u32>,
    pub n50: Option<u32>,
}

impl HitOverrides {
    fn get(value: Option<u32>) -> Option<u32> {
        value.filter(|v| *v > 0)
    }
}

/// Builds a distribution over `total_objects` that approximates `target_accuracy`.
///
/// - No target (or a target of zero) yields a perfect distribution.
/// - Misses are taken out of the pool first. When misses are present the
///   remaining objects are always searched against a 100% target, whatever
///   accuracy the caller asked for.
/// - Among equally close candidates the one with the most 300s wins, then the
///   one with the most 100s.
pub fn reconstruct(target_accuracy: Option<f64>, total_objects: u32, misses: u32) -> HitCounts {
    let misses = misses.min(total_objects);
    let pool = total_objects - misses;

    let target = match target_accuracy {
        _ if misses > 0 => 100.0,
        Some(acc) if acc > 0.0 && acc.is_finite() => acc.min(100.0),
        _ => 100.0,
    };

    let mut counts = if target >= 100.0 {
        HitCounts::perfect(pool)
    } else {
        search(target / 100.0, pool)
    };
    counts.misses = misses;
    counts
}

/// Closest (n300, n100, n50) split of `pool` objects for accuracy `ratio` (0..1).
fn search(ratio: f64, pool: u32) -> HitCounts {
    let n = pool as i64;
    let wanted = ratio * 6.0 * n as f64;

    let mut best: Option<(f64, HitCounts)> = None;

    for n300 in (0..=n).rev() {
        let rest = n - n300;
        // points = 6*n300 + 2*n100 + n50 = 6*n300 + rest + n100
        let n100 = (wanted - (6 * n300 + rest) as f64).round().clamp(0.0, rest as f64) as i64;
        let points = 6 * n300 + rest + n100;
        let error = (points as f64 - wanted).abs();

        if best.as_ref().is_none_or(|(best_error, _)| error < *best_error) {
            best = Some((
                error,
                HitCounts {
                    n300: n300 as u32,
                    n100: n100 as u32,
                    n50: (rest - n100) as u32,
                    misses: 0,
                },
            ));
        }

        // Fewer 300s can only lower the reachable maximum from here on.
        if ((4 * n300 + 2 * n) as f64) < wanted {
            break;
        }
    }

    best.map(|(_, counts)| counts).unwrap_or_default()
}

/// Applies caller overrides on top of a reconstructed distribution.
///
/// Non-zero overrides always win. The tiers that were not overridden absorb
/// the difference so the distribution keeps summing to `total_objects`:
/// a surplus goes to the best free tier, a deficit is taken from the worst
/// free tier first. When every tier is overridden the caller's numbers are
/// used as they are.
///
/// Overrides never exceed the objects left after misses: they are clamped in
/// 300, 100, 50 order.
pub fn apply_overrides(counts: HitCounts, overrides: &HitOverrides, total_objects: u32) -> HitCounts {
    let target = total_objects.saturating_sub(counts.misses) as i64;

    let mut room = target;
    let mut tiers = [
        (counts.n300, HitOverrides::get(overrides.n300)),
        (counts.n100, HitOverrides::get(overrides.n100)),
        (counts.n50, HitOverrides::get(overrides.n50)),
    ]
    .map(|(value, forced)| match forced {
        Some(forced) => {
            let kept = (forced as i64).min(room);
            room -= kept;
            (kept, true)
        }
        None => (value as i64, false),
    });

    let mut diff = target - tiers.iter().map(|(value, _)| value).sum::<i64>();

    if diff > 0 {
        if let Some(tier) = tiers.iter_mut().find(|(_, forced)| !forced) {
            tier.0 += diff;
        }
    } else {
        for tier in tiers.iter_mut().rev().filter(|(_, forced)| !forced) {
            if diff == 0 {
                break;
            }
            let taken = tier.0.min(-diff);
            tier.0 -= taken;
            diff += taken;
        }
    }

    HitCounts {
        n300: tiers[0].0 as u32,
        n100: tiers[1].0 as u32,
        n50: tiers[2].0 as u32,
        misses: counts.misses,
    }
}
