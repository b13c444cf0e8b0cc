//! Volume-tiered `HGCParams` defaults.
//!
//! Three bands, matching the `< 5000, < 50000, >= 50000` volume hint
//! named for `volume` in the external-interface config table. Larger
//! expected sample volumes get proportionally larger batch budgets and a
//! slightly wider hysteresis band, so dense deployments don't thrash
//! between over-small and over-large batches near the budget boundary. The
//! `>= 50000` (largest) band uses the bare field defaults named for
//! `baseRes`, `minRes`, `hysteresisNear`, `hysteresisFar` in that same
//! table.
use geobatch_types::HGCParams;

/// Picks a tier by `volume` (expected samples per epoch): `< 5000`,
/// `< 50000`, or `>= 50000`.
pub fn tier_defaults(volume: u64) -> HGCParams {
    let (base_res, min_res, max_leaves, max_samples, near, far): (u8, u8, u32, u32, f64, f64) =
        if volume < 5_000 {
            (8, 0, 32, 1_000, 0.85, 1.15)
        } else if volume < 50_000 {
            (8, 0, 128, 10_000, 0.9, 1.1)
        } else {
            (8, 0, 512, 100_000, 0.9, 1.1)
        };

    HGCParams {
        base_res,
        min_res,
        max_leaves_per_batch: max_leaves,
        max_samples_per_batch: max_samples,
        hysteresis_near: near,
        hysteresis_far: far,
        volume,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn larger_volume_gets_larger_budget() {
        let small = tier_defaults(500);
        let large = tier_defaults(10_000_000);
        assert!(large.max_leaves_per_batch > small.max_leaves_per_batch);
        assert!(large.max_samples_per_batch > small.max_samples_per_batch);
    }

    #[test]
    fn largest_tier_uses_documented_field_defaults() {
        let tier = tier_defaults(50_000);
        assert_eq!(tier.base_res, 8);
        assert_eq!(tier.min_res, 0);
        assert_eq!(tier.hysteresis_near, 0.9);
        assert_eq!(tier.hysteresis_far, 1.1);
    }

    #[test]
    fn every_tier_validates() {
        for volume in [0, 4_999, 5_000, 49_999, 50_000, 5_000_000, 50_000_000] {
            assert!(tier_defaults(volume).validate().is_ok());
        }
    }
}
