//! Aggregate desirability score for a candidate spread.
//!
//! Combines the risk/reward ratio and probability of profit into a single
//! number, then adjusts it for %OTM (multiplicative bonus) and the summed
//! bid/ask spread of both legs (multiplicative penalty). A score of 100
//! would mean roughly 100% RR at 100% POP; in practice anything over 7.5
//! is worth a look.

/// POP at or below this contributes nothing.
const POP_FLOOR: f64 = 40.0;

/// RR below this contributes nothing; it would also put a negative number
/// under the square root.
const RR_FLOOR: f64 = 10.0;

/// Round half away from zero to `places` decimals. Float-domain values
/// only; monetary values round through `Decimal::round_dp`.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Linear POP model: equals 5 at pop = 100.
pub fn pop_component(pop: f64) -> f64 {
    if pop <= 0.0 {
        return 0.0;
    }

    (pop - POP_FLOOR) / 12.0
}

/// Square-root RR model: 20/sqrt(90) scales the curve to equal 20 at
/// rr = 100.
pub fn rr_component(rr: f64) -> f64 {
    if rr < RR_FLOOR {
        0.0
    } else {
        (rr - RR_FLOOR).sqrt() * (20.0 / 90f64.sqrt())
    }
}

/// Composite score, rounded to 2 decimals.
///
/// `total_spread` is the short leg's bid/ask spread plus the long leg's; a
/// summed spread >= 1.0 drives the score negative, which the acceptance
/// filter then drops.
pub fn score(rr: f64, pop: f64, percent_otm: f64, total_spread: f64) -> f64 {
    let mut score = rr_component(rr) * pop_component(pop);

    // %OTM is a bonus on the score itself: 25 at 10% OTM becomes 27.5
    score += score * (percent_otm / 100.0);

    score -= score * total_spread;

    round_to(score, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_component_floor_and_ceiling() {
        assert_eq!(pop_component(0.0), 0.0);
        assert_eq!(pop_component(-5.0), 0.0);
        assert_eq!(pop_component(40.0), 0.0);
        assert_eq!(pop_component(100.0), 5.0);
        assert_eq!(pop_component(70.0), 2.5);
    }

    #[test]
    fn test_rr_component_floor_and_ceiling() {
        assert_eq!(rr_component(9.99), 0.0);
        assert_eq!(rr_component(-1.0), 0.0);
        assert_eq!(rr_component(10.0), 0.0);
        assert!((rr_component(100.0) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_monotone_in_pop_and_rr() {
        let mut last = 0.0;
        for pop in [45.0, 55.0, 65.0, 75.0, 85.0, 95.0] {
            let s = score(50.0, pop, 0.0, 0.0);
            assert!(s >= last, "score fell from {last} to {s} at pop={pop}");
            last = s;
        }

        last = 0.0;
        for rr in [15.0, 25.0, 45.0, 65.0, 85.0] {
            let s = score(rr, 80.0, 0.0, 0.0);
            assert!(s >= last, "score fell from {last} to {s} at rr={rr}");
            last = s;
        }
    }

    #[test]
    fn test_otm_bonus_is_multiplicative() {
        let base = score(100.0, 100.0, 0.0, 0.0);
        assert_eq!(base, 100.0);
        assert_eq!(score(100.0, 100.0, 10.0, 0.0), 110.0);
    }

    #[test]
    fn test_wide_spread_zeroes_the_score() {
        let tight = score(100.0, 100.0, 0.0, 0.02);
        assert_eq!(tight, 98.0);
        assert_eq!(score(100.0, 100.0, 0.0, 1.0), 0.0);
        assert!(score(100.0, 100.0, 0.0, 1.2) < 0.0);
    }

    #[test]
    fn test_round_to_half_away_from_zero() {
        assert_eq!(round_to(1.25, 1), 1.3);
        assert_eq!(round_to(-1.25, 1), -1.3);
        assert_eq!(round_to(2.5, 0), 3.0);
    }
}
