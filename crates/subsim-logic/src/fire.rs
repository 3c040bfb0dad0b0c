//! Firefighting numbers.
//!
//! Fires are fought with crew time: an assigned crew member knocks down the
//! fire's intensity while taking heat damage proportional to how strong the
//! fire still is. On harder difficulties unattended fires can jump to other
//! systems.

/// Intensity of a freshly ignited fire.
pub const FIRE_MAX_INTENSITY: f64 = 100.0;

/// Intensity removed per second by a crew member at 1.0 repair speed.
pub const EXTINGUISH_BASE_POWER: f64 = 14.0;

/// Heat damage per second at full intensity, before mitigation.
pub const FIRE_COUNTER_DAMAGE: f64 = 5.0;

/// Fires younger than this never spread.
pub const FIRE_SPREAD_MIN_AGE: f64 = 2.0;

/// Intensity removed this step.
pub fn extinguish_amount(crew_speed_mult: f64, dt: f64) -> f64 {
    EXTINGUISH_BASE_POWER * crew_speed_mult * dt
}

/// Intensity after one step of firefighting; never negative.
pub fn knock_down(intensity: f64, crew_speed_mult: f64, dt: f64) -> f64 {
    (intensity - extinguish_amount(crew_speed_mult, dt)).max(0.0)
}

/// Heat damage taken by the firefighter this step.
pub fn counter_damage(intensity: f64, max_intensity: f64, damage_reduction: f64, dt: f64) -> f64 {
    let fraction = if max_intensity > 0.0 {
        (intensity / max_intensity).clamp(0.0, 1.0)
    } else {
        0.0
    };
    FIRE_COUNTER_DAMAGE * fraction * dt * (1.0 - damage_reduction)
}

/// Chance that a fire of `age` seconds spreads during this step.
///
/// `suppression` is the XO's fire-suppression fraction in `[0, 1)`.
pub fn spread_probability(base_rate: f64, age: f64, dt: f64, suppression: f64) -> f64 {
    if base_rate <= 0.0 || age <= FIRE_SPREAD_MIN_AGE {
        return 0.0;
    }
    (base_rate * dt * (1.0 - suppression.clamp(0.0, 1.0))).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knock_down_never_negative() {
        assert!((knock_down(100.0, 1.0, 1.0) - 86.0).abs() < 1e-9);
        assert_eq!(knock_down(5.0, 2.0, 1.0), 0.0);
    }

    #[test]
    fn test_counter_damage_scales_with_intensity() {
        let full = counter_damage(100.0, 100.0, 0.0, 1.0);
        let half = counter_damage(50.0, 100.0, 0.0, 1.0);
        assert!((full - 5.0).abs() < 1e-9);
        assert!((half - 2.5).abs() < 1e-9);
        assert!((counter_damage(100.0, 100.0, 0.5, 1.0) - 2.5).abs() < 1e-9);
        assert_eq!(counter_damage(0.0, 100.0, 0.0, 1.0), 0.0);
    }

    #[test]
    fn test_spread_probability() {
        assert_eq!(spread_probability(0.0, 10.0, 0.1, 0.0), 0.0);
        assert_eq!(spread_probability(0.05, 1.0, 0.1, 0.0), 0.0);
        assert!((spread_probability(0.05, 3.0, 0.1, 0.0) - 0.005).abs() < 1e-12);
        assert!((spread_probability(0.05, 3.0, 0.1, 0.3) - 0.0035).abs() < 1e-12);
    }
}
