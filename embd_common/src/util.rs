//! Small numeric helpers.

/// Linearly rescale `x` from `[in_min, in_max]` to `[out_min, out_max]`.
///
/// Integer arithmetic, truncating toward zero, so `map(90, 0, 180, 1000, 2000)`
/// is `1500`. A degenerate input range returns `out_min`. Intermediate math
/// is done in `i128`; results outside `i64` saturate.
pub fn map(x: i64, in_min: i64, in_max: i64, out_min: i64, out_max: i64) -> i64 {
    if in_max == in_min {
        return out_min;
    }
    let span = i128::from(out_max) - i128::from(out_min);
    let scaled = (i128::from(x) - i128::from(in_min)).saturating_mul(span)
        / (i128::from(in_max) - i128::from(in_min));
    let value = scaled.saturating_add(i128::from(out_min));
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescales_servo_angle_to_pulse_width() {
        assert_eq!(map(90, 0, 180, 1000, 2000), 1500);
    }

    #[test]
    fn endpoints_map_to_endpoints() {
        assert_eq!(map(10, 10, 15, 10, 20), 10);
        assert_eq!(map(15, 10, 15, 10, 20), 20);
    }

    #[test]
    fn byte_to_duty_cycle() {
        assert_eq!(map(0, 0, 255, 0, 500_000), 0);
        assert_eq!(map(255, 0, 255, 0, 500_000), 500_000);
        assert_eq!(map(51, 0, 255, 0, 500_000), 100_000);
    }

    #[test]
    fn extreme_inputs_do_not_overflow() {
        assert_eq!(map(i64::MAX, 0, i64::MAX, 0, i64::MAX), i64::MAX);
        assert_eq!(map(i64::MAX, i64::MIN, i64::MAX, 0, 10), 10);
        assert_eq!(map(i64::MIN, i64::MIN, i64::MAX, 0, 10), 0);
        assert_eq!(map(i64::MAX, 0, 1, 0, i64::MAX), i64::MAX);
        assert_eq!(map(i64::MIN, 0, 1, 0, i64::MAX), i64::MIN);
    }

    #[test]
    fn degenerate_range() {
        assert_eq!(map(3, 5, 5, 7, 9), 7);
    }
}
