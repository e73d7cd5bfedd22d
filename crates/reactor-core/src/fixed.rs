use fixed::types::{I32F32, I64F64};

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Convert an f64 to Fixed64. Use only for initialization, never per tick.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::saturating_from_num(v)
}

/// Multiply a quantity by a fixed-point factor and round up.
///
/// Computed in Q64.64 so every `u32` amount is exact. Saturates at
/// `u32::MAX` and never returns a negative quantity.
pub fn scale_ceil(amount: u32, factor: Fixed64) -> u32 {
    I64F64::from_num(amount)
        .saturating_mul(I64F64::from_num(factor))
        .saturating_ceil()
        .saturating_to_num::<u32>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headroom_rounds_up() {
        let headroom = f64_to_fixed64(1.2);
        assert_eq!(scale_ceil(5000, headroom), 6000);
        assert_eq!(scale_ceil(1000, headroom), 1200);
        assert_eq!(scale_ceil(7, headroom), 9);
        assert_eq!(scale_ceil(0, headroom), 0);
    }

    #[test]
    fn unit_factor_is_identity() {
        let one = f64_to_fixed64(1.0);
        assert_eq!(scale_ceil(1234, one), 1234);
    }

    #[test]
    fn amounts_past_i32_range_scale() {
        let headroom = f64_to_fixed64(1.2);
        assert_eq!(scale_ceil(2_000_000_000, headroom), 2_400_000_000);
        assert_eq!(scale_ceil(3_000_000_000, f64_to_fixed64(1.0)), 3_000_000_000);
    }

    #[test]
    fn huge_amounts_saturate_at_u32_max() {
        let headroom = f64_to_fixed64(1.2);
        assert_eq!(scale_ceil(u32::MAX, headroom), u32::MAX);
    }

    #[test]
    fn negative_factor_clamps_to_zero() {
        assert_eq!(scale_ceil(100, f64_to_fixed64(-2.0)), 0);
    }
}
