//! Overflow-checked and clipping arithmetic on 64-bit signed integers.
//!
//! Staking powers and proposer priorities are `i64` and adversarial stake
//! distributions can drive sums and products to the edges of the range.
//! Callers choose between the checked forms, which surface overflow, and the
//! clipping forms, which saturate at `i64::MAX`/`i64::MIN`.

/// Checked addition. `None` on overflow.
#[inline]
pub fn safe_add(a: i64, b: i64) -> Option<i64> {
    a.checked_add(b)
}

/// Checked multiplication. `None` on overflow.
#[inline]
pub fn safe_mul(a: i64, b: i64) -> Option<i64> {
    a.checked_mul(b)
}

/// Addition that clips to `i64::MAX`/`i64::MIN` on overflow, according to
/// the operand signs.
#[inline]
pub fn safe_add_clip(a: i64, b: i64) -> i64 {
    a.saturating_add(b)
}

/// Subtraction that clips to `i64::MAX`/`i64::MIN` on overflow.
///
/// `safe_sub_clip(i64::MIN, i64::MIN)` is exactly 0.
#[inline]
pub fn safe_sub_clip(a: i64, b: i64) -> i64 {
    a.saturating_sub(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_safe_add_clip() {
        assert_eq!(safe_add_clip(i64::MAX, 10), i64::MAX);
        assert_eq!(safe_add_clip(i64::MAX, i64::MAX), i64::MAX);
        assert_eq!(safe_add_clip(i64::MIN, -10), i64::MIN);
        assert_eq!(safe_add_clip(1, 2), 3);
    }

    #[test]
    fn test_safe_sub_clip() {
        assert_eq!(safe_sub_clip(i64::MIN, 10), i64::MIN);
        assert_eq!(safe_sub_clip(i64::MIN, i64::MIN), 0);
        assert_eq!(safe_sub_clip(i64::MIN, i64::MAX), i64::MIN);
        assert_eq!(safe_sub_clip(i64::MAX, -10), i64::MAX);
    }

    #[test]
    fn test_safe_mul_edges() {
        assert_eq!(safe_mul(i64::MIN, -1), None);
        assert_eq!(safe_mul(i64::MIN, 1), Some(i64::MIN));
        assert_eq!(safe_mul(i64::MAX, 2), None);
        assert_eq!(safe_mul(i64::MAX / 8, 8), Some(i64::MAX - 7));
    }

    proptest! {
        #[test]
        fn prop_safe_add_exact_or_none(a in any::<i64>(), b in any::<i64>()) {
            match safe_add(a, b) {
                Some(sum) => prop_assert_eq!(sum as i128, a as i128 + b as i128),
                None => {
                    let wide = a as i128 + b as i128;
                    prop_assert!(wide > i64::MAX as i128 || wide < i64::MIN as i128);
                }
            }
        }

        #[test]
        fn prop_clip_variants_bounded(a in any::<i64>(), b in any::<i64>()) {
            let sum = safe_add_clip(a, b) as i128;
            let diff = safe_sub_clip(a, b) as i128;
            let wide_sum = (a as i128 + b as i128)
                .clamp(i64::MIN as i128, i64::MAX as i128);
            let wide_diff = (a as i128 - b as i128)
                .clamp(i64::MIN as i128, i64::MAX as i128);
            prop_assert_eq!(sum, wide_sum);
            prop_assert_eq!(diff, wide_diff);
        }
    }
}
