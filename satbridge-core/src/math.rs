//! Checked monetary arithmetic.
//!
//! All monetary math in the peg is `u128` with checked operations; division
//! is floor. Fee computations round in the protocol's favor, slashing
//! payouts in the user's.

use crate::error::{CoreError, Result};

/// Floor of `a * b / den` with overflow and zero-divisor checks.
///
/// `what` names the call site for the error message.
pub fn mul_div(a: u128, b: u128, den: u128, what: &'static str) -> Result<u128> {
    if den == 0 {
        return Err(CoreError::DivisionByZero(what));
    }
    let product = a.checked_mul(b).ok_or(CoreError::Overflow(what))?;
    Ok(product / den)
}

/// Checked addition.
pub fn add(a: u128, b: u128, what: &'static str) -> Result<u128> {
    a.checked_add(b).ok_or(CoreError::Overflow(what))
}

/// Checked subtraction.
pub fn sub(a: u128, b: u128, what: &'static str) -> Result<u128> {
    a.checked_sub(b).ok_or(CoreError::Overflow(what))
}

/// Convert an amount between decimal precisions (floor on downscale).
pub fn rescale(amount: u128, from_decimals: u8, to_decimals: u8, what: &'static str) -> Result<u128> {
    if from_decimals == to_decimals {
        return Ok(amount);
    }
    if to_decimals > from_decimals {
        let factor = 10u128
            .checked_pow((to_decimals - from_decimals) as u32)
            .ok_or(CoreError::Overflow(what))?;
        amount.checked_mul(factor).ok_or(CoreError::Overflow(what))
    } else {
        let factor = 10u128
            .checked_pow((from_decimals - to_decimals) as u32)
            .ok_or(CoreError::Overflow(what))?;
        Ok(amount / factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mul_div_floor() {
        assert_eq!(mul_div(10, 3, 4, "t").unwrap(), 7);
        assert_eq!(mul_div(100_000_000, 50, 10_000, "t").unwrap(), 500_000);
    }

    #[test]
    fn test_mul_div_zero_denominator() {
        assert!(matches!(
            mul_div(1, 1, 0, "t"),
            Err(CoreError::DivisionByZero("t"))
        ));
    }

    #[test]
    fn test_mul_div_overflow() {
        assert!(matches!(
            mul_div(u128::MAX, 2, 1, "t"),
            Err(CoreError::Overflow("t"))
        ));
    }

    #[test]
    fn test_sub_underflow() {
        assert!(sub(1, 2, "t").is_err());
    }

    #[test]
    fn test_rescale() {
        // 8 -> 18 decimals and back
        assert_eq!(rescale(1, 8, 18, "t").unwrap(), 10_000_000_000);
        assert_eq!(rescale(10_000_000_000, 18, 8, "t").unwrap(), 1);
        // floor on downscale
        assert_eq!(rescale(19_999_999_999, 18, 8, "t").unwrap(), 1);
        assert_eq!(rescale(42, 8, 8, "t").unwrap(), 42);
    }

    proptest! {
        #[test]
        fn prop_mul_div_bounded(a in 0u128..1u128 << 100, bps in 0u128..=10_000u128) {
            // A basis-points fee never exceeds the amount it is taken from.
            let fee = mul_div(a, bps, 10_000, "prop").unwrap();
            prop_assert!(fee <= a);
        }

        #[test]
        fn prop_rescale_roundtrip_floor(a in 0u128..1u128 << 90) {
            // Upscaling then downscaling is the identity.
            let up = rescale(a, 8, 18, "prop").unwrap();
            prop_assert_eq!(rescale(up, 18, 8, "prop").unwrap(), a);
        }
    }
}
