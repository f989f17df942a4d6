//! Checked 128-bit fixed-point helpers.
//!
//! All monetary quantities are i128 stroops (scale 1e7); rates share the
//! same scale and basis points use 1e4. Every multiply is checked and
//! every divide floors, so callers surface `ArithmeticOverflow` /
//! `DivisionByZero` instead of trapping.

use crate::error::Error;

/// `a + b` with overflow detection.
pub fn add(a: i128, b: i128) -> Result<i128, Error> {
    a.checked_add(b).ok_or(Error::ArithmeticOverflow)
}

/// `a - b` with underflow detection.
pub fn sub(a: i128, b: i128) -> Result<i128, Error> {
    a.checked_sub(b).ok_or(Error::ArithmeticOverflow)
}

/// `a * b / denom` with a checked multiply and floored division.
pub fn mul_div_floor(a: i128, b: i128, denom: i128) -> Result<i128, Error> {
    if denom == 0 {
        return Err(Error::DivisionByZero);
    }
    let product = a.checked_mul(b).ok_or(Error::ArithmeticOverflow)?;
    Ok(product / denom)
}

/// Integer square root using Newton's method.
pub fn isqrt(n: i128) -> i128 {
    if n <= 0 {
        return 0;
    }
    let mut x = n;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_floor_floors() {
        // 7 * 3 / 2 = 10.5 -> 10
        assert_eq!(mul_div_floor(7, 3, 2), Ok(10));
    }

    #[test]
    fn test_mul_div_floor_division_by_zero() {
        assert_eq!(mul_div_floor(1, 1, 0), Err(Error::DivisionByZero));
    }

    #[test]
    fn test_mul_div_floor_overflow() {
        assert_eq!(
            mul_div_floor(i128::MAX, 2, 1),
            Err(Error::ArithmeticOverflow)
        );
    }

    #[test]
    fn test_add_overflow() {
        assert_eq!(add(i128::MAX, 1), Err(Error::ArithmeticOverflow));
        assert_eq!(add(1, 2), Ok(3));
    }

    #[test]
    fn test_sub_underflow() {
        assert_eq!(sub(i128::MIN, 1), Err(Error::ArithmeticOverflow));
        assert_eq!(sub(5, 2), Ok(3));
    }

    #[test]
    fn test_isqrt() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(1), 1);
        assert_eq!(isqrt(4), 2);
        assert_eq!(isqrt(15), 3);
        assert_eq!(isqrt(16), 4);
        assert_eq!(isqrt(1_000_000_000_000), 1_000_000);
    }

    #[test]
    fn test_isqrt_negative_is_zero() {
        assert_eq!(isqrt(-4), 0);
    }
}
