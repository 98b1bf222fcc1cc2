//! Purchase line totals
//!
//! Quantities and unit prices are stored with two decimal places. Both are
//! rounded to that scale first, then multiplied exactly; the product has at
//! most four decimal places and is stored in a `NUMERIC(20, 4)` column, wide
//! enough for the product of two `NUMERIC(10, 2)` values.

use rust_decimal::Decimal;

/// Decimal places kept for quantities and prices
pub const PRICE_SCALE: u32 = 2;

/// Exclusive upper bound of the `NUMERIC(20, 4)` total column
pub const TOTAL_LIMIT: i64 = 10_000_000_000_000_000;

/// Rounds a value to [`PRICE_SCALE`] using banker's rounding
pub fn normalize(value: Decimal) -> Decimal {
    value.round_dp(PRICE_SCALE)
}

/// Computes `quantity × unit_price` after normalizing both operands
///
/// Returns `None` only if the multiplication overflows `Decimal`.
///
/// ```
/// use pantry_shared::inventory::pricing::line_total;
/// use rust_decimal::Decimal;
///
/// let total = line_total(Decimal::new(3, 0), Decimal::new(250, 2)).unwrap();
/// assert_eq!(total, Decimal::new(750, 2));
/// ```
pub fn line_total(quantity: Decimal, unit_price: Decimal) -> Option<Decimal> {
    normalize(quantity).checked_mul(normalize(unit_price))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total_is_exact() {
        // 1.25 × 0.33 = 0.4125, kept at four places
        let total = line_total(Decimal::new(125, 2), Decimal::new(33, 2)).unwrap();
        assert_eq!(total, Decimal::new(4125, 4));
    }

    #[test]
    fn test_inputs_are_normalized_first() {
        // 2.005 rounds to 2.00 (banker's rounding), 1.999 to 2.00
        let total = line_total(Decimal::new(2005, 3), Decimal::new(1999, 3)).unwrap();
        assert_eq!(total, Decimal::new(4, 0));
    }

    #[test]
    fn test_zero_price() {
        let total = line_total(Decimal::new(7, 0), Decimal::ZERO).unwrap();
        assert!(total.is_zero());
    }

    #[test]
    fn test_largest_line_fits_total_column() {
        let max = Decimal::new(9_999_999_999, 2);
        let total = line_total(max, max).unwrap();
        assert_eq!(total, "9999999998000000.0001".parse::<Decimal>().unwrap());
        assert!(total < Decimal::from(TOTAL_LIMIT));

        let large = line_total(Decimal::new(100_000, 0), Decimal::new(100_000, 0)).unwrap();
        assert_eq!(large, Decimal::new(10_000_000_000, 0));
    }

    #[test]
    fn test_overflow_is_none() {
        assert!(line_total(Decimal::MAX, Decimal::new(2, 0)).is_none());
    }
}
