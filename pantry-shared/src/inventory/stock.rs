//! Stock status evaluation
//!
//! An item is *low on stock* when its low-stock alert is enabled, it has a
//! `min_quantity`, and the quantity on hand is at or below it. It is *out of
//! stock* under the same rule applied to `out_of_stock_threshold` and the
//! out-of-stock alert flag. A missing quantity counts as zero.
//!
//! # Example
//!
//! ```
//! use pantry_shared::inventory::StockLevels;
//! use rust_decimal::Decimal;
//!
//! let levels = StockLevels {
//!     quantity: Some(Decimal::new(2, 0)),
//!     min_quantity: Some(Decimal::new(5, 0)),
//!     out_of_stock_threshold: Some(Decimal::ZERO),
//!     low_stock_alert_enabled: true,
//!     out_of_stock_alert_enabled: true,
//! };
//!
//! let status = levels.status();
//! assert!(status.low_stock);
//! assert!(!status.out_of_stock);
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The stock-related columns of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StockLevels {
    pub quantity: Option<Decimal>,
    pub min_quantity: Option<Decimal>,
    pub out_of_stock_threshold: Option<Decimal>,
    pub low_stock_alert_enabled: bool,
    pub out_of_stock_alert_enabled: bool,
}

/// Derived flags, recomputed on every read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StockStatus {
    pub low_stock: bool,
    pub out_of_stock: bool,
}

impl StockLevels {
    /// Quantity on hand, zero when unset
    pub fn on_hand(&self) -> Decimal {
        self.quantity.unwrap_or(Decimal::ZERO)
    }

    pub fn is_low_stock(&self) -> bool {
        if !self.low_stock_alert_enabled {
            return false;
        }
        match self.min_quantity {
            Some(min) => self.on_hand() <= min,
            None => false,
        }
    }

    pub fn is_out_of_stock(&self) -> bool {
        if !self.out_of_stock_alert_enabled {
            return false;
        }
        match self.out_of_stock_threshold {
            Some(threshold) => self.on_hand() <= threshold,
            None => false,
        }
    }

    pub fn status(&self) -> StockStatus {
        StockStatus {
            low_stock: self.is_low_stock(),
            out_of_stock: self.is_out_of_stock(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: i64) -> Option<Decimal> {
        Some(Decimal::new(value, 0))
    }

    fn levels(quantity: Option<Decimal>) -> StockLevels {
        StockLevels {
            quantity,
            min_quantity: dec(5),
            out_of_stock_threshold: dec(0),
            low_stock_alert_enabled: true,
            out_of_stock_alert_enabled: true,
        }
    }

    #[test]
    fn test_low_stock_at_or_below_minimum() {
        assert!(levels(dec(5)).is_low_stock());
        assert!(levels(dec(3)).is_low_stock());
        assert!(!levels(Some(Decimal::new(501, 2))).is_low_stock());
    }

    #[test]
    fn test_low_stock_disabled_flag() {
        let mut levels = levels(dec(1));
        levels.low_stock_alert_enabled = false;
        assert!(!levels.is_low_stock());
    }

    #[test]
    fn test_low_stock_without_minimum() {
        let mut levels = levels(dec(0));
        levels.min_quantity = None;
        assert!(!levels.is_low_stock());
    }

    #[test]
    fn test_out_of_stock_threshold() {
        assert!(levels(dec(0)).is_out_of_stock());
        assert!(!levels(dec(1)).is_out_of_stock());

        let mut levels = levels(dec(0));
        levels.out_of_stock_alert_enabled = false;
        assert!(!levels.is_out_of_stock());

        levels.out_of_stock_alert_enabled = true;
        levels.out_of_stock_threshold = None;
        assert!(!levels.is_out_of_stock());
    }

    #[test]
    fn test_missing_quantity_counts_as_zero() {
        let status = levels(None).status();
        assert_eq!(
            status,
            StockStatus {
                low_stock: true,
                out_of_stock: true,
            }
        );
    }

    #[test]
    fn test_default_levels_raise_nothing() {
        assert_eq!(StockLevels::default().status(), StockStatus::default());
    }
}
