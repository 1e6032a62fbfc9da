//! # Recipe Quantity Module
//!
//! Provides the `RecipeQty` type for ingredient demand math.
//!
//! ## Why Integer Milli-Units?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FRACTIONAL RECIPE PROBLEM                                          │
//! │                                                                         │
//! │  A burger needs 0.25 lb of ground beef. Stored as a float:             │
//! │    0.25 × 3 = 0.7500000000000001?  Rounding becomes a guessing game.   │
//! │                                                                         │
//! │  OUR SOLUTION: thousandths of a stock unit (same idea as integer       │
//! │  cents for money)                                                      │
//! │    0.25 lb/burger  →  250 milli-units                                  │
//! │    250 × 3 = 750   →  ceil(750 / 1000) = 1 whole lb deducted           │
//! │                                                                         │
//! │  Exact integer arithmetic, no float ever touches the stock counter.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounding Policy
//! Fractional demand is ALWAYS rounded up to the next whole stock unit,
//! per order line. Rounding up avoids under-deduction (the kitchen opened
//! the bag; the partial remainder is not sellable inventory). Each line
//! rounds independently; per-item demand is the sum of the already-rounded
//! line requirements.
//!
//! ## Usage
//! ```rust
//! use bistro_core::recipe::RecipeQty;
//!
//! // 0.25 lb of beef per burger
//! let beef = RecipeQty::from_milli(250);
//!
//! // 3 burgers ordered: ceil(0.75) = 1 whole lb
//! assert_eq!(beef.required_for(3), 1);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of milli-units in one whole stock unit.
pub const MILLI_PER_UNIT: i64 = 1_000;

// =============================================================================
// RecipeQty Type
// =============================================================================

/// Quantity of a stock item required per unit of menu item sold,
/// in thousandths of a stock unit.
///
/// ## Examples
/// | Recipe                    | milli | `required_for(2)` |
/// |---------------------------|-------|-------------------|
/// | 0.25 lb beef per burger   | 250   | ceil(0.50) = 1    |
/// | 1 bun per burger          | 1000  | 2                 |
/// | 1.5 oz syrup per lemonade | 1500  | 3                 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecipeQty(i64);

impl RecipeQty {
    /// Creates a recipe quantity from milli-units (thousandths of a stock unit).
    #[inline]
    pub const fn from_milli(milli: i64) -> Self {
        RecipeQty(milli)
    }

    /// Creates a recipe quantity from whole stock units.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        RecipeQty(units * MILLI_PER_UNIT)
    }

    /// Returns the quantity in milli-units.
    #[inline]
    pub const fn milli(&self) -> i64 {
        self.0
    }

    /// Computes the whole stock units required for `line_quantity` units
    /// of the menu item, rounding fractional demand UP.
    ///
    /// required = ceil(qty_per_unit × line_quantity)
    ///
    /// ## Example
    /// ```rust
    /// use bistro_core::recipe::RecipeQty;
    ///
    /// // 0.25 per unit, ordered in quantity 3: ceil(0.75) = 1, not 0
    /// assert_eq!(RecipeQty::from_milli(250).required_for(3), 1);
    ///
    /// // whole-unit recipes never round
    /// assert_eq!(RecipeQty::from_units(1).required_for(2), 2);
    /// ```
    #[inline]
    pub const fn required_for(&self, line_quantity: i64) -> i64 {
        // Integer ceiling division; quantities are validated positive
        // before this is reached.
        (self.0 * line_quantity + MILLI_PER_UNIT - 1) / MILLI_PER_UNIT
    }

    /// Whether this quantity represents zero demand.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for RecipeQty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:03}",
            self.0 / MILLI_PER_UNIT,
            (self.0 % MILLI_PER_UNIT).abs()
        )
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fractional_demand_rounds_up() {
        // 0.25 units per item, ordered in quantity 3:
        // ceil(0.75) = 1 unit, not 0 and not 0.75
        let qty = RecipeQty::from_milli(250);
        assert_eq!(qty.required_for(3), 1);
    }

    #[test]
    fn test_whole_unit_demand_is_exact() {
        // 1 bun per burger, 2 burgers = exactly 2 buns
        let qty = RecipeQty::from_units(1);
        assert_eq!(qty.required_for(2), 2);

        // 2 patties per double burger, 5 ordered = 10
        let qty = RecipeQty::from_units(2);
        assert_eq!(qty.required_for(5), 10);
    }

    #[test]
    fn test_exact_fraction_boundary() {
        // 0.5 per item × 4 = 2.0 exactly: no rounding artifact
        let qty = RecipeQty::from_milli(500);
        assert_eq!(qty.required_for(4), 2);

        // 0.5 per item × 5 = 2.5 → 3
        assert_eq!(qty.required_for(5), 3);
    }

    #[test]
    fn test_small_fraction_never_rounds_to_zero() {
        // Even a 0.001 demand consumes one whole unit
        let qty = RecipeQty::from_milli(1);
        assert_eq!(qty.required_for(1), 1);
    }

    #[test]
    fn test_per_line_rounding_documented() {
        // Two separate lines each needing 0.25 round up independently:
        // line A ceil(0.25) = 1, line B ceil(0.25) = 1, total demand = 2.
        // Aggregating before rounding would give ceil(0.5) = 1.
        // The per-line policy is the deliberate (safety-margin) behavior.
        let qty = RecipeQty::from_milli(250);
        let per_line = qty.required_for(1) + qty.required_for(1);
        assert_eq!(per_line, 2);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", RecipeQty::from_milli(250)), "0.250");
        assert_eq!(format!("{}", RecipeQty::from_units(2)), "2.000");
        assert_eq!(format!("{}", RecipeQty::from_milli(1500)), "1.500");
    }
}
