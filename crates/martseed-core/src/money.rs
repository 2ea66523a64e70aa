//! # Monetary Arithmetic
//!
//! All monetary fields are `f64` rounded to 2 decimal places with
//! round-half-to-even (banker's rounding). The convention is applied per
//! row at the boundary between the synthesizer and the store, never at the
//! batch level. `round_cents` is the single place this happens.

/// Round to 2 decimal places, ties to even.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round_ties_even() / 100.0
}

/// Format a monetary amount as a SQL/CSV literal with exactly 2 decimals.
pub fn format_cents(amount: f64) -> String {
    format!("{:.2}", amount)
}

/// Derived monetary fields of one fact row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineAmounts {
    pub total_amount: f64,
    pub discount_amount: f64,
}

/// Compute the discount and total for one line.
///
/// `discount_pct` is a fraction (0.05 = 5%). The discount is rounded first,
/// then subtracted, so `total_amount + discount_amount` always reconciles
/// with `round_cents(unit_price * quantity)` to the cent.
pub fn line_amounts(unit_price: f64, quantity: u32, discount_pct: f64) -> LineAmounts {
    let total_before_discount = unit_price * f64::from(quantity);
    let discount_amount = round_cents(total_before_discount * discount_pct);
    let total_amount = round_cents(total_before_discount - discount_amount);
    LineAmounts {
        total_amount,
        discount_amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_cents_plain() {
        assert_eq!(round_cents(12.344), 12.34);
        assert_eq!(round_cents(12.346), 12.35);
    }

    #[test]
    fn test_round_cents_ties_to_even() {
        // Values chosen so the scaled intermediate is exact in binary.
        assert_eq!(round_cents(0.125), 0.12);
        assert_eq!(round_cents(0.375), 0.38);
        assert_eq!(round_cents(2.5), 2.5);
    }

    #[test]
    fn test_line_amounts_no_discount() {
        let line = line_amounts(19.99, 3, 0.0);
        assert_eq!(line.discount_amount, 0.0);
        assert_eq!(line.total_amount, 59.97);
    }

    #[test]
    fn test_line_amounts_with_discount() {
        let line = line_amounts(100.0, 2, 0.15);
        assert_eq!(line.discount_amount, 30.0);
        assert_eq!(line.total_amount, 170.0);
    }

    #[test]
    fn test_line_amounts_reconcile() {
        // total + discount must equal the undiscounted line total to the cent,
        // across awkward prices and every discount tier.
        let prices = [10.01, 19.99, 33.33, 149.95, 199.99];
        let discounts = [0.0, 0.05, 0.10, 0.15];
        for &price in &prices {
            for qty in 1..=5u32 {
                for &pct in &discounts {
                    let line = line_amounts(price, qty, pct);
                    let gross = round_cents(price * f64::from(qty));
                    let recon = round_cents(line.total_amount + line.discount_amount);
                    assert!(
                        (recon - gross).abs() < 0.005,
                        "price={} qty={} pct={}: {} + {} != {}",
                        price,
                        qty,
                        pct,
                        line.total_amount,
                        line.discount_amount,
                        gross
                    );
                }
            }
        }
    }

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(12.0), "12.00");
        assert_eq!(format_cents(12.3456), "12.35");
        assert_eq!(format_cents(0.1), "0.10");
    }
}
