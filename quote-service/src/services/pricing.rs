//! Pricing engine: derives quote totals from line items and discount
//! directives. Pure computation, no I/O.

use rust_decimal::{Decimal, RoundingStrategy};

/// Quantity/price pair for one line.
#[derive(Debug, Clone, Copy)]
pub struct PricedLine {
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Derived monetary fields of a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteTotals {
    pub subtotal: Decimal,
    pub total: Decimal,
}

/// Round to 2-decimal currency precision, midpoint away from zero.
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Total of a single line: quantity x unit price.
pub fn line_total(quantity: i32, unit_price: Decimal) -> Decimal {
    round_currency(Decimal::from(quantity) * unit_price)
}

/// Compute subtotal and total for a set of lines.
///
/// A nonzero percentage takes precedence over a nonzero amount; the total is
/// clamped at zero. An empty line set yields a zero subtotal.
pub fn recalculate(
    lines: &[PricedLine],
    discount_percentage: Option<Decimal>,
    discount_amount: Option<Decimal>,
) -> QuoteTotals {
    let subtotal = round_currency(
        lines
            .iter()
            .map(|line| line_total(line.quantity, line.unit_price))
            .sum(),
    );
    let total = apply_discount(subtotal, discount_percentage, discount_amount);
    QuoteTotals { subtotal, total }
}

/// Apply the discount precedence rule to an already-known subtotal.
pub fn apply_discount(
    subtotal: Decimal,
    discount_percentage: Option<Decimal>,
    discount_amount: Option<Decimal>,
) -> Decimal {
    let percentage = discount_percentage.unwrap_or(Decimal::ZERO);
    let amount = discount_amount.unwrap_or(Decimal::ZERO);

    let total = if percentage > Decimal::ZERO {
        subtotal - subtotal * percentage / Decimal::ONE_HUNDRED
    } else if amount > Decimal::ZERO {
        subtotal - amount
    } else {
        subtotal
    };

    round_currency(total.max(Decimal::ZERO))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(quantity: i32, unit_price: Decimal) -> PricedLine {
        PricedLine {
            quantity,
            unit_price,
        }
    }

    #[test]
    fn empty_line_set_yields_zero() {
        let totals = recalculate(&[], None, None);
        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn subtotal_is_sum_of_line_totals() {
        let totals = recalculate(
            &[line(3, dec!(19.99)), line(2, dec!(5.25)), line(1, dec!(0.01))],
            None,
            None,
        );
        assert_eq!(totals.subtotal, dec!(70.48));
        assert_eq!(totals.total, totals.subtotal);
    }

    #[test]
    fn percentage_discount_scenario() {
        // 2 x 100.00 + 1 x 50.00 with 10% off
        let totals = recalculate(
            &[line(2, dec!(100.00)), line(1, dec!(50.00))],
            Some(dec!(10)),
            None,
        );
        assert_eq!(totals.subtotal, dec!(250.00));
        assert_eq!(totals.total, dec!(225.00));
    }

    #[test]
    fn amount_discount_scenario() {
        // Same subtotal, flat 25 off, percentage explicitly zeroed.
        let totals = recalculate(
            &[line(2, dec!(100.00)), line(1, dec!(50.00))],
            Some(dec!(0)),
            Some(dec!(25)),
        );
        assert_eq!(totals.total, dec!(225.00));
    }

    #[test]
    fn percentage_takes_precedence_over_amount() {
        let totals = recalculate(&[line(1, dec!(200.00))], Some(dec!(50)), Some(dec!(10)));
        assert_eq!(totals.total, dec!(100.00));
    }

    #[test]
    fn total_is_clamped_at_zero() {
        let totals = recalculate(&[line(1, dec!(30.00))], None, Some(dec!(100.00)));
        assert_eq!(totals.subtotal, dec!(30.00));
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn full_percentage_discount_reaches_zero() {
        let totals = recalculate(&[line(4, dec!(12.50))], Some(dec!(100)), None);
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn totals_are_rounded_to_currency_precision() {
        // 3 x 0.333 = 0.999 -> 1.00 at line level
        let totals = recalculate(&[line(3, dec!(0.333))], None, None);
        assert_eq!(totals.subtotal, dec!(1.00));

        // 33.333% of 100 -> 66.67 after rounding away from zero
        let total = apply_discount(dec!(100.00), Some(dec!(33.333)), None);
        assert_eq!(total, dec!(66.67));
    }

    #[test]
    fn discount_only_recompute_against_existing_subtotal() {
        assert_eq!(apply_discount(dec!(250.00), None, Some(dec!(25))), dec!(225.00));
        assert_eq!(apply_discount(dec!(250.00), Some(dec!(10)), Some(dec!(25))), dec!(225.00));
        assert_eq!(apply_discount(dec!(250.00), None, None), dec!(250.00));
    }
}
