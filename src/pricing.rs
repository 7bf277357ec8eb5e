//! Line-amount calculator.
//!
//! Each application type carries one of two mutually exclusive pricing
//! formulas. An unknown application type or a missing operand yields zero
//! with a calculation warning, never a hard failure — a line with a broken
//! amount must not abort a batch in progress.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::warn;

/// Closed set of pricing formulas. Adding a third method is a compile-time
/// checked change at every match site.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PricingMethod {
    /// `rebate_price * quantity`
    UnitIncentive,
    /// `price * quantity * rebate_rate`
    RateIncentive,
}

/// Computes a line's rebate amount.
///
/// `rebate_rate` is a fraction in `[0, 1]`, not a percentage: a 5% incentive
/// is `0.05`. The result is clamped to two decimal places, rounding half away
/// from zero at the cent.
pub fn compute_line_amount(
    method: Option<PricingMethod>,
    price: Decimal,
    quantity: i32,
    rebate_price: Option<Decimal>,
    rebate_rate: Option<Decimal>,
) -> Decimal {
    let quantity = Decimal::from(quantity);

    let amount = match method {
        Some(PricingMethod::UnitIncentive) => match rebate_price {
            Some(unit) if unit >= Decimal::ZERO => unit * quantity,
            Some(unit) => {
                warn!(%unit, "Skipping unit-incentive calculation: negative rebate price");
                Decimal::ZERO
            }
            None => {
                warn!("Skipping unit-incentive calculation: rebate price missing");
                Decimal::ZERO
            }
        },
        Some(PricingMethod::RateIncentive) => match rebate_rate {
            Some(rate) => price * quantity * rate,
            None => {
                warn!("Skipping rate-incentive calculation: rebate rate missing");
                Decimal::ZERO
            }
        },
        None => {
            warn!("Skipping calculation: unknown application type");
            Decimal::ZERO
        }
    };

    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
