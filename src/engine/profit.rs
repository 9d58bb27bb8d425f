//! Per-deal profit split: telesales commission vs. the BDM profit pool.

use crate::domain::{DealFinancials, Pence, Rate};
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfitError {
    #[error("costs exceed deal value")]
    CostsExceedValue,
    #[error("{field} must not be negative")]
    NegativeInput { field: &'static str },
}

/// Fixed 10% telesales share of a deal's initial profit.
fn telesales_split_rate() -> Rate {
    Rate::try_new(Decimal::new(1, 1)).expect("0.1 is a valid rate")
}

/// Derive a deal's profit split from its financial inputs.
///
/// `initial_profit = deal_value - buy_in_cost - installation_cost -
/// misc_costs`; the telesales commission is 10% of that, rounded half-up;
/// the remaining profit is the exact complement, so the two always sum back
/// to the initial profit.
///
/// The split is a pure function of the four inputs and is recomputed in full
/// whenever any one of them changes.
///
/// # Errors
/// Returns an error if any input is negative or the costs exceed the deal
/// value.
pub fn compute_deal_financials(
    deal_value: Pence,
    buy_in_cost: Pence,
    installation_cost: Pence,
    misc_costs: Pence,
) -> Result<DealFinancials, ProfitError> {
    for (field, amount) in [
        ("dealValue", deal_value),
        ("buyInCost", buy_in_cost),
        ("installationCost", installation_cost),
        ("miscCosts", misc_costs),
    ] {
        if amount.is_negative() {
            return Err(ProfitError::NegativeInput { field });
        }
    }

    let initial_profit = deal_value - buy_in_cost - installation_cost - misc_costs;
    if initial_profit.is_negative() {
        return Err(ProfitError::CostsExceedValue);
    }

    let telesales_commission = initial_profit.apply_rate(telesales_split_rate());
    let remaining_profit = initial_profit - telesales_commission;

    Ok(DealFinancials {
        deal_value,
        buy_in_cost,
        installation_cost,
        misc_costs,
        initial_profit,
        telesales_commission,
        remaining_profit,
    })
}
