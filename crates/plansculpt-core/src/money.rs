//! Decimal helpers for monetary amounts (two fraction digits)

use plansculpt_db::entities::transaction::TransactionKind;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{CoreError, CoreResult};

/// Round to cents and fix the scale at 2, so `500` renders as `500.00`
pub fn round(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

pub fn sum<I>(amounts: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    round(amounts.into_iter().fold(Decimal::ZERO, |acc, a| acc + a))
}

/// Income counts positive, expense negative
pub fn signed(kind: TransactionKind, amount: Decimal) -> Decimal {
    match kind {
        TransactionKind::Income => amount,
        TransactionKind::Expense => -amount,
    }
}

pub fn require_positive(field: &str, amount: Decimal) -> CoreResult<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(CoreError::Validation(format!("{} must be greater than 0", field)));
    }
    Ok(round(amount))
}

pub fn require_non_negative(field: &str, amount: Decimal) -> CoreResult<Decimal> {
    if amount < Decimal::ZERO {
        return Err(CoreError::Validation(format!("{} must not be negative", field)));
    }
    Ok(round(amount))
}
