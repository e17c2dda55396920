// core/src/money.rs

//! Fixed-point money used for prices, line amounts and order totals.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use crate::error::{StoreError, StoreResult};

/// Number of decimal places stored for every amount.
pub const MONEY_SCALE: u32 = 2;

/// Largest number of significant digits accepted for a unit price (NUMERIC(10, 2)).
pub const PRICE_MAX_DIGITS: u32 = 10;

/// Largest number of significant digits stored for an order total (NUMERIC(20, 2)).
pub const ORDER_TOTAL_MAX_DIGITS: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct Money(Decimal);

impl Money {
  pub fn zero() -> Self {
    Money::new(Decimal::ZERO)
  }

  /// Wraps an amount, normalised to two decimal places.
  pub fn new(amount: Decimal) -> Self {
    let mut rounded = amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    Money(rounded)
  }

  /// Validates a unit price: strictly positive, at most two decimal places and ten digits.
  pub fn price(amount: Decimal) -> StoreResult<Self> {
    if amount <= Decimal::ZERO {
      return Err(StoreError::Validation("Price must be a positive number.".to_string()));
    }
    let normalized = amount.normalize();
    if normalized.scale() > MONEY_SCALE {
      return Err(StoreError::Validation(
        "Price must have at most 2 decimal places.".to_string(),
      ));
    }
    let mut whole_digits = 0;
    let mut whole = normalized.trunc();
    while !whole.is_zero() {
      whole_digits += 1;
      whole = (whole / Decimal::TEN).trunc();
    }
    if whole_digits > PRICE_MAX_DIGITS - MONEY_SCALE {
      return Err(StoreError::Validation(format!(
        "Price must have no more than {} digits in total.",
        PRICE_MAX_DIGITS
      )));
    }
    Ok(Money::new(normalized))
  }

  /// Largest amount representable with `digits` significant digits, two of them decimals.
  pub fn max_with_digits(digits: u32) -> Self {
    Money(Decimal::from_i128_with_scale(10i128.pow(digits) - 1, MONEY_SCALE))
  }

  pub fn amount(&self) -> Decimal {
    self.0
  }

  /// Amount for `quantity` units at this unit price.
  pub fn times(&self, quantity: i32) -> Money {
    Money::new(self.0 * Decimal::from(quantity))
  }

  pub fn is_positive(&self) -> bool {
    self.0 > Decimal::ZERO
  }
}

impl From<Decimal> for Money {
  fn from(amount: Decimal) -> Self {
    Money::new(amount)
  }
}

impl Add for Money {
  type Output = Money;

  fn add(self, rhs: Money) -> Money {
    Money(self.0 + rhs.0)
  }
}

impl Sum for Money {
  fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
    iter.fold(Money::zero(), Add::add)
  }
}

impl<'a> Sum<&'a Money> for Money {
  fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
    iter.copied().sum()
  }
}

impl fmt::Display for Money {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:.2}", self.0)
  }
}
