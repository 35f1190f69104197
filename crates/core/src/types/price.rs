//! Type-safe, non-negative money amounts using decimal arithmetic.
//!
//! The shop trades in a single currency, so a price is just an amount. It is
//! stored as `NUMERIC(12, 2)` and serialized as a string (`"19.99"`) so that
//! JSON clients never see binary floating point.

use core::fmt;
use core::iter::Sum;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::quantity::Quantity;

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// The amount does not fit in `NUMERIC(12, 2)`.
    #[error("price must be less than {max}")]
    TooLarge {
        /// Exclusive upper bound.
        max: Decimal,
    },
}

/// A non-negative amount with two decimal places.
///
/// ```
/// use emporium_core::{Price, Quantity};
/// use rust_decimal::Decimal;
///
/// let price = Price::new(Decimal::new(1000, 2)).unwrap();
/// let qty = Quantity::new(2).unwrap();
/// assert_eq!(price.times(qty).to_string(), "20.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Zero, the identity for sums.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price, rounding to cents (half away from zero).
    ///
    /// The result always carries exactly two decimal places, so `10` is
    /// stored and serialized as `10.00`.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] for amounts below zero and
    /// [`PriceError::TooLarge`] for amounts that overflow the column.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(2);
        let limit = column_limit();
        if rounded >= limit {
            return Err(PriceError::TooLarge { max: limit });
        }
        Ok(Self(rounded.abs()))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Line total for `quantity` units at this price.
    ///
    /// Quantities are capped at [`Quantity::MAX`], so the product cannot
    /// overflow `Decimal`.
    #[must_use]
    pub fn times(self, quantity: Quantity) -> Decimal {
        let mut total = (self.0 * Decimal::from(quantity.get())).round_dp(2);
        total.rescale(2);
        total
    }
}

/// Exclusive upper bound of a `NUMERIC(12, 2)` column.
fn column_limit() -> Decimal {
    Decimal::new(10_000_000_000, 0)
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|p| p.0).sum())
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
