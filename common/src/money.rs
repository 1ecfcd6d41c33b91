//! [`Money`]-related definitions.

use std::{fmt, iter::Sum, ops, str::FromStr};

use rust_decimal::{prelude::ToPrimitive as _, Decimal};

/// Amount of money.
///
/// The ledger is single-currency, so only the amount is carried.
#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(transparent)
)]
pub struct Money(Decimal);

impl Money {
    /// [`Money`] amount of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a new [`Money`] from the provided [`Decimal`] amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Returns the [`Decimal`] amount of this [`Money`].
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Indicates whether this [`Money`] amount is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Indicates whether this [`Money`] amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(amount) = self;
        if amount.is_integer() {
            write!(f, "{}", amount.to_i128().expect("integer"))
        } else {
            write!(f, "{amount}")
        }
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s).map(Self).map_err(|_| "invalid amount")
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl From<i64> for Money {
    fn from(amount: i64) -> Self {
        Self(Decimal::from(amount))
    }
}

impl ops::Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl ops::Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, ops::Add::add)
    }
}

#[cfg(feature = "postgres")]
mod postgres {
    //! Module providing integration with [`postgres_types`] crate.

    use std::error::Error as StdError;

    use postgres_types::{
        accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql,
        Type,
    };
    use rust_decimal::Decimal;

    use super::Money;

    impl FromSql<'_> for Money {
        accepts!(NUMERIC);

        fn from_sql(
            ty: &Type,
            raw: &[u8],
        ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
            Decimal::from_sql(ty, raw).map(Self)
        }
    }

    impl ToSql for Money {
        accepts!(NUMERIC);
        to_sql_checked!();

        fn to_sql(
            &self,
            ty: &Type,
            w: &mut BytesMut,
        ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
            self.0.to_sql(ty, w)
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::Money;

    fn money(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    #[test]
    fn from_str() {
        assert_eq!(
            Money::from_str("123.45").unwrap(),
            Money::new(Decimal::from_str("123.45").unwrap()),
        );
        assert_eq!(
            Money::from_str("-1").unwrap(),
            Money::new(Decimal::from_str("-1").unwrap()),
        );

        assert!(Money::from_str("").is_err());
        assert!(Money::from_str("12,3").is_err());
        assert!(Money::from_str("12 RUB").is_err());
    }

    #[test]
    fn to_string() {
        assert_eq!(money("123.45").to_string(), "123.45");
        assert_eq!(money("123.00").to_string(), "123");
        assert_eq!(money("123.0").to_string(), "123");
        assert_eq!(money("123").to_string(), "123");
    }

    #[test]
    fn arithmetic() {
        assert_eq!(money("6000000") - money("5000000"), money("1000000"));
        assert_eq!(money("400000") + money("300000"), money("700000"));
        assert_eq!(
            [money("400000"), money("300000"), Money::ZERO]
                .into_iter()
                .sum::<Money>(),
            money("700000"),
        );
    }

    #[test]
    fn positivity() {
        assert!(money("0.01").is_positive());
        assert!(!Money::ZERO.is_positive());
        assert!(!money("-5").is_positive());
    }
}
