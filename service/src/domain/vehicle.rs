//! [`Vehicle`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Vehicle taken into the dealership for resale.
///
/// Intake itself is managed elsewhere; the sale lifecycle reads the record
/// and flips its [`Status`] to [`Status::Sold`] when the sale closes.
#[derive(Clone, Debug)]
pub struct Vehicle {
    /// ID of this [`Vehicle`].
    pub id: Id,

    /// Brand code of this [`Vehicle`].
    pub brand_code: BrandCode,

    /// Model code of this [`Vehicle`].
    pub model_code: ModelCode,

    /// Intake cost of this [`Vehicle`].
    pub purchase_price: Money,

    /// Current [`Status`] of this [`Vehicle`].
    pub status: Status,

    /// [`DateTime`] when this [`Vehicle`] was taken in.
    pub created_at: CreationDateTime,
}

/// ID of a [`Vehicle`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Brand code of a [`Vehicle`].
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, PartialEq, Serialize,
)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct BrandCode(pub String);

/// Model code of a [`Vehicle`].
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, PartialEq, Serialize,
)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct ModelCode(pub String);

define_kind! {
    #[doc = "Status of a [`Vehicle`]."]
    enum Status {
        #[doc = "The [`Vehicle`] is in stock and available for sale."]
        InStock = 1,

        #[doc = "The [`Vehicle`] is reserved by a customer."]
        Reserved = 2,

        #[doc = "The [`Vehicle`] is sold."]
        Sold = 3,
    }
}

/// [`DateTime`] when a [`Vehicle`] was taken in.
pub type CreationDateTime = DateTimeOf<(Vehicle, unit::Creation)>;
