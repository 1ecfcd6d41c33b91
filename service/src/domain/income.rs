//! [`Income`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{employee, sale};
#[cfg(doc)]
use crate::domain::{Employee, Sale};

/// Income-ledger entry of an [`Employee`].
#[derive(Clone, Debug)]
pub struct Income {
    /// ID of this [`Income`] entry.
    pub id: Id,

    /// ID of the [`Employee`] this [`Income`] is credited to.
    pub employee_id: employee::Id,

    /// ID of the [`Sale`] this [`Income`] originates from, if any.
    pub sale_id: Option<sale::Id>,

    /// Credited amount.
    pub amount: Money,

    /// [`Kind`] of this [`Income`].
    pub kind: Kind,

    /// Human-readable [`Description`] of this [`Income`].
    pub description: Option<Description>,

    /// Indicator whether this [`Income`] has been paid out.
    pub is_paid: bool,

    /// [`DateTime`] when this [`Income`] was paid out, if it was.
    pub paid_at: Option<PaymentDateTime>,

    /// [`DateTime`] when this [`Income`] was created.
    pub created_at: CreationDateTime,
}

/// ID of an [`Income`] entry.
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

/// Description of an [`Income`] entry.
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, PartialEq, Serialize,
)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Description(pub String);

define_kind! {
    #[doc = "Kind of an [`Income`] entry."]
    enum Kind {
        #[doc = "Bonus for participating in a [`Sale`]."]
        SaleBonus = 1,

        #[doc = "Commission payout."]
        Commission = 2,

        #[doc = "Any other income."]
        Other = 3,
    }
}

/// [`DateTime`] when an [`Income`] was paid out.
pub type PaymentDateTime = DateTimeOf<(Income, Payment)>;

/// Marker type indicating an [`Income`] payout.
#[derive(Clone, Copy, Debug)]
pub struct Payment;

/// [`DateTime`] when an [`Income`] was created.
pub type CreationDateTime = DateTimeOf<(Income, unit::Creation)>;
