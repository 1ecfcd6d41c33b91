//! [`Sale`] definitions.

pub mod bonus;
pub mod transition;

use std::fmt;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{customer, employee, vehicle};
#[cfg(doc)]
use crate::domain::{Customer, Employee, Income, Vehicle};

/// Sale of a [`Vehicle`] to a [`Customer`].
///
/// The transactional aggregate of the sale lifecycle: it owns its own scalar
/// and derived fields, and references (but doesn't own) the [`Vehicle`],
/// [`Customer`] and [`Employee`] records.
#[derive(Clone, Debug)]
pub struct Sale {
    /// ID of this [`Sale`].
    pub id: Id,

    /// ID of the [`Vehicle`] being sold.
    ///
    /// A [`Vehicle`] may be sold at most once.
    pub vehicle_id: vehicle::Id,

    /// ID of the [`Customer`] buying the [`Vehicle`].
    pub customer_id: customer::Id,

    /// ID of the [`Employee`] selling the [`Vehicle`].
    pub seller_id: employee::Id,

    /// ID of the [`Employee`] who took the [`Vehicle`] in.
    pub intake_employee_id: employee::Id,

    /// ID of the supervising manager [`Employee`], if any.
    pub manager_id: Option<employee::Id>,

    /// Intake cost of the [`Vehicle`].
    pub purchase_price: Money,

    /// Price the [`Vehicle`] is sold for.
    pub sale_price: Money,

    /// Net profit of this [`Sale`].
    ///
    /// Derived: always equals [`sale_price`] minus [`purchase_price`].
    ///
    /// [`purchase_price`]: Sale::purchase_price
    /// [`sale_price`]: Sale::sale_price
    pub net_profit: Money,

    /// Bonus of the selling [`Employee`].
    pub seller_bonus: Option<Money>,

    /// Bonus of the [`Employee`] who took the [`Vehicle`] in.
    pub intake_bonus: Option<Money>,

    /// Bonus of the supervising manager [`Employee`].
    pub manager_bonus: Option<Money>,

    /// Total of all the per-role bonuses.
    pub total_bonuses: Option<Money>,

    /// Current lifecycle [`Status`] of this [`Sale`].
    pub status: Status,

    /// Indicator whether the commission of this [`Sale`] has been paid.
    ///
    /// `true` only once the [`Status`] reaches its terminal state.
    pub is_commission_paid: bool,

    /// [`DateTime`] when the [`Vehicle`] was handed over, if known.
    pub sale_date: Option<SaleDateTime>,

    /// Indicator whether this [`Sale`] is active.
    pub is_active: bool,

    /// [`DateTime`] when this [`Sale`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Sale`] was last updated.
    pub updated_at: UpdateDateTime,
}

impl Sale {
    /// Computes the sum of all the populated per-role bonuses.
    ///
    /// Missing bonuses count as zero.
    #[must_use]
    pub fn bonus_components_total(&self) -> Money {
        [self.seller_bonus, self.intake_bonus, self.manager_bonus]
            .into_iter()
            .flatten()
            .sum()
    }

    /// Indicates whether `other` carries the same field values as this
    /// [`Sale`], ignoring [`Sale::updated_at`].
    ///
    /// Used to detect no-op updates, which are accepted without a write.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.id == other.id
            && self.vehicle_id == other.vehicle_id
            && self.customer_id == other.customer_id
            && self.seller_id == other.seller_id
            && self.intake_employee_id == other.intake_employee_id
            && self.manager_id == other.manager_id
            && self.purchase_price == other.purchase_price
            && self.sale_price == other.sale_price
            && self.net_profit == other.net_profit
            && self.seller_bonus == other.seller_bonus
            && self.intake_bonus == other.intake_bonus
            && self.manager_bonus == other.manager_bonus
            && self.total_bonuses == other.total_bonuses
            && self.status == other.status
            && self.is_commission_paid == other.is_commission_paid
            && self.sale_date == other.sale_date
            && self.is_active == other.is_active
            && self.created_at == other.created_at
    }

    /// Indicates whether any bonus field of this [`Sale`] is populated.
    #[must_use]
    pub const fn has_any_bonus(&self) -> bool {
        self.seller_bonus.is_some()
            || self.intake_bonus.is_some()
            || self.manager_bonus.is_some()
            || self.total_bonuses.is_some()
    }
}

/// ID of a [`Sale`].
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

define_kind! {
    #[doc = "Lifecycle status of a [`Sale`]."]
    enum Status {
        #[doc = "Initial status: the [`Sale`] awaits approval."]
        OnApproval = 1,

        #[doc = "Paperwork is being processed."]
        OnProcessing = 2,

        #[doc = "The [`Vehicle`] is handed over, bonuses are pending."]
        Sold = 3,

        #[doc = "Employee bonuses are credited, commission is pending."]
        BonusesIssued = 4,

        #[doc = "All payouts are done; terminal status."]
        CommissionIssued = 5,
    }
}

impl Status {
    /// Indicates whether this [`Status`] is terminal.
    ///
    /// A terminal [`Status`] is immutable.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::CommissionIssued)
    }

    /// Returns the [`Status`]es this one may legally transition into.
    #[must_use]
    pub const fn allowed_transitions(self) -> &'static [Self] {
        match self {
            Self::OnApproval => &[Self::OnProcessing, Self::Sold],
            Self::OnProcessing => {
                &[Self::Sold, Self::OnApproval, Self::BonusesIssued]
            }
            Self::Sold => &[Self::BonusesIssued, Self::OnProcessing],
            Self::BonusesIssued => &[Self::CommissionIssued, Self::Sold],
            Self::CommissionIssued => &[],
        }
    }

    /// Returns a short human-readable label of this [`Status`].
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::OnApproval => "On approval",
            Self::OnProcessing => "On processing",
            Self::Sold => "Sold",
            Self::BonusesIssued => "Bonuses issued",
            Self::CommissionIssued => "Commission issued",
        }
    }

    /// Returns a human-readable description of this [`Status`].
    #[must_use]
    pub const fn about(self) -> &'static str {
        match self {
            Self::OnApproval => "Initial status, awaiting approval",
            Self::OnProcessing => "Paperwork in progress, preparing the sale",
            Self::Sold => "Vehicle handed over, awaiting bonus payout",
            Self::BonusesIssued => {
                "Employee bonuses credited, awaiting commission"
            }
            Self::CommissionIssued => "All payouts done, the sale is closed",
        }
    }
}

/// Partial update of a [`Sale`].
///
/// [`None`] fields are left untouched.
#[derive(Clone, Debug, Default)]
pub struct Patch {
    /// New ID of the [`Vehicle`] being sold.
    pub vehicle_id: Option<vehicle::Id>,

    /// New ID of the buying [`Customer`].
    pub customer_id: Option<customer::Id>,

    /// New ID of the selling [`Employee`].
    pub seller_id: Option<employee::Id>,

    /// New ID of the [`Employee`] who took the [`Vehicle`] in.
    pub intake_employee_id: Option<employee::Id>,

    /// New ID of the supervising manager [`Employee`].
    pub manager_id: Option<employee::Id>,

    /// New intake cost of the [`Vehicle`].
    pub purchase_price: Option<Money>,

    /// New price the [`Vehicle`] is sold for.
    pub sale_price: Option<Money>,

    /// New bonus of the selling [`Employee`].
    pub seller_bonus: Option<Money>,

    /// New bonus of the [`Employee`] who took the [`Vehicle`] in.
    pub intake_bonus: Option<Money>,

    /// New bonus of the supervising manager [`Employee`].
    pub manager_bonus: Option<Money>,

    /// New total of all the per-role bonuses.
    pub total_bonuses: Option<Money>,

    /// New lifecycle [`Status`].
    pub status: Option<Status>,

    /// New [`DateTime`] when the [`Vehicle`] was handed over.
    pub sale_date: Option<SaleDateTime>,

    /// New activity indicator.
    pub is_active: Option<bool>,
}

impl Patch {
    /// Merges this [`Patch`] into the provided [`Sale`], producing the full
    /// proposed field set.
    ///
    /// [`Sale::net_profit`] is recomputed and [`Sale::updated_at`] is bumped.
    #[must_use]
    pub fn apply_to(&self, sale: &Sale) -> Sale {
        let mut merged = sale.clone();

        if let Some(v) = self.vehicle_id {
            merged.vehicle_id = v;
        }
        if let Some(v) = self.customer_id {
            merged.customer_id = v;
        }
        if let Some(v) = self.seller_id {
            merged.seller_id = v;
        }
        if let Some(v) = self.intake_employee_id {
            merged.intake_employee_id = v;
        }
        if let Some(v) = self.manager_id {
            merged.manager_id = Some(v);
        }
        if let Some(v) = self.purchase_price {
            merged.purchase_price = v;
        }
        if let Some(v) = self.sale_price {
            merged.sale_price = v;
        }
        if let Some(v) = self.seller_bonus {
            merged.seller_bonus = Some(v);
        }
        if let Some(v) = self.intake_bonus {
            merged.intake_bonus = Some(v);
        }
        if let Some(v) = self.manager_bonus {
            merged.manager_bonus = Some(v);
        }
        if let Some(v) = self.total_bonuses {
            merged.total_bonuses = Some(v);
        }
        if let Some(v) = self.status {
            merged.status = v;
        }
        if let Some(v) = self.sale_date {
            merged.sale_date = Some(v);
        }
        if let Some(v) = self.is_active {
            merged.is_active = v;
        }

        merged.net_profit = merged.sale_price - merged.purchase_price;
        merged.updated_at = DateTimeOf::now();

        merged
    }

    /// Indicates whether this [`Patch`] changes any of the references of the
    /// provided [`Sale`].
    #[must_use]
    pub fn changes_references(&self, sale: &Sale) -> bool {
        self.vehicle_id.is_some_and(|v| v != sale.vehicle_id)
            || self.customer_id.is_some_and(|v| v != sale.customer_id)
            || self.seller_id.is_some_and(|v| v != sale.seller_id)
            || self
                .intake_employee_id
                .is_some_and(|v| v != sale.intake_employee_id)
            || self.manager_id.is_some_and(|v| Some(v) != sale.manager_id)
    }

    /// Indicates whether this [`Patch`] touches any bonus-relevant field.
    ///
    /// Prices count as bonus-relevant, since the bonus invariants are checked
    /// against the net profit.
    #[must_use]
    pub const fn touches_bonuses(&self) -> bool {
        self.seller_bonus.is_some()
            || self.intake_bonus.is_some()
            || self.manager_bonus.is_some()
            || self.total_bonuses.is_some()
            || self.sale_price.is_some()
            || self.purchase_price.is_some()
    }
}

/// Violation of a [`Sale`] business rule.
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
pub enum Violation {
    /// Requested status transition is not in the legal transition table.
    #[display("transition from `{from}` to `{to}` is not allowed")]
    TransitionNotAllowed {
        /// Current [`Status`].
        from: Status,

        /// Requested [`Status`].
        to: Status,
    },

    /// Terminal status can never be changed.
    #[display("cannot change terminal status `{_0}`")]
    TerminalStatus(#[error(not(source))] Status),

    /// Target status requires a sale date.
    #[display("status `{_0}` requires a sale date")]
    SaleDateRequired(#[error(not(source))] Status),

    /// Target status requires a sale price.
    #[display("status `{_0}` requires a sale price")]
    SalePriceRequired(#[error(not(source))] Status),

    /// Target status requires a strictly positive sale price.
    #[display("status `{_0}` requires a strictly positive sale price")]
    SalePriceNotPositive(#[error(not(source))] Status),

    /// Target status requires a seller bonus.
    #[display("status `{_0}` requires a seller bonus")]
    SellerBonusRequired(#[error(not(source))] Status),

    /// Target status requires an intake-employee bonus.
    #[display("status `{_0}` requires an intake-employee bonus")]
    IntakeBonusRequired(#[error(not(source))] Status),

    /// Target status requires the total of bonuses.
    #[display("status `{_0}` requires the total of bonuses")]
    TotalBonusesRequired(#[error(not(source))] Status),

    /// Target status requires a strictly positive net profit.
    #[display("status `{_0}` requires a strictly positive net profit")]
    NetProfitNotPositive(#[error(not(source))] Status),

    /// Stated total of bonuses diverges from the sum of per-role bonuses.
    #[display(
        "total of bonuses ({stated}) doesn't match the sum of per-role \
         bonuses ({computed})"
    )]
    BonusSumMismatch {
        /// Stated [`Sale::total_bonuses`].
        stated: Money,

        /// Computed sum of the per-role bonuses.
        computed: Money,
    },

    /// Bonuses cannot exceed the net profit.
    #[display("bonuses ({total}) cannot exceed the net profit ({net_profit})")]
    BonusesExceedProfit {
        /// Sum of the per-role bonuses.
        total: Money,

        /// Net profit of the [`Sale`].
        net_profit: Money,
    },

    /// Commission cannot be issued before bonuses are.
    #[display(
        "cannot issue commission before bonuses are issued: \
         previous status must be `{}`",
        Status::BonusesIssued
    )]
    CommissionBeforeBonuses,
}

/// List of [`Violation`]s detected in a single [`Sale`] write.
#[derive(Clone, Debug, Eq, From, PartialEq)]
pub struct Violations(pub Vec<Violation>);

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(violations) = self;
        for (i, v) in violations.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// Marker type indicating a [`Vehicle`] hand-over.
#[derive(Clone, Copy, Debug)]
pub struct Closing;

/// [`DateTime`] when the [`Vehicle`] of a [`Sale`] was handed over.
pub type SaleDateTime = DateTimeOf<(Sale, Closing)>;

/// [`DateTime`] when a [`Sale`] was created.
pub type CreationDateTime = DateTimeOf<(Sale, unit::Creation)>;

/// [`DateTime`] when a [`Sale`] was last updated.
pub type UpdateDateTime = DateTimeOf<(Sale, unit::Update)>;
