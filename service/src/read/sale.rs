//! [`Sale`] read models definitions.

use common::Money;
use derive_more::{Display, From, Into};

#[cfg(doc)]
use crate::domain::Sale;

/// Total count of [`Sale`]s.
#[derive(
    Clone, Copy, Debug, Default, Display, Eq, From, Hash, Into, PartialEq,
)]
pub struct TotalCount(i64);

/// Money totals aggregated over [`Sale`]s.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Totals {
    /// Sum of [`Sale::sale_price`]s.
    pub revenue: Money,

    /// Sum of [`Sale::net_profit`]s.
    pub profit: Money,

    /// Sum of [`Sale::total_bonuses`]es.
    pub bonuses: Money,
}
