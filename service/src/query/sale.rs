//! [`Query`] collection related to a single [`Sale`].

use common::operations::By;

use crate::domain::{sale, vehicle, Income, Sale};
#[cfg(doc)]
use crate::{domain::Vehicle, Query};

use super::DatabaseQuery;

/// Queries a [`Sale`] by its [`sale::Id`].
pub type ById = DatabaseQuery<By<Option<Sale>, sale::Id>>;

/// Queries a [`Sale`] by ID of the sold [`Vehicle`].
///
/// At most one [`Sale`] may reference a [`Vehicle`].
pub type ByVehicle = DatabaseQuery<By<Option<Sale>, vehicle::Id>>;

/// Queries the [`Income`] ledger entries recorded for a [`Sale`].
pub type Incomes = DatabaseQuery<By<Vec<Income>, sale::Id>>;
