//! [`Command`] definition.

pub mod create_sale;
pub mod remove_sale;
pub mod toggle_sale_activity;
pub mod update_sale;

use std::fmt;

use derive_more::From;

use crate::domain::{customer, employee, vehicle};
#[cfg(doc)]
use crate::domain::{Customer, Employee, Sale, Vehicle};

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    create_sale::CreateSale, remove_sale::RemoveSale,
    toggle_sale_activity::ToggleSaleActivity, update_sale::UpdateSale,
};

/// Reference of a [`Sale`] to another entity.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Reference {
    /// Referenced [`Customer`].
    Customer(customer::Id),

    /// Referenced [`Employee`].
    Employee(employee::Id),

    /// Referenced [`Vehicle`].
    Vehicle(vehicle::Id),
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Customer(id) => write!(f, "`Customer(id: {id})`"),
            Self::Employee(id) => write!(f, "`Employee(id: {id})`"),
            Self::Vehicle(id) => write!(f, "`Vehicle(id: {id})`"),
        }
    }
}

/// List of [`Reference`]s a [`Sale`] points at.
#[derive(Clone, Debug, Eq, From, PartialEq)]
pub struct References(pub Vec<Reference>);

impl fmt::Display for References {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(refs) = self;
        for (i, r) in refs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{r}")?;
        }
        Ok(())
    }
}
