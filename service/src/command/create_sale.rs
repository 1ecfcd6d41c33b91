//! [`Command`] for creating a new [`Sale`].

use std::collections::HashMap;

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        customer, employee, sale, vehicle, Customer, Employee, Sale, Vehicle,
    },
    infra::{database, Database},
    Service,
};

use super::{Command, Reference, References};

/// [`Command`] for creating a new [`Sale`].
///
/// A created [`Sale`] always starts in the [`sale::Status::OnApproval`].
#[derive(Clone, Debug)]
pub struct CreateSale {
    /// ID of the [`Vehicle`] being sold.
    pub vehicle_id: vehicle::Id,

    /// ID of the buying [`Customer`].
    pub customer_id: customer::Id,

    /// ID of the selling [`Employee`].
    pub seller_id: employee::Id,

    /// ID of the [`Employee`] who took the [`Vehicle`] in.
    pub intake_employee_id: employee::Id,

    /// ID of the supervising manager [`Employee`], if any.
    pub manager_id: Option<employee::Id>,

    /// Intake cost of the [`Vehicle`].
    pub purchase_price: Money,

    /// Price the [`Vehicle`] is sold for.
    pub sale_price: Money,

    /// [`DateTime`] when the [`Vehicle`] is handed over, if known.
    ///
    /// [`DateTime`]: common::DateTime
    pub sale_date: Option<sale::SaleDateTime>,

    /// Bonus of the selling [`Employee`].
    pub seller_bonus: Option<Money>,

    /// Bonus of the [`Employee`] who took the [`Vehicle`] in.
    pub intake_bonus: Option<Money>,

    /// Bonus of the supervising manager [`Employee`].
    pub manager_bonus: Option<Money>,

    /// Total of all the per-role bonuses.
    pub total_bonuses: Option<Money>,

    /// Indicator whether the new [`Sale`] is active.
    pub is_active: bool,
}

impl<Db> Command<CreateSale> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<HashMap<employee::Id, Employee>, Vec<employee::Id>>>,
            Ok = HashMap<employee::Id, Employee>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Customer>, customer::Id>>,
            Ok = Option<Customer>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Vehicle>, vehicle::Id>>,
            Ok = Option<Vehicle>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<Vehicle, vehicle::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Vehicle>, vehicle::Id>>,
            Ok = Option<Vehicle>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Sale>, vehicle::Id>>,
            Ok = Option<Sale>,
            Err = Traced<database::Error>,
        > + Database<Insert<Sale>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Sale;
    type Err = Traced<ExecutionError>;

    #[expect(clippy::too_many_lines, reason = "still readable")]
    async fn execute(&self, cmd: CreateSale) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateSale {
            vehicle_id,
            customer_id,
            seller_id,
            intake_employee_id,
            manager_id,
            purchase_price,
            sale_price,
            sale_date,
            seller_bonus,
            intake_bonus,
            manager_bonus,
            total_bonuses,
            is_active,
        } = cmd;

        let mut missing = Vec::new();

        let employee_ids = [Some(seller_id), Some(intake_employee_id)]
            .into_iter()
            .chain([manager_id])
            .flatten()
            .collect::<Vec<_>>();
        let employees = self
            .database()
            .execute(Select(By::<HashMap<employee::Id, Employee>, _>::new(
                employee_ids.clone(),
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        missing.extend(
            employee_ids
                .into_iter()
                .filter(|id| !employees.contains_key(id))
                .map(Reference::Employee),
        );

        let customer = self
            .database()
            .execute(Select(By::<Option<Customer>, _>::new(customer_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if customer.is_none() {
            missing.push(Reference::Customer(customer_id));
        }

        let vehicle = self
            .database()
            .execute(Select(By::<Option<Vehicle>, _>::new(vehicle_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if vehicle.is_none() {
            missing.push(Reference::Vehicle(vehicle_id));
        }

        if !missing.is_empty() {
            return Err(tracerr::new!(E::MissingReferences(References(
                missing
            ))));
        }

        let now = DateTime::now();
        let sale = Sale {
            id: sale::Id::new(),
            vehicle_id,
            customer_id,
            seller_id,
            intake_employee_id,
            manager_id,
            purchase_price,
            sale_price,
            net_profit: sale_price - purchase_price,
            seller_bonus,
            intake_bonus,
            manager_bonus,
            total_bonuses,
            status: sale::Status::OnApproval,
            is_commission_paid: false,
            sale_date,
            is_active,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };

        let violations = sale::bonus::check(&sale);
        if !violations.is_empty() {
            return Err(tracerr::new!(E::InvalidSale(sale::Violations(
                violations
            ))));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent sales of the same `Vehicle`.
        tx.execute(Lock(By::<Vehicle, _>::new(vehicle_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let vehicle = tx
            .execute(Select(By::<Option<Vehicle>, _>::new(vehicle_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| {
                E::MissingReferences(References(vec![Reference::Vehicle(
                    vehicle_id,
                )]))
            })
            .map_err(tracerr::wrap!())?;
        if vehicle.status == vehicle::Status::Sold {
            return Err(tracerr::new!(E::VehicleAlreadySold(vehicle_id)));
        }

        let existing = tx
            .execute(Select(By::<Option<Sale>, _>::new(vehicle_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if let Some(existing) = existing {
            return Err(if existing.status.is_terminal() {
                tracerr::new!(E::VehicleAlreadySold(vehicle_id))
            } else {
                tracerr::new!(E::VehicleSaleInProgress(vehicle_id))
            });
        }

        tx.execute(Insert(sale.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(sale)
    }
}

/// Error of [`CreateSale`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// New [`Sale`] violates business rules.
    #[display("`Sale` validation failed: {_0}")]
    InvalidSale(#[error(not(source))] sale::Violations),

    /// Some of the referenced entities do not exist.
    #[display("referenced entities do not exist: {_0}")]
    MissingReferences(#[error(not(source))] References),

    /// [`Vehicle`] with the provided ID is already sold.
    #[display("`Vehicle(id: {_0})` is already sold")]
    VehicleAlreadySold(#[error(not(source))] vehicle::Id),

    /// [`Vehicle`] with the provided ID has a [`Sale`] in progress.
    #[display("`Vehicle(id: {_0})` already has a `Sale` in progress")]
    VehicleSaleInProgress(#[error(not(source))] vehicle::Id),
}
