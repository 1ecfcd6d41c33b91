//! [`Command`] for updating a [`Sale`] and driving its lifecycle.

use std::collections::HashMap;

use common::{
    operations::{
        By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
    },
    DateTimeOf,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        customer, employee, income, sale, vehicle, Customer, Employee, Income,
        Sale, Vehicle,
    },
    infra::{database, Database},
    Service,
};

use super::{Command, Reference, References};

/// [`Command`] for updating a [`Sale`].
///
/// Status changes carried by the [`sale::Patch`] drive the sale lifecycle:
/// the transition is validated against the merged field set, and the side
/// effects of the entered [`sale::Status`] are executed in the same
/// transaction as the write.
#[derive(Clone, Debug)]
pub struct UpdateSale {
    /// ID of the [`Sale`] to update.
    pub id: sale::Id,

    /// [`sale::Patch`] to apply.
    pub patch: sale::Patch,
}

impl<Db> Command<UpdateSale> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Sale>, sale::Id>>,
            Ok = Option<Sale>,
            Err = Traced<database::Error>,
        > + Database<
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
    Transacted<Db>: Database<Lock<By<Sale, sale::Id>>, Err = Traced<database::Error>>
        + Database<
            Lock<By<Vehicle, vehicle::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Sale>, sale::Id>>,
            Ok = Option<Sale>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Sale>, vehicle::Id>>,
            Ok = Option<Sale>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Vehicle>, vehicle::Id>>,
            Ok = Option<Vehicle>,
            Err = Traced<database::Error>,
        > + Database<Insert<Income>, Err = Traced<database::Error>>
        + Database<Update<Sale>, Err = Traced<database::Error>>
        + Database<Update<Vehicle>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Sale;
    type Err = Traced<ExecutionError>;

    #[expect(clippy::too_many_lines, reason = "still readable")]
    async fn execute(&self, cmd: UpdateSale) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateSale { id, patch } = cmd;

        let sale = self
            .database()
            .execute(Select(By::<Option<Sale>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::SaleNotExists(id))
            .map_err(tracerr::wrap!())?;

        if patch.changes_references(&sale) {
            self.validate_references(&patch)
                .await
                .map_err(tracerr::wrap!())?;
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent sales of the same `Vehicle`.
        let vehicle_id = patch.vehicle_id.unwrap_or(sale.vehicle_id);
        tx.execute(Lock(By::<Vehicle, _>::new(vehicle_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        // Avoid concurrent updates of the same `Sale`.
        tx.execute(Lock(By::<Sale, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let sale = tx
            .execute(Select(By::<Option<Sale>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::SaleNotExists(id))
            .map_err(tracerr::wrap!())?;

        let mut merged = patch.apply_to(&sale);

        // Re-entry of an already applied update is a no-op success.
        if merged.same_content(&sale) {
            tx.execute(Commit)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
            return Ok(sale);
        }

        if sale.status.is_terminal() {
            return Err(tracerr::new!(E::InvalidSale(sale::Violations(
                vec![sale::Violation::TerminalStatus(sale.status)],
            ))));
        }

        let mut violations = sale::transition::check(sale.status, &merged);
        if patch.touches_bonuses()
            || matches!(
                merged.status,
                sale::Status::BonusesIssued | sale::Status::CommissionIssued,
            )
        {
            violations.extend(sale::bonus::check(&merged));
        }
        if !violations.is_empty() {
            return Err(tracerr::new!(E::InvalidSale(sale::Violations(
                violations
            ))));
        }

        if merged.vehicle_id != sale.vehicle_id {
            let other = tx
                .execute(Select(By::<Option<Sale>, _>::new(merged.vehicle_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if let Some(other) = other.filter(|o| o.id != merged.id) {
                return Err(if other.status.is_terminal() {
                    tracerr::new!(E::VehicleAlreadySold(merged.vehicle_id))
                } else {
                    tracerr::new!(E::VehicleSaleInProgress(merged.vehicle_id))
                });
            }
        }

        let entered = |status: sale::Status| {
            merged.status == status && sale.status != status
        };

        if entered(sale::Status::Sold)
            || entered(sale::Status::BonusesIssued)
        {
            let vehicle = tx
                .execute(Select(By::<Option<Vehicle>, _>::new(
                    merged.vehicle_id,
                )))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or_else(|| {
                    E::MissingReferences(References(vec![
                        Reference::Vehicle(merged.vehicle_id),
                    ]))
                })
                .map_err(tracerr::wrap!())?;

            if entered(sale::Status::Sold) {
                // Only a `Vehicle` sold outside this `Sale` is a conflict:
                // stepping back from `Sold` and forward again re-enters it on
                // the own `Vehicle`.
                if vehicle.status == vehicle::Status::Sold
                    && merged.vehicle_id != sale.vehicle_id
                {
                    return Err(tracerr::new!(E::VehicleAlreadySold(
                        merged.vehicle_id
                    )));
                }
                let mut vehicle = vehicle.clone();
                vehicle.status = vehicle::Status::Sold;
                tx.execute(Update(vehicle))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
            }

            if entered(sale::Status::BonusesIssued) {
                for income in bonus_incomes(&merged, &vehicle) {
                    tx.execute(Insert(income))
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))
                        .map(drop)?;
                }
            }
        }

        if entered(sale::Status::CommissionIssued) {
            merged.is_commission_paid = true;
        }

        tx.execute(Update(merged.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let stored = tx
            .execute(Select(By::<Option<Sale>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::SaleNotExists(id))
            .map_err(tracerr::wrap!())?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(stored)
    }
}

impl<Db> Service<Db>
where
    Db: Database<
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
{
    /// Validates existence of the entities referenced by the [`sale::Patch`].
    async fn validate_references(
        &self,
        patch: &sale::Patch,
    ) -> Result<(), Traced<ExecutionError>> {
        use ExecutionError as E;

        let mut missing = Vec::new();

        let employee_ids =
            [patch.seller_id, patch.intake_employee_id, patch.manager_id]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>();
        if !employee_ids.is_empty() {
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
        }

        if let Some(customer_id) = patch.customer_id {
            let customer = self
                .database()
                .execute(Select(By::<Option<Customer>, _>::new(customer_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if customer.is_none() {
                missing.push(Reference::Customer(customer_id));
            }
        }

        if let Some(vehicle_id) = patch.vehicle_id {
            let vehicle = self
                .database()
                .execute(Select(By::<Option<Vehicle>, _>::new(vehicle_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if vehicle.is_none() {
                missing.push(Reference::Vehicle(vehicle_id));
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(tracerr::new!(E::MissingReferences(References(missing))))
        }
    }
}

/// Builds the [`income::Kind::SaleBonus`] ledger entries credited when a
/// [`Sale`] enters the [`sale::Status::BonusesIssued`].
///
/// One entry per role with a strictly positive bonus.
fn bonus_incomes(sale: &Sale, vehicle: &Vehicle) -> Vec<Income> {
    let car = format!("{} {}", vehicle.brand_code, vehicle.model_code);

    let roles = [
        (
            Some(sale.seller_id),
            sale.seller_bonus,
            format!("Bonus for selling {car}"),
        ),
        (
            Some(sale.intake_employee_id),
            sale.intake_bonus,
            format!("Bonus for bringing in {car}"),
        ),
        (
            sale.manager_id,
            sale.manager_bonus,
            format!("Manager bonus for selling {car}"),
        ),
    ];

    roles
        .into_iter()
        .filter_map(|(employee_id, bonus, description)| {
            let employee_id = employee_id?;
            let amount = bonus.filter(common::Money::is_positive)?;
            Some(Income {
                id: income::Id::new(),
                employee_id,
                sale_id: Some(sale.id),
                amount,
                kind: income::Kind::SaleBonus,
                description: Some(income::Description(description)),
                is_paid: false,
                paid_at: None,
                created_at: DateTimeOf::now(),
            })
        })
        .collect()
}

/// Error of [`UpdateSale`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Updated [`Sale`] violates business rules.
    #[display("`Sale` validation failed: {_0}")]
    InvalidSale(#[error(not(source))] sale::Violations),

    /// Some of the referenced entities do not exist.
    #[display("referenced entities do not exist: {_0}")]
    MissingReferences(#[error(not(source))] References),

    /// [`Sale`] with the provided ID does not exist.
    #[display("`Sale(id: {_0})` does not exist")]
    SaleNotExists(#[error(not(source))] sale::Id),

    /// [`Vehicle`] with the provided ID is already sold.
    #[display("`Vehicle(id: {_0})` is already sold")]
    VehicleAlreadySold(#[error(not(source))] vehicle::Id),

    /// [`Vehicle`] with the provided ID has a [`Sale`] in progress.
    #[display("`Vehicle(id: {_0})` already has a `Sale` in progress")]
    VehicleSaleInProgress(#[error(not(source))] vehicle::Id),
}
