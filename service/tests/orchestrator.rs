//! Sale lifecycle tests running commands against an in-memory database fake.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use common::{
    operations::{By, Commit, Delete, Insert, Lock, Select, Transact, Update},
    DateTimeOf, Handler, Money,
};
use service::{
    command::{self, Command as _},
    domain::{
        customer, employee, income, sale, vehicle, Customer, Employee,
        Income, Sale, Vehicle,
    },
    infra::database,
    query, read, Service,
};
use tracerr::Traced;

/// Backing state of the [`Fake`] database.
#[derive(Clone, Debug, Default)]
struct Store {
    customers: HashMap<customer::Id, Customer>,
    employees: HashMap<employee::Id, Employee>,
    vehicles: HashMap<vehicle::Id, Vehicle>,
    sales: HashMap<sale::Id, Sale>,
    incomes: Vec<Income>,
}

/// In-memory database fake.
///
/// [`Transact`] clones the whole [`Store`], the transaction mutates the
/// clone, and [`Commit`] swaps it back in. A discarded transaction leaves
/// the shared [`Store`] untouched.
#[derive(Clone, Debug, Default)]
struct Fake {
    store: Arc<Mutex<Store>>,
    fail_vehicle_update: Arc<AtomicBool>,
}

impl Fake {
    fn store(&self) -> Store {
        self.store.lock().unwrap().clone()
    }
}

/// Open transaction of the [`Fake`] database.
#[derive(Clone, Debug)]
struct FakeTx {
    shared: Arc<Mutex<Store>>,
    work: Arc<Mutex<Store>>,
    fail_vehicle_update: Arc<AtomicBool>,
}

impl Handler<Transact> for Fake {
    type Ok = FakeTx;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(FakeTx {
            shared: Arc::clone(&self.store),
            work: Arc::new(Mutex::new(self.store.lock().unwrap().clone())),
            fail_vehicle_update: Arc::clone(&self.fail_vehicle_update),
        })
    }
}

impl Handler<Select<By<Option<Sale>, sale::Id>>> for Fake {
    type Ok = Option<Sale>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Sale>, sale::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.store.lock().unwrap().sales.get(&by.into_inner()).cloned())
    }
}

impl Handler<Select<By<Option<Sale>, vehicle::Id>>> for Fake {
    type Ok = Option<Sale>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Sale>, vehicle::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let vehicle_id = by.into_inner();
        Ok(self
            .store
            .lock()
            .unwrap()
            .sales
            .values()
            .find(|s| s.vehicle_id == vehicle_id)
            .cloned())
    }
}

impl Handler<Select<By<HashMap<employee::Id, Employee>, Vec<employee::Id>>>>
    for Fake
{
    type Ok = HashMap<employee::Id, Employee>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<HashMap<employee::Id, Employee>, Vec<employee::Id>>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let store = self.store.lock().unwrap();
        Ok(by
            .into_inner()
            .into_iter()
            .filter_map(|id| store.employees.get(&id).cloned().map(|e| (id, e)))
            .collect())
    }
}

impl Handler<Select<By<Option<Customer>, customer::Id>>> for Fake {
    type Ok = Option<Customer>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Customer>, customer::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self
            .store
            .lock()
            .unwrap()
            .customers
            .get(&by.into_inner())
            .cloned())
    }
}

impl Handler<Select<By<Option<Vehicle>, vehicle::Id>>> for Fake {
    type Ok = Option<Vehicle>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Vehicle>, vehicle::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self
            .store
            .lock()
            .unwrap()
            .vehicles
            .get(&by.into_inner())
            .cloned())
    }
}

impl Handler<Select<By<Vec<Income>, sale::Id>>> for Fake {
    type Ok = Vec<Income>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Income>, sale::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let sale_id = by.into_inner();
        Ok(self
            .store
            .lock()
            .unwrap()
            .incomes
            .iter()
            .filter(|i| i.sale_id == Some(sale_id))
            .cloned()
            .collect())
    }
}

impl Handler<Select<By<HashMap<sale::Status, read::sale::TotalCount>, ()>>>
    for Fake
{
    type Ok = HashMap<sale::Status, read::sale::TotalCount>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<HashMap<sale::Status, read::sale::TotalCount>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut counts = HashMap::<sale::Status, i64>::new();
        for sale in self.store.lock().unwrap().sales.values() {
            *counts.entry(sale.status).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(status, count)| (status, count.into()))
            .collect())
    }
}

impl Handler<Select<By<read::sale::Totals, ()>>> for Fake {
    type Ok = read::sale::Totals;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<read::sale::Totals, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        let store = self.store.lock().unwrap();
        Ok(read::sale::Totals {
            revenue: store.sales.values().map(|s| s.sale_price).sum(),
            profit: store.sales.values().map(|s| s.net_profit).sum(),
            bonuses: store
                .sales
                .values()
                .filter_map(|s| s.total_bonuses)
                .sum(),
        })
    }
}

impl Handler<Lock<By<Vehicle, vehicle::Id>>> for FakeTx {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Vehicle, vehicle::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Handler<Lock<By<Sale, sale::Id>>> for FakeTx {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Sale, sale::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Handler<Select<By<Option<Sale>, sale::Id>>> for FakeTx {
    type Ok = Option<Sale>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Sale>, sale::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.work.lock().unwrap().sales.get(&by.into_inner()).cloned())
    }
}

impl Handler<Select<By<Option<Sale>, vehicle::Id>>> for FakeTx {
    type Ok = Option<Sale>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Sale>, vehicle::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let vehicle_id = by.into_inner();
        Ok(self
            .work
            .lock()
            .unwrap()
            .sales
            .values()
            .find(|s| s.vehicle_id == vehicle_id)
            .cloned())
    }
}

impl Handler<Select<By<Option<Vehicle>, vehicle::Id>>> for FakeTx {
    type Ok = Option<Vehicle>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Vehicle>, vehicle::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self
            .work
            .lock()
            .unwrap()
            .vehicles
            .get(&by.into_inner())
            .cloned())
    }
}

impl Handler<Insert<Sale>> for FakeTx {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(sale): Insert<Sale>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(self.work.lock().unwrap().sales.insert(sale.id, sale));
        Ok(())
    }
}

impl Handler<Insert<Income>> for FakeTx {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(income): Insert<Income>,
    ) -> Result<Self::Ok, Self::Err> {
        self.work.lock().unwrap().incomes.push(income);
        Ok(())
    }
}

impl Handler<Update<Sale>> for FakeTx {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(sale): Update<Sale>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(self.work.lock().unwrap().sales.insert(sale.id, sale));
        Ok(())
    }
}

impl Handler<Update<Vehicle>> for FakeTx {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(vehicle): Update<Vehicle>,
    ) -> Result<Self::Ok, Self::Err> {
        if self.fail_vehicle_update.load(Ordering::SeqCst) {
            return Err(tracerr::new!(database::Error::Unavailable));
        }
        drop(self.work.lock().unwrap().vehicles.insert(vehicle.id, vehicle));
        Ok(())
    }
}

impl Handler<Delete<Sale>> for FakeTx {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(sale): Delete<Sale>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(self.work.lock().unwrap().sales.remove(&sale.id));
        Ok(())
    }
}

impl Handler<Commit> for FakeTx {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        *self.shared.lock().unwrap() = self.work.lock().unwrap().clone();
        Ok(())
    }
}

/// Pre-populated [`Fake`] with a [`Service`] on top of it.
struct World {
    fake: Fake,
    service: Service<Fake>,
    vehicle_id: vehicle::Id,
    customer_id: customer::Id,
    seller_id: employee::Id,
    intake_id: employee::Id,
    manager_id: employee::Id,
}

fn world() -> World {
    let fake = Fake::default();

    let customer_id = customer::Id::new();
    let seller_id = employee::Id::new();
    let intake_id = employee::Id::new();
    let manager_id = employee::Id::new();
    let vehicle_id = vehicle::Id::new();

    {
        let mut store = fake.store.lock().unwrap();
        drop(store.customers.insert(
            customer_id,
            Customer {
                id: customer_id,
                full_name: customer::Name::new("John Buyer").unwrap(),
                created_at: DateTimeOf::now(),
            },
        ));
        for (id, name) in [
            (seller_id, "Sally Seller"),
            (intake_id, "Ivan Intake"),
            (manager_id, "Mary Manager"),
        ] {
            drop(store.employees.insert(
                id,
                Employee {
                    id,
                    full_name: employee::Name::new(name).unwrap(),
                    created_at: DateTimeOf::now(),
                },
            ));
        }
        drop(store.vehicles.insert(
            vehicle_id,
            Vehicle {
                id: vehicle_id,
                brand_code: vehicle::BrandCode("BMW".into()),
                model_code: vehicle::ModelCode("X5".into()),
                purchase_price: Money::from(5_000_000),
                status: vehicle::Status::InStock,
                created_at: DateTimeOf::now(),
            },
        ));
    }

    World {
        service: Service::new(fake.clone()),
        fake,
        vehicle_id,
        customer_id,
        seller_id,
        intake_id,
        manager_id,
    }
}

impl World {
    fn create_cmd(&self) -> command::CreateSale {
        command::CreateSale {
            vehicle_id: self.vehicle_id,
            customer_id: self.customer_id,
            seller_id: self.seller_id,
            intake_employee_id: self.intake_id,
            manager_id: Some(self.manager_id),
            purchase_price: Money::from(5_000_000),
            sale_price: Money::from(6_000_000),
            sale_date: Some(DateTimeOf::now()),
            seller_bonus: None,
            intake_bonus: None,
            manager_bonus: None,
            total_bonuses: None,
            is_active: true,
        }
    }

    async fn create(&self) -> Sale {
        self.service.execute(self.create_cmd()).await.unwrap()
    }

    async fn advance(
        &self,
        id: sale::Id,
        patch: sale::Patch,
    ) -> Result<Sale, Traced<command::update_sale::ExecutionError>> {
        self.service.execute(command::UpdateSale { id, patch }).await
    }
}

fn status_patch(status: sale::Status) -> sale::Patch {
    sale::Patch {
        status: Some(status),
        ..sale::Patch::default()
    }
}

#[tokio::test]
async fn creates_sale_on_approval() {
    let w = world();

    let sale = w.create().await;

    assert_eq!(sale.status, sale::Status::OnApproval);
    assert_eq!(sale.net_profit, Money::from(1_000_000));
    assert!(!sale.is_commission_paid);

    let store = w.fake.store();
    assert!(store.sales.contains_key(&sale.id));
    assert_eq!(
        store.vehicles[&w.vehicle_id].status,
        vehicle::Status::InStock,
    );
}

#[tokio::test]
async fn rejects_creation_for_missing_references() {
    let w = world();

    let mut cmd = w.create_cmd();
    cmd.customer_id = customer::Id::new();
    cmd.manager_id = Some(employee::Id::new());

    let err = w.service.execute(cmd).await.unwrap_err();
    match err.as_ref() {
        command::create_sale::ExecutionError::MissingReferences(refs) => {
            assert_eq!(refs.0.len(), 2);
        }
        e => panic!("unexpected error: {e}"),
    }
    assert!(w.fake.store().sales.is_empty());
}

#[tokio::test]
async fn rejects_second_sale_for_same_vehicle() {
    let w = world();

    _ = w.create().await;

    let err = w.service.execute(w.create_cmd()).await.unwrap_err();
    assert!(matches!(
        err.as_ref(),
        command::create_sale::ExecutionError::VehicleSaleInProgress(_),
    ));
    assert_eq!(w.fake.store().sales.len(), 1);
}

#[tokio::test]
async fn rejects_new_sale_for_already_sold_vehicle() {
    let w = world();

    let sale = w.create().await;
    let sale = w
        .advance(sale.id, status_patch(sale::Status::OnProcessing))
        .await
        .unwrap();
    let sale = w
        .advance(sale.id, status_patch(sale::Status::Sold))
        .await
        .unwrap();
    let mut patch = status_patch(sale::Status::BonusesIssued);
    patch.seller_bonus = Some(Money::from(200_000));
    patch.intake_bonus = Some(Money::from(100_000));
    patch.total_bonuses = Some(Money::from(300_000));
    let sale = w.advance(sale.id, patch).await.unwrap();
    _ = w
        .advance(sale.id, status_patch(sale::Status::CommissionIssued))
        .await
        .unwrap();

    let err = w.service.execute(w.create_cmd()).await.unwrap_err();
    assert!(matches!(
        err.as_ref(),
        command::create_sale::ExecutionError::VehicleAlreadySold(_),
    ));
    assert_eq!(w.fake.store().sales.len(), 1);
}

#[tokio::test]
async fn walks_full_lifecycle() {
    let w = world();

    let sale = w.create().await;

    let sale = w
        .advance(sale.id, status_patch(sale::Status::OnProcessing))
        .await
        .unwrap();
    assert_eq!(sale.status, sale::Status::OnProcessing);

    let sale = w
        .advance(sale.id, status_patch(sale::Status::Sold))
        .await
        .unwrap();
    assert_eq!(sale.status, sale::Status::Sold);
    assert_eq!(
        w.fake.store().vehicles[&w.vehicle_id].status,
        vehicle::Status::Sold,
    );

    let mut patch = status_patch(sale::Status::BonusesIssued);
    patch.seller_bonus = Some(Money::from(200_000));
    patch.intake_bonus = Some(Money::from(100_000));
    patch.total_bonuses = Some(Money::from(300_000));
    let sale = w.advance(sale.id, patch).await.unwrap();
    assert_eq!(sale.status, sale::Status::BonusesIssued);

    let store = w.fake.store();
    assert_eq!(store.incomes.len(), 2);
    for income in &store.incomes {
        assert_eq!(income.kind, income::Kind::SaleBonus);
        assert_eq!(income.sale_id, Some(sale.id));
        assert!(!income.is_paid);
    }
    let descriptions = store
        .incomes
        .iter()
        .map(|i| i.description.clone().unwrap().0)
        .collect::<Vec<_>>();
    assert!(descriptions.contains(&"Bonus for selling BMW X5".to_owned()));
    assert!(descriptions.contains(&"Bonus for bringing in BMW X5".to_owned()));

    let sale = w
        .advance(sale.id, status_patch(sale::Status::CommissionIssued))
        .await
        .unwrap();
    assert_eq!(sale.status, sale::Status::CommissionIssued);
    assert!(sale.is_commission_paid);
    // Commission payout is a flag only, not a ledger entry.
    assert_eq!(w.fake.store().incomes.len(), 2);
}

#[tokio::test]
async fn credits_manager_bonus_when_present() {
    let w = world();

    let sale = w.create().await;
    let sale = w
        .advance(sale.id, status_patch(sale::Status::OnProcessing))
        .await
        .unwrap();
    let sale = w
        .advance(sale.id, status_patch(sale::Status::Sold))
        .await
        .unwrap();

    let mut patch = status_patch(sale::Status::BonusesIssued);
    patch.seller_bonus = Some(Money::from(200_000));
    patch.intake_bonus = Some(Money::from(100_000));
    patch.manager_bonus = Some(Money::from(50_000));
    patch.total_bonuses = Some(Money::from(350_000));
    _ = w.advance(sale.id, patch).await.unwrap();

    let store = w.fake.store();
    assert_eq!(store.incomes.len(), 3);
    assert!(store.incomes.iter().any(|i| {
        i.employee_id == w.manager_id
            && i.amount == Money::from(50_000)
            && i.description.as_ref().is_some_and(|d| {
                d.0 == "Manager bonus for selling BMW X5"
            })
    }));
}

#[tokio::test]
async fn rejects_skipping_lifecycle_steps() {
    let w = world();

    let sale = w.create().await;

    let mut patch = status_patch(sale::Status::BonusesIssued);
    patch.seller_bonus = Some(Money::from(200_000));
    patch.intake_bonus = Some(Money::from(100_000));
    patch.total_bonuses = Some(Money::from(300_000));
    let err = w.advance(sale.id, patch).await.unwrap_err();

    match err.as_ref() {
        command::update_sale::ExecutionError::InvalidSale(violations) => {
            assert!(violations.0.iter().any(|v| matches!(
                v,
                sale::Violation::TransitionNotAllowed { .. },
            )));
        }
        e => panic!("unexpected error: {e}"),
    }
    assert_eq!(
        w.fake.store().sales[&sale.id].status,
        sale::Status::OnApproval,
    );
}

#[tokio::test]
async fn rejects_inconsistent_bonuses() {
    let w = world();

    let sale = w.create().await;
    let sale = w
        .advance(sale.id, status_patch(sale::Status::OnProcessing))
        .await
        .unwrap();
    let sale = w
        .advance(sale.id, status_patch(sale::Status::Sold))
        .await
        .unwrap();

    let mut patch = status_patch(sale::Status::BonusesIssued);
    patch.seller_bonus = Some(Money::from(200_000));
    patch.intake_bonus = Some(Money::from(100_000));
    patch.total_bonuses = Some(Money::from(999_999));
    let err = w.advance(sale.id, patch).await.unwrap_err();
    match err.as_ref() {
        command::update_sale::ExecutionError::InvalidSale(violations) => {
            assert!(violations.0.iter().any(|v| matches!(
                v,
                sale::Violation::BonusSumMismatch { .. },
            )));
        }
        e => panic!("unexpected error: {e}"),
    }

    let mut patch = status_patch(sale::Status::BonusesIssued);
    patch.seller_bonus = Some(Money::from(900_000));
    patch.intake_bonus = Some(Money::from(200_000));
    patch.total_bonuses = Some(Money::from(1_100_000));
    let err = w.advance(sale.id, patch).await.unwrap_err();
    match err.as_ref() {
        command::update_sale::ExecutionError::InvalidSale(violations) => {
            assert!(violations.0.iter().any(|v| matches!(
                v,
                sale::Violation::BonusesExceedProfit { .. },
            )));
        }
        e => panic!("unexpected error: {e}"),
    }

    assert!(w.fake.store().incomes.is_empty());
}

#[tokio::test]
async fn reenters_current_status_as_noop() {
    let w = world();

    let sale = w.create().await;
    let sale = w
        .advance(sale.id, status_patch(sale::Status::OnProcessing))
        .await
        .unwrap();
    let sold = w
        .advance(sale.id, status_patch(sale::Status::Sold))
        .await
        .unwrap();

    // Same transition again must succeed without any new side effects.
    let again = w
        .advance(sale.id, status_patch(sale::Status::Sold))
        .await
        .unwrap();
    assert_eq!(again.status, sale::Status::Sold);
    assert_eq!(again.updated_at, sold.updated_at);
    assert!(w.fake.store().incomes.is_empty());
}

#[tokio::test]
async fn steps_back_from_sold_and_sells_again() {
    let w = world();

    let sale = w.create().await;
    let sale = w
        .advance(sale.id, status_patch(sale::Status::OnProcessing))
        .await
        .unwrap();
    let sale = w
        .advance(sale.id, status_patch(sale::Status::Sold))
        .await
        .unwrap();

    // Stepping back keeps the vehicle sold.
    let sale = w
        .advance(sale.id, status_patch(sale::Status::OnProcessing))
        .await
        .unwrap();
    assert_eq!(sale.status, sale::Status::OnProcessing);
    assert_eq!(
        w.fake.store().vehicles[&w.vehicle_id].status,
        vehicle::Status::Sold,
    );

    // The own vehicle being sold is not a conflict on re-entry.
    let sale = w
        .advance(sale.id, status_patch(sale::Status::Sold))
        .await
        .unwrap();
    assert_eq!(sale.status, sale::Status::Sold);
    assert_eq!(
        w.fake.store().vehicles[&w.vehicle_id].status,
        vehicle::Status::Sold,
    );
}

#[tokio::test]
async fn keeps_terminal_sale_immutable() {
    let w = world();

    let sale = w.create().await;
    let sale = w
        .advance(sale.id, status_patch(sale::Status::OnProcessing))
        .await
        .unwrap();
    let sale = w
        .advance(sale.id, status_patch(sale::Status::Sold))
        .await
        .unwrap();
    let mut patch = status_patch(sale::Status::BonusesIssued);
    patch.seller_bonus = Some(Money::from(200_000));
    patch.intake_bonus = Some(Money::from(100_000));
    patch.total_bonuses = Some(Money::from(300_000));
    let sale = w.advance(sale.id, patch).await.unwrap();
    let sale = w
        .advance(sale.id, status_patch(sale::Status::CommissionIssued))
        .await
        .unwrap();

    let patch = sale::Patch {
        sale_price: Some(Money::from(7_000_000)),
        ..sale::Patch::default()
    };
    let err = w.advance(sale.id, patch).await.unwrap_err();
    match err.as_ref() {
        command::update_sale::ExecutionError::InvalidSale(violations) => {
            assert!(violations.0.iter().any(|v| matches!(
                v,
                sale::Violation::TerminalStatus(_),
            )));
        }
        e => panic!("unexpected error: {e}"),
    }

    // Re-sending the final transition is still a no-op success.
    let again = w
        .advance(sale.id, status_patch(sale::Status::CommissionIssued))
        .await
        .unwrap();
    assert_eq!(again.updated_at, sale.updated_at);
}

#[tokio::test]
async fn rolls_back_all_side_effects_on_failure() {
    let w = world();

    let sale = w.create().await;
    let sale = w
        .advance(sale.id, status_patch(sale::Status::OnProcessing))
        .await
        .unwrap();

    w.fake.fail_vehicle_update.store(true, Ordering::SeqCst);
    let err = w
        .advance(sale.id, status_patch(sale::Status::Sold))
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        command::update_sale::ExecutionError::Db(database::Error::Unavailable),
    ));

    // The vehicle write failed mid-transaction, so nothing was applied.
    let store = w.fake.store();
    assert_eq!(store.sales[&sale.id].status, sale::Status::OnProcessing);
    assert_eq!(
        store.vehicles[&w.vehicle_id].status,
        vehicle::Status::InStock,
    );
    assert!(store.incomes.is_empty());

    w.fake.fail_vehicle_update.store(false, Ordering::SeqCst);
    let sale = w
        .advance(sale.id, status_patch(sale::Status::Sold))
        .await
        .unwrap();
    assert_eq!(sale.status, sale::Status::Sold);
}

#[tokio::test]
async fn toggles_activity() {
    let w = world();

    let sale = w.create().await;
    assert!(sale.is_active);

    let toggled = w
        .service
        .execute(command::ToggleSaleActivity { id: sale.id })
        .await
        .unwrap();
    assert!(!toggled.is_active);

    let toggled = w
        .service
        .execute(command::ToggleSaleActivity { id: sale.id })
        .await
        .unwrap();
    assert!(toggled.is_active);
}

#[tokio::test]
async fn removes_sale_keeping_income_ledger() {
    let w = world();

    let sale = w.create().await;
    let sale = w
        .advance(sale.id, status_patch(sale::Status::OnProcessing))
        .await
        .unwrap();
    let sale = w
        .advance(sale.id, status_patch(sale::Status::Sold))
        .await
        .unwrap();
    let mut patch = status_patch(sale::Status::BonusesIssued);
    patch.seller_bonus = Some(Money::from(200_000));
    patch.intake_bonus = Some(Money::from(100_000));
    patch.total_bonuses = Some(Money::from(300_000));
    let sale = w.advance(sale.id, patch).await.unwrap();

    let removed = w
        .service
        .execute(command::RemoveSale { id: sale.id })
        .await
        .unwrap();
    assert_eq!(removed.id, sale.id);

    let store = w.fake.store();
    assert!(!store.sales.contains_key(&sale.id));
    assert_eq!(store.incomes.len(), 2);

    let err = w
        .service
        .execute(command::RemoveSale { id: sale.id })
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        command::remove_sale::ExecutionError::SaleNotExists(_),
    ));
}

#[tokio::test]
async fn queries_sales_and_incomes() {
    let w = world();

    let sale = w.create().await;

    let by_id = w
        .service
        .execute(query::sale::ById::by(sale.id))
        .await
        .unwrap();
    assert_eq!(by_id.map(|s| s.id), Some(sale.id));

    let by_vehicle = w
        .service
        .execute(query::sale::ByVehicle::by(w.vehicle_id))
        .await
        .unwrap();
    assert_eq!(by_vehicle.map(|s| s.id), Some(sale.id));

    let incomes = w
        .service
        .execute(query::sale::Incomes::by(sale.id))
        .await
        .unwrap();
    assert!(incomes.is_empty());
}

#[tokio::test]
async fn reports_stats() {
    let w = world();

    let empty = w
        .service
        .execute(query::report::sales::Stats)
        .await
        .unwrap();
    assert_eq!(empty, query::report::sales::Output::default());

    let sale = w.create().await;
    let sale = w
        .advance(sale.id, status_patch(sale::Status::OnProcessing))
        .await
        .unwrap();
    _ = w
        .advance(sale.id, status_patch(sale::Status::Sold))
        .await
        .unwrap();

    let stats = w
        .service
        .execute(query::report::sales::Stats)
        .await
        .unwrap();
    assert_eq!(i64::from(stats.total), 1);
    assert_eq!(
        stats.by_status.get(&sale::Status::Sold).copied().map(i64::from),
        Some(1),
    );
    assert_eq!(stats.totals.revenue, Money::from(6_000_000));
    assert_eq!(stats.totals.profit, Money::from(1_000_000));
    assert_eq!(stats.totals.bonuses, Money::ZERO);
}
