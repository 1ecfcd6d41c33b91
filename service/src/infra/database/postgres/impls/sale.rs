//! [`Sale`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Delete, Insert, Lock, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{sale, vehicle, Sale},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

impl<C, IDs> Database<Select<By<HashMap<sale::Id, Sale>, IDs>>> for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[sale::Id]>,
{
    type Ok = HashMap<sale::Id, Sale>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<sale::Id, Sale>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[sale::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap();

        const SQL: &str = "\
            SELECT id, vehicle_id, customer_id, \
                   seller_id, intake_employee_id, manager_id, \
                   purchase_price, sale_price, net_profit, \
                   seller_bonus, intake_bonus, manager_bonus, total_bonuses, \
                   status, is_commission_paid, sale_date, is_active, \
                   created_at, updated_at \
            FROM sales \
            WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
            LIMIT $2::INT4";
        Ok(self
            .query(SQL, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let sale = sale_from_row(&row);
                (sale.id, sale)
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Sale>, sale::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<sale::Id, Sale>, [sale::Id; 1]>>,
        Ok = HashMap<sale::Id, Sale>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Sale>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Sale>, sale::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Select<By<Option<Sale>, vehicle::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<Option<Sale>, sale::Id>>,
        Ok = Option<Sale>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Sale>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Sale>, vehicle::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let vehicle_id: vehicle::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM sales \
            WHERE vehicle_id = $1::UUID \
            LIMIT 1";
        let Some(row) = self
            .query_opt(SQL, &[&vehicle_id])
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };

        self.execute(Select(By::new(row.get::<_, sale::Id>("id"))))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Insert<Sale>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Sale>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(sale): Insert<Sale>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(sale)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Sale>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(sale): Update<Sale>,
    ) -> Result<Self::Ok, Self::Err> {
        let Sale {
            id,
            vehicle_id,
            customer_id,
            seller_id,
            intake_employee_id,
            manager_id,
            purchase_price,
            sale_price,
            net_profit,
            seller_bonus,
            intake_bonus,
            manager_bonus,
            total_bonuses,
            status,
            is_commission_paid,
            sale_date,
            is_active,
            created_at,
            updated_at,
        } = sale;

        const SQL: &str = "\
            INSERT INTO sales (\
                id, vehicle_id, customer_id, \
                seller_id, intake_employee_id, manager_id, \
                purchase_price, sale_price, net_profit, \
                seller_bonus, intake_bonus, manager_bonus, total_bonuses, \
                status, is_commission_paid, sale_date, is_active, \
                created_at, updated_at \
            ) VALUES (\
                $1::UUID, $2::UUID, $3::UUID, \
                $4::UUID, $5::UUID, $6::UUID, \
                $7::NUMERIC, $8::NUMERIC, $9::NUMERIC, \
                $10::NUMERIC, $11::NUMERIC, $12::NUMERIC, $13::NUMERIC, \
                $14::INT2, $15::BOOL, $16::TIMESTAMPTZ, $17::BOOL, \
                $18::TIMESTAMPTZ, $19::TIMESTAMPTZ \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET vehicle_id = EXCLUDED.vehicle_id, \
                customer_id = EXCLUDED.customer_id, \
                seller_id = EXCLUDED.seller_id, \
                intake_employee_id = EXCLUDED.intake_employee_id, \
                manager_id = EXCLUDED.manager_id, \
                purchase_price = EXCLUDED.purchase_price, \
                sale_price = EXCLUDED.sale_price, \
                net_profit = EXCLUDED.net_profit, \
                seller_bonus = EXCLUDED.seller_bonus, \
                intake_bonus = EXCLUDED.intake_bonus, \
                manager_bonus = EXCLUDED.manager_bonus, \
                total_bonuses = EXCLUDED.total_bonuses, \
                status = EXCLUDED.status, \
                is_commission_paid = EXCLUDED.is_commission_paid, \
                sale_date = EXCLUDED.sale_date, \
                is_active = EXCLUDED.is_active, \
                created_at = EXCLUDED.created_at, \
                updated_at = EXCLUDED.updated_at";
        self.exec(
            SQL,
            &[
                &id,
                &vehicle_id,
                &customer_id,
                &seller_id,
                &intake_employee_id,
                &manager_id,
                &purchase_price,
                &sale_price,
                &net_profit,
                &seller_bonus,
                &intake_bonus,
                &manager_bonus,
                &total_bonuses,
                &status,
                &is_commission_paid,
                &sale_date,
                &is_active,
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<Sale>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(sale): Delete<Sale>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            DELETE FROM sales \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&sale.id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Sale, sale::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Sale, sale::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: sale::Id = by.into_inner();

        // Concurrent holders fail fast with `LOCK_NOT_AVAILABLE`, which is
        // reported as a transient error.
        const SQL: &str = "\
            SELECT id \
            FROM sales \
            WHERE id = $1::UUID \
            FOR UPDATE NOWAIT";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<HashMap<sale::Status, read::sale::TotalCount>, ()>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = HashMap<sale::Status, read::sale::TotalCount>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(_): Select<
            By<HashMap<sale::Status, read::sale::TotalCount>, ()>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT status, COUNT(*)::INT8 AS total \
            FROM sales \
            GROUP BY status";
        Ok(self
            .query(SQL, &[])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                (
                    row.get::<_, sale::Status>("status"),
                    row.get::<_, i64>("total").into(),
                )
            })
            .collect())
    }
}

impl<C> Database<Select<By<read::sale::Totals, ()>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = read::sale::Totals;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(_): Select<By<read::sale::Totals, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT COALESCE(SUM(sale_price), 0)::NUMERIC AS revenue, \
                   COALESCE(SUM(net_profit), 0)::NUMERIC AS profit, \
                   COALESCE(SUM(total_bonuses), 0)::NUMERIC AS bonuses \
            FROM sales";
        self.query_opt(SQL, &[])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| {
                let row = row.expect("always exists");
                read::sale::Totals {
                    revenue: row.get("revenue"),
                    profit: row.get("profit"),
                    bonuses: row.get("bonuses"),
                }
            })
    }
}

/// Builds a [`Sale`] out of the provided database `row`.
fn sale_from_row(row: &tokio_postgres::Row) -> Sale {
    Sale {
        id: row.get("id"),
        vehicle_id: row.get("vehicle_id"),
        customer_id: row.get("customer_id"),
        seller_id: row.get("seller_id"),
        intake_employee_id: row.get("intake_employee_id"),
        manager_id: row.get("manager_id"),
        purchase_price: row.get("purchase_price"),
        sale_price: row.get("sale_price"),
        net_profit: row.get("net_profit"),
        seller_bonus: row.get("seller_bonus"),
        intake_bonus: row.get("intake_bonus"),
        manager_bonus: row.get("manager_bonus"),
        total_bonuses: row.get("total_bonuses"),
        status: row.get("status"),
        is_commission_paid: row.get("is_commission_paid"),
        sale_date: row.get("sale_date"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
