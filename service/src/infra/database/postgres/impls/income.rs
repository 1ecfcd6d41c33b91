//! [`Income`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::{sale, Income},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Insert<Income>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(income): Insert<Income>,
    ) -> Result<Self::Ok, Self::Err> {
        let Income {
            id,
            employee_id,
            sale_id,
            amount,
            kind,
            description,
            is_paid,
            paid_at,
            created_at,
        } = income;

        const SQL: &str = "\
            INSERT INTO employee_incomes (\
                id, employee_id, sale_id, amount, kind, description, \
                is_paid, paid_at, created_at \
            ) VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::NUMERIC, $5::INT2, \
                $6::VARCHAR, $7::BOOL, $8::TIMESTAMPTZ, $9::TIMESTAMPTZ \
            )";
        self.exec(
            SQL,
            &[
                &id,
                &employee_id,
                &sale_id,
                &amount,
                &kind,
                &description,
                &is_paid,
                &paid_at,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Select<By<Vec<Income>, sale::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Income>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Income>, sale::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let sale_id: sale::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, employee_id, sale_id, amount, kind, description, \
                   is_paid, paid_at, created_at \
            FROM employee_incomes \
            WHERE sale_id = $1::UUID \
            ORDER BY created_at, id";
        Ok(self
            .query(SQL, &[&sale_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| Income {
                id: row.get("id"),
                employee_id: row.get("employee_id"),
                sale_id: row.get("sale_id"),
                amount: row.get("amount"),
                kind: row.get("kind"),
                description: row.get("description"),
                is_paid: row.get("is_paid"),
                paid_at: row.get("paid_at"),
                created_at: row.get("created_at"),
            })
            .collect())
    }
}
