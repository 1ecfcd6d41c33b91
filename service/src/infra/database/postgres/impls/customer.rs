//! [`Customer`]-related [`Database`] implementations.

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{customer, Customer},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<Customer>, customer::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Customer>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Customer>, customer::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: customer::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, full_name, created_at \
            FROM customers \
            WHERE id = $1::UUID \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Customer {
                id: row.get("id"),
                full_name: row.get("full_name"),
                created_at: row.get("created_at"),
            }))
    }
}
