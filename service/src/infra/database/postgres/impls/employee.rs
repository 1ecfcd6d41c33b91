//! [`Employee`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{employee, Employee},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C, IDs> Database<Select<By<HashMap<employee::Id, Employee>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[employee::Id]>,
{
    type Ok = HashMap<employee::Id, Employee>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<employee::Id, Employee>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[employee::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap();

        const SQL: &str = "\
            SELECT id, full_name, created_at \
            FROM employees \
            WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
            LIMIT $2::INT4";
        Ok(self
            .query(SQL, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let id = row.get("id");
                (
                    id,
                    Employee {
                        id,
                        full_name: row.get("full_name"),
                        created_at: row.get("created_at"),
                    },
                )
            })
            .collect())
    }
}
