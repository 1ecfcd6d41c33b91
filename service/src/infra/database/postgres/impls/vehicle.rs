//! [`Vehicle`]-related [`Database`] implementations.

use common::operations::{By, Lock, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{vehicle, Vehicle},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<Vehicle>, vehicle::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Vehicle>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Vehicle>, vehicle::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: vehicle::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, brand_code, model_code, purchase_price, status, \
                   created_at \
            FROM vehicles \
            WHERE id = $1::UUID \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Vehicle {
                id: row.get("id"),
                brand_code: row.get("brand_code"),
                model_code: row.get("model_code"),
                purchase_price: row.get("purchase_price"),
                status: row.get("status"),
                created_at: row.get("created_at"),
            }))
    }
}

impl<C> Database<Update<Vehicle>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(vehicle): Update<Vehicle>,
    ) -> Result<Self::Ok, Self::Err> {
        let Vehicle {
            id,
            brand_code,
            model_code,
            purchase_price,
            status,
            created_at,
        } = vehicle;

        const SQL: &str = "\
            INSERT INTO vehicles (\
                id, brand_code, model_code, purchase_price, status, \
                created_at \
            ) VALUES (\
                $1::UUID, $2::VARCHAR, $3::VARCHAR, $4::NUMERIC, $5::INT2, \
                $6::TIMESTAMPTZ \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET brand_code = EXCLUDED.brand_code, \
                model_code = EXCLUDED.model_code, \
                purchase_price = EXCLUDED.purchase_price, \
                status = EXCLUDED.status, \
                created_at = EXCLUDED.created_at";
        self.exec(
            SQL,
            &[
                &id,
                &brand_code,
                &model_code,
                &purchase_price,
                &status,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Vehicle, vehicle::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Vehicle, vehicle::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: vehicle::Id = by.into_inner();

        // Concurrent holders fail fast with `LOCK_NOT_AVAILABLE`, which is
        // reported as a transient error.
        const SQL: &str = "\
            SELECT id \
            FROM vehicles \
            WHERE id = $1::UUID \
            FOR UPDATE NOWAIT";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
