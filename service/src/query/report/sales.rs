//! [`Stats`] definition.

use std::collections::HashMap;

use common::operations::{By, Select};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Sale;
use crate::{
    domain::sale,
    infra::{database, Database},
    read,
    Query, Service,
};

/// [`Query`] to calculate aggregate statistics over all the [`Sale`]s.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Stats;

/// Output of the [`Stats`] [`Query`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Output {
    /// Total count of [`Sale`]s.
    pub total: read::sale::TotalCount,

    /// Money totals over all the [`Sale`]s.
    pub totals: read::sale::Totals,

    /// Count of [`Sale`]s per [`sale::Status`].
    pub by_status: HashMap<sale::Status, read::sale::TotalCount>,
}

impl<Db> Query<Stats> for Service<Db>
where
    Db: Database<
            Select<By<HashMap<sale::Status, read::sale::TotalCount>, ()>>,
            Ok = HashMap<sale::Status, read::sale::TotalCount>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<read::sale::Totals, ()>>,
            Ok = read::sale::Totals,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Output;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Stats) -> Result<Self::Ok, Self::Err> {
        let by_status = self
            .database()
            .execute(Select(By::<
                HashMap<sale::Status, read::sale::TotalCount>,
                _,
            >::new(())))
            .await
            .map_err(tracerr::wrap!())?;

        let total = read::sale::TotalCount::from(
            by_status.values().copied().map(i64::from).sum::<i64>(),
        );
        if i64::from(total) == 0 {
            return Ok(Output::default());
        }

        let totals = self
            .database()
            .execute(Select(By::<read::sale::Totals, _>::new(())))
            .await
            .map_err(tracerr::wrap!())?;

        Ok(Output {
            total,
            totals,
            by_status,
        })
    }
}
