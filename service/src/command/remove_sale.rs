//! [`Command`] for removing a [`Sale`].

use common::operations::{By, Commit, Delete, Lock, Select, Transact, Transacted};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{sale, Sale},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for removing a [`Sale`].
///
/// Removing a [`Sale`] doesn't touch the [`Income`] ledger entries already
/// recorded for it.
///
/// [`Income`]: crate::domain::Income
#[derive(Clone, Copy, Debug)]
pub struct RemoveSale {
    /// ID of the [`Sale`] to remove.
    pub id: sale::Id,
}

impl<Db> Command<RemoveSale> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Sale>, sale::Id>>,
            Ok = Option<Sale>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<Lock<By<Sale, sale::Id>>, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Sale>, sale::Id>>,
            Ok = Option<Sale>,
            Err = Traced<database::Error>,
        > + Database<Delete<Sale>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Sale;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: RemoveSale) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RemoveSale { id } = cmd;

        self.database()
            .execute(Select(By::<Option<Sale>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::SaleNotExists(id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent deletions.
        tx.execute(Lock(By::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let sale = tx
            .execute(Select(By::<Option<Sale>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::SaleNotExists(id))
            .map_err(tracerr::wrap!())?;

        tx.execute(Delete(sale.clone()))
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

/// Error of [`RemoveSale`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Sale`] with the provided ID does not exist.
    #[display("`Sale(id: {_0})` does not exist")]
    SaleNotExists(#[error(not(source))] sale::Id),
}
