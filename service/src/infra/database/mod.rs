//! [`Database`]-related implementations.

#[cfg(feature = "postgres")]
pub mod postgres;

use derive_more::{Display, Error as StdError, From};

#[cfg(feature = "postgres")]
pub use self::postgres::Postgres;

/// Database operation.
pub use common::Handler as Database;

/// [`Database`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    #[cfg(feature = "postgres")]
    /// [`Postgres`] error.
    Postgres(postgres::Error),

    /// Backing store cannot be reached.
    #[display("database is unavailable")]
    Unavailable,
}

impl Error {
    /// Indicates whether the failed operation may succeed when retried.
    ///
    /// Covers row-lock conflicts, serialization failures and connection
    /// losses.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(e) => e.is_transient(),
            Self::Unavailable => true,
        }
    }

    /// Checks if the error is a unique violation of the specified constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        #[cfg(not(feature = "postgres"))]
        let _ = constraint;
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(e) => e.is_unique_violation(constraint),
            Self::Unavailable => false,
        }
    }
}
