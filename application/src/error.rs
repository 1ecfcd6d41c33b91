//! [`Error`]-related definitions.

use std::fmt;

use axum::response::{IntoResponse, Response};
use derive_more::Error as StdError;
use itertools::Itertools as _;
use serde::Serialize;
use service::{command, infra::database};
use tracerr::{Trace, Traced};

/// REST API [`Error`].
#[derive(Clone, Debug, StdError)]
pub struct Error {
    /// [`Error`] code.
    pub code: Code,

    /// [`http::StatusCode`] of this [`Error`].
    pub status_code: http::StatusCode,

    /// Backtrace of this [`Error`].
    #[error(not(backtrace))]
    pub backtrace: Option<Trace>,

    /// [`Error`] message.
    pub message: String,

    /// Detailed reasons of this [`Error`], if any.
    pub details: Vec<String>,
}

impl Error {
    /// Create a new [`Error`] representing an internal server error.
    #[must_use]
    pub fn internal(msg: &impl ToString) -> Self {
        Self {
            code: "INTERNAL_SERVER_ERROR",
            status_code: http::StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            backtrace: None,
            details: Vec::new(),
        }
    }

    /// Create a new [`Error`] without details or a backtrace.
    #[must_use]
    pub fn new(
        code: Code,
        status_code: http::StatusCode,
        message: impl ToString,
    ) -> Self {
        Self {
            code,
            status_code,
            message: message.to_string(),
            backtrace: None,
            details: Vec::new(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            code,
            status_code: _,
            backtrace,
            message,
            details,
        } = self;

        write!(
            f,
            "[{code}]: {message}{}{}",
            details
                .iter()
                .format_with("", |detail, f| f(&format_args!("\n- {detail}"))),
            backtrace
                .iter()
                .format_with("\n", |trace, f| f(&format_args!("{trace}"))),
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        /// JSON body of an error [`Response`].
        #[derive(Debug, Serialize)]
        struct Body<'a> {
            /// [`Error::code`].
            code: Code,

            /// [`Error::message`].
            message: &'a str,

            /// [`Error::details`].
            details: &'a [String],
        }

        let body = axum::Json(Body {
            code: self.code,
            message: &self.message,
            details: &self.details,
        });
        (self.status_code, body).into_response()
    }
}

/// [`Error`] code.
pub type Code = &'static str;

/// Helper trait for converting types into [`Error`]s.
pub trait AsError {
    /// Tries to convert the type into an [`Error`].
    ///
    /// [`None`] is returned if the type cannot be converted into an [`Error`].
    fn try_as_error(&self) -> Option<Error>;

    /// Converts the type into an [`Error`].
    fn as_error(&self) -> Error
    where
        Self: fmt::Display,
    {
        self.try_as_error()
            .unwrap_or_else(|| Error::internal(&self))
    }

    /// Converts the type into an [`Error`] by consuming it.
    fn into_error(self) -> Error
    where
        Self: fmt::Display + Sized,
    {
        self.as_error()
    }
}

impl<E: AsError> AsError for Traced<E> {
    fn try_as_error(&self) -> Option<Error> {
        let mut error = self.as_ref().try_as_error()?;
        error.backtrace = Some(self.trace().clone());
        Some(error)
    }
}

impl AsError for database::Error {
    fn try_as_error(&self) -> Option<Error> {
        if self.is_transient() {
            return Some(Error::new(
                "DATABASE_BUSY",
                http::StatusCode::SERVICE_UNAVAILABLE,
                "Database is busy, retry the request",
            ));
        }
        if self.is_unique_violation(Some("sales_vehicle_id_key")) {
            return Some(Error::new(
                "VEHICLE_SALE_EXISTS",
                http::StatusCode::CONFLICT,
                "Vehicle already has a sale",
            ));
        }
        None
    }
}

/// Converts the provided [`sale::Violations`] into a 422 [`Error`] carrying
/// each violation in [`Error::details`].
///
/// [`sale::Violations`]: service::domain::sale::Violations
fn invalid_sale(violations: &service::domain::sale::Violations) -> Error {
    let mut error = Error::new(
        "INVALID_SALE",
        http::StatusCode::UNPROCESSABLE_ENTITY,
        "Sale violates business rules",
    );
    error.details = violations.0.iter().map(ToString::to_string).collect();
    error
}

/// Converts the provided missing [`command::References`] into a 422 [`Error`]
/// carrying each reference in [`Error::details`].
fn missing_references(refs: &command::References) -> Error {
    let mut error = Error::new(
        "MISSING_REFERENCES",
        http::StatusCode::UNPROCESSABLE_ENTITY,
        "Referenced records do not exist",
    );
    error.details = refs.0.iter().map(ToString::to_string).collect();
    error
}

/// 409 [`Error`] for a vehicle that already has a finished sale.
fn vehicle_already_sold() -> Error {
    Error::new(
        "VEHICLE_ALREADY_SOLD",
        http::StatusCode::CONFLICT,
        "Vehicle has been sold already",
    )
}

/// 409 [`Error`] for a vehicle with another sale still in progress.
fn vehicle_sale_in_progress() -> Error {
    Error::new(
        "VEHICLE_SALE_IN_PROGRESS",
        http::StatusCode::CONFLICT,
        "Vehicle has another sale in progress",
    )
}

/// 404 [`Error`] for a sale that does not exist.
pub(crate) fn sale_not_exists() -> Error {
    Error::new(
        "SALE_NOT_FOUND",
        http::StatusCode::NOT_FOUND,
        "Sale does not exist",
    )
}

impl AsError for command::create_sale::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use command::create_sale::ExecutionError as E;

        match self {
            E::Db(e) => e.try_as_error(),
            E::InvalidSale(violations) => Some(invalid_sale(violations)),
            E::MissingReferences(refs) => Some(missing_references(refs)),
            E::VehicleAlreadySold(_) => Some(vehicle_already_sold()),
            E::VehicleSaleInProgress(_) => Some(vehicle_sale_in_progress()),
        }
    }
}

impl AsError for command::update_sale::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use command::update_sale::ExecutionError as E;

        match self {
            E::Db(e) => e.try_as_error(),
            E::InvalidSale(violations) => Some(invalid_sale(violations)),
            E::MissingReferences(refs) => Some(missing_references(refs)),
            E::SaleNotExists(_) => Some(sale_not_exists()),
            E::VehicleAlreadySold(_) => Some(vehicle_already_sold()),
            E::VehicleSaleInProgress(_) => Some(vehicle_sale_in_progress()),
        }
    }
}

impl AsError for command::remove_sale::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use command::remove_sale::ExecutionError as E;

        match self {
            E::Db(e) => e.try_as_error(),
            E::SaleNotExists(_) => Some(sale_not_exists()),
        }
    }
}

impl AsError for command::toggle_sale_activity::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use command::toggle_sale_activity::ExecutionError as E;

        match self {
            E::Db(e) => e.try_as_error(),
            E::SaleNotExists(_) => Some(sale_not_exists()),
        }
    }
}
