//! REST API definitions.

pub mod sale;

use axum::{
    routing::{get, post},
    Router,
};

/// Builds the [`Router`] serving all the REST API routes.
///
/// The [`crate::Service`] is expected to be provided via
/// [`axum::Extension`].
#[must_use]
pub fn router() -> Router {
    Router::new()
        .route("/sales", post(sale::create))
        .route("/sales/stats", get(sale::stats))
        .route(
            "/sales/:id",
            get(sale::by_id).patch(sale::update).delete(sale::remove),
        )
        .route("/sales/:id/incomes", get(sale::incomes))
        .route("/sales/:id/toggle-active", post(sale::toggle_active))
        .route("/vehicles/:id/sale", get(sale::by_vehicle))
}
