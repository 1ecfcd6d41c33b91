//! REST API endpoints operating on [`Sale`]s.

use std::{collections::HashMap, str::FromStr as _};

use axum::{extract::Path, Extension, Json};
use common::Money;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use service::{
    command,
    domain::{customer, employee, income, sale, vehicle, Income, Sale},
    query, Command as _,
};

use crate::{error, AsError, Error};

/// Request body of the [`create`] endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    /// ID of the vehicle being sold.
    pub vehicle_id: vehicle::Id,

    /// ID of the buying customer.
    pub customer_id: customer::Id,

    /// ID of the selling employee.
    pub seller_id: employee::Id,

    /// ID of the employee who took the vehicle in.
    pub intake_employee_id: employee::Id,

    /// ID of the supervising manager, if any.
    #[serde(default)]
    pub manager_id: Option<employee::Id>,

    /// Intake cost of the vehicle.
    pub purchase_price: Money,

    /// Price the vehicle is sold for.
    pub sale_price: Money,

    /// [RFC 3339] date when the vehicle is handed over, if known.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    #[serde(default, with = "common::datetime::serde::rfc3339::option")]
    pub sale_date: Option<sale::SaleDateTime>,

    /// Bonus of the selling employee.
    #[serde(default)]
    pub seller_bonus: Option<Money>,

    /// Bonus of the employee who took the vehicle in.
    #[serde(default)]
    pub intake_bonus: Option<Money>,

    /// Bonus of the supervising manager.
    #[serde(default)]
    pub manager_bonus: Option<Money>,

    /// Total of all the per-role bonuses.
    #[serde(default)]
    pub total_bonuses: Option<Money>,

    /// Indicator whether the new sale is active.
    #[serde(default = "default_is_active")]
    pub is_active: bool,
}

/// Default value of the [`CreateSaleRequest::is_active`] field.
const fn default_is_active() -> bool {
    true
}

/// Request body of the [`update`] endpoint.
///
/// Missing fields are left untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSaleRequest {
    /// New ID of the vehicle being sold.
    #[serde(default)]
    pub vehicle_id: Option<vehicle::Id>,

    /// New ID of the buying customer.
    #[serde(default)]
    pub customer_id: Option<customer::Id>,

    /// New ID of the selling employee.
    #[serde(default)]
    pub seller_id: Option<employee::Id>,

    /// New ID of the employee who took the vehicle in.
    #[serde(default)]
    pub intake_employee_id: Option<employee::Id>,

    /// New ID of the supervising manager.
    #[serde(default)]
    pub manager_id: Option<employee::Id>,

    /// New intake cost of the vehicle.
    #[serde(default)]
    pub purchase_price: Option<Money>,

    /// New price the vehicle is sold for.
    #[serde(default)]
    pub sale_price: Option<Money>,

    /// New bonus of the selling employee.
    #[serde(default)]
    pub seller_bonus: Option<Money>,

    /// New bonus of the employee who took the vehicle in.
    #[serde(default)]
    pub intake_bonus: Option<Money>,

    /// New bonus of the supervising manager.
    #[serde(default)]
    pub manager_bonus: Option<Money>,

    /// New total of all the per-role bonuses.
    #[serde(default)]
    pub total_bonuses: Option<Money>,

    /// New lifecycle status, as its `SCREAMING_SNAKE_CASE` name.
    #[serde(default)]
    pub status: Option<String>,

    /// New [RFC 3339] date when the vehicle is handed over.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    #[serde(default, with = "common::datetime::serde::rfc3339::option")]
    pub sale_date: Option<sale::SaleDateTime>,

    /// New activity indicator.
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl UpdateSaleRequest {
    /// Converts this [`UpdateSaleRequest`] into a [`sale::Patch`].
    ///
    /// # Errors
    ///
    /// If the provided status is not a known [`sale::Status`] name.
    fn try_into_patch(self) -> Result<sale::Patch, Error> {
        let Self {
            vehicle_id,
            customer_id,
            seller_id,
            intake_employee_id,
            manager_id,
            purchase_price,
            sale_price,
            seller_bonus,
            intake_bonus,
            manager_bonus,
            total_bonuses,
            status,
            sale_date,
            is_active,
        } = self;

        let status = status
            .map(|s| {
                sale::Status::from_str(&s).map_err(|_| {
                    Error::new(
                        "INVALID_STATUS",
                        StatusCode::UNPROCESSABLE_ENTITY,
                        format!("Unknown sale status: {s}"),
                    )
                })
            })
            .transpose()?;

        Ok(sale::Patch {
            vehicle_id,
            customer_id,
            seller_id,
            intake_employee_id,
            manager_id,
            purchase_price,
            sale_price,
            seller_bonus,
            intake_bonus,
            manager_bonus,
            total_bonuses,
            status,
            sale_date,
            is_active,
        })
    }
}

/// Representation of a [`Sale`] in REST API responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleResponse {
    /// ID of the sale.
    pub id: sale::Id,

    /// ID of the vehicle being sold.
    pub vehicle_id: vehicle::Id,

    /// ID of the buying customer.
    pub customer_id: customer::Id,

    /// ID of the selling employee.
    pub seller_id: employee::Id,

    /// ID of the employee who took the vehicle in.
    pub intake_employee_id: employee::Id,

    /// ID of the supervising manager, if any.
    pub manager_id: Option<employee::Id>,

    /// Intake cost of the vehicle.
    pub purchase_price: Money,

    /// Price the vehicle is sold for.
    pub sale_price: Money,

    /// Net profit of the sale.
    pub net_profit: Money,

    /// Bonus of the selling employee.
    pub seller_bonus: Option<Money>,

    /// Bonus of the employee who took the vehicle in.
    pub intake_bonus: Option<Money>,

    /// Bonus of the supervising manager.
    pub manager_bonus: Option<Money>,

    /// Total of all the per-role bonuses.
    pub total_bonuses: Option<Money>,

    /// Lifecycle status name.
    pub status: String,

    /// Human-readable label of the lifecycle status.
    pub status_label: &'static str,

    /// Indicator whether the commission has been paid.
    pub is_commission_paid: bool,

    /// [RFC 3339] date when the vehicle was handed over, if known.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub sale_date: Option<String>,

    /// Indicator whether the sale is active.
    pub is_active: bool,

    /// [RFC 3339] date when the sale was created.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub created_at: String,

    /// [RFC 3339] date when the sale was last updated.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub updated_at: String,
}

impl From<Sale> for SaleResponse {
    fn from(sale: Sale) -> Self {
        Self {
            id: sale.id,
            vehicle_id: sale.vehicle_id,
            customer_id: sale.customer_id,
            seller_id: sale.seller_id,
            intake_employee_id: sale.intake_employee_id,
            manager_id: sale.manager_id,
            purchase_price: sale.purchase_price,
            sale_price: sale.sale_price,
            net_profit: sale.net_profit,
            seller_bonus: sale.seller_bonus,
            intake_bonus: sale.intake_bonus,
            manager_bonus: sale.manager_bonus,
            total_bonuses: sale.total_bonuses,
            status: sale.status.to_string(),
            status_label: sale.status.label(),
            is_commission_paid: sale.is_commission_paid,
            sale_date: sale.sale_date.map(|d| d.to_rfc3339()),
            is_active: sale.is_active,
            created_at: sale.created_at.to_rfc3339(),
            updated_at: sale.updated_at.to_rfc3339(),
        }
    }
}

/// Representation of an [`Income`] in REST API responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeResponse {
    /// ID of the income.
    pub id: income::Id,

    /// ID of the employee receiving the income.
    pub employee_id: employee::Id,

    /// ID of the sale the income originates from, if any.
    pub sale_id: Option<sale::Id>,

    /// Amount of the income.
    pub amount: Money,

    /// Kind name of the income.
    pub kind: String,

    /// Human-readable description of the income.
    pub description: Option<income::Description>,

    /// Indicator whether the income has been paid out.
    pub is_paid: bool,

    /// [RFC 3339] date when the income was paid out, if it was.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub paid_at: Option<String>,

    /// [RFC 3339] date when the income was recorded.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub created_at: String,
}

impl From<Income> for IncomeResponse {
    fn from(income: Income) -> Self {
        Self {
            id: income.id,
            employee_id: income.employee_id,
            sale_id: income.sale_id,
            amount: income.amount,
            kind: income.kind.to_string(),
            description: income.description,
            is_paid: income.is_paid,
            paid_at: income.paid_at.map(|d| d.to_rfc3339()),
            created_at: income.created_at.to_rfc3339(),
        }
    }
}

/// Response body of the [`stats`] endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Total count of sales.
    pub total: i64,

    /// Count of sales per lifecycle status name.
    pub by_status: HashMap<String, i64>,

    /// Money totals over all the sales.
    pub totals: TotalsResponse,
}

/// Money totals in the [`StatsResponse`].
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsResponse {
    /// Sum of sale prices.
    pub revenue: Money,

    /// Sum of net profits.
    pub profit: Money,

    /// Sum of bonus totals.
    pub bonuses: Money,
}

impl From<query::report::sales::Output> for StatsResponse {
    fn from(output: query::report::sales::Output) -> Self {
        Self {
            total: output.total.into(),
            by_status: output
                .by_status
                .into_iter()
                .map(|(status, count)| (status.to_string(), count.into()))
                .collect(),
            totals: TotalsResponse {
                revenue: output.totals.revenue,
                profit: output.totals.profit,
                bonuses: output.totals.bonuses,
            },
        }
    }
}

/// `POST /sales` endpoint creating a new [`Sale`].
#[tracing::instrument(skip_all, fields(vehicle.id = %req.vehicle_id))]
pub async fn create(
    Extension(service): Extension<crate::Service>,
    Json(req): Json<CreateSaleRequest>,
) -> Result<(StatusCode, Json<SaleResponse>), Error> {
    let sale = service
        .execute(command::CreateSale {
            vehicle_id: req.vehicle_id,
            customer_id: req.customer_id,
            seller_id: req.seller_id,
            intake_employee_id: req.intake_employee_id,
            manager_id: req.manager_id,
            purchase_price: req.purchase_price,
            sale_price: req.sale_price,
            sale_date: req.sale_date,
            seller_bonus: req.seller_bonus,
            intake_bonus: req.intake_bonus,
            manager_bonus: req.manager_bonus,
            total_bonuses: req.total_bonuses,
            is_active: req.is_active,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok((StatusCode::CREATED, Json(sale.into())))
}

/// `GET /sales/{id}` endpoint returning a single [`Sale`].
#[tracing::instrument(skip_all, fields(sale.id = %id))]
pub async fn by_id(
    Extension(service): Extension<crate::Service>,
    Path(id): Path<sale::Id>,
) -> Result<Json<SaleResponse>, Error> {
    let sale = service
        .execute(query::sale::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .ok_or_else(error::sale_not_exists)?;

    Ok(Json(sale.into()))
}

/// `GET /vehicles/{id}/sale` endpoint returning the [`Sale`] of a vehicle.
#[tracing::instrument(skip_all, fields(vehicle.id = %id))]
pub async fn by_vehicle(
    Extension(service): Extension<crate::Service>,
    Path(id): Path<vehicle::Id>,
) -> Result<Json<SaleResponse>, Error> {
    let sale = service
        .execute(query::sale::ByVehicle::by(id))
        .await
        .map_err(AsError::into_error)?
        .ok_or_else(error::sale_not_exists)?;

    Ok(Json(sale.into()))
}

/// `GET /sales/{id}/incomes` endpoint returning the [`Income`] ledger entries
/// recorded for a [`Sale`].
#[tracing::instrument(skip_all, fields(sale.id = %id))]
pub async fn incomes(
    Extension(service): Extension<crate::Service>,
    Path(id): Path<sale::Id>,
) -> Result<Json<Vec<IncomeResponse>>, Error> {
    _ = service
        .execute(query::sale::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .ok_or_else(error::sale_not_exists)?;

    let incomes = service
        .execute(query::sale::Incomes::by(id))
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(incomes.into_iter().map(Into::into).collect()))
}

/// `PATCH /sales/{id}` endpoint applying a partial update to a [`Sale`],
/// driving its lifecycle transitions.
#[tracing::instrument(skip_all, fields(sale.id = %id))]
pub async fn update(
    Extension(service): Extension<crate::Service>,
    Path(id): Path<sale::Id>,
    Json(req): Json<UpdateSaleRequest>,
) -> Result<Json<SaleResponse>, Error> {
    let patch = req.try_into_patch()?;

    let sale = service
        .execute(command::UpdateSale { id, patch })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(sale.into()))
}

/// `DELETE /sales/{id}` endpoint removing a [`Sale`].
///
/// Returns the removed [`Sale`].
#[tracing::instrument(skip_all, fields(sale.id = %id))]
pub async fn remove(
    Extension(service): Extension<crate::Service>,
    Path(id): Path<sale::Id>,
) -> Result<Json<SaleResponse>, Error> {
    let sale = service
        .execute(command::RemoveSale { id })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(sale.into()))
}

/// `POST /sales/{id}/toggle-active` endpoint flipping the activity indicator
/// of a [`Sale`].
#[tracing::instrument(skip_all, fields(sale.id = %id))]
pub async fn toggle_active(
    Extension(service): Extension<crate::Service>,
    Path(id): Path<sale::Id>,
) -> Result<Json<SaleResponse>, Error> {
    let sale = service
        .execute(command::ToggleSaleActivity { id })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(sale.into()))
}

/// `GET /sales/stats` endpoint returning aggregate statistics over all the
/// [`Sale`]s.
#[tracing::instrument(skip_all)]
pub async fn stats(
    Extension(service): Extension<crate::Service>,
) -> Result<Json<StatsResponse>, Error> {
    let output = service
        .execute(query::report::sales::Stats)
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(output.into()))
}
