use crate::{
    auth::{Admin, CurrentUser, Editor},
    error::{not_found, present, ApiError},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use http::StatusCode;
use jiff::civil::Date;
use qc_db::{
    aggregate::{
        clamp_weeks, DashboardStats, FpyWindow, MonthlySeries, ShipmentPage, ShipmentWithUnits,
        WeeklyFpyReport, DEFAULT_FPY_WEEKS,
    },
    filter::{Page, ShipmentFilter},
    types::ShipmentStatus,
    ShipmentDetails, UniqueField, WeeklyShipments,
};

#[derive(Debug, serde::Serialize)]
pub struct Created {
    pub message: &'static str,
    pub id: i32,
}

#[derive(Debug, serde::Serialize)]
pub struct Message {
    pub message: String,
}

pub(crate) fn parse_date(name: &str, value: Option<String>) -> Result<Option<Date>, ApiError> {
    present(value)
        .map(|v| {
            v.parse::<Date>().map_err(|_| {
                ApiError::bad_request(format!("Invalid date format for '{name}'. Use YYYY-MM-DD."))
            })
        })
        .transpose()
}

fn today() -> Date {
    jiff::Zoned::now().date()
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct FilterQuery {
    search: Option<String>,
    customer: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

impl FilterQuery {
    fn into_filter(self) -> Result<ShipmentFilter, ApiError> {
        Ok(ShipmentFilter {
            search: present(self.search),
            customer: present(self.customer),
            start_date: parse_date("start_date", self.start_date)?,
            end_date: parse_date("end_date", self.end_date)?,
            status: None,
        })
    }
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ListQuery {
    search: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    status: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
}

/// Status to narrow a listing by. Anything other than a known status lists every shipment.
fn listed_status(status: Option<String>) -> Option<ShipmentStatus> {
    present(status).and_then(|s| s.parse::<ShipmentStatus>().ok())
}

#[tracing::instrument(skip(app_state, user), fields(acting_user = %user.username))]
pub async fn list(
    user: CurrentUser,
    State(app_state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ShipmentPage>, ApiError> {
    let mut filter = FilterQuery {
        search: query.search,
        customer: None,
        start_date: query.start_date,
        end_date: query.end_date,
    }
    .into_filter()?
    .dates_unless_searching();
    filter.status = listed_status(query.status);
    let page = Page::new(query.page, query.limit);
    Ok(Json(app_state.store.list_shipments(&filter, page).await?))
}

#[derive(Debug, serde::Deserialize)]
pub struct NewShipment {
    #[serde(default)]
    customer_name: Option<String>,
    #[serde(default)]
    job_number: Option<String>,
    #[serde(default)]
    shipping_date: Option<String>,
    #[serde(default)]
    qc_name: Option<String>,
}

#[tracing::instrument(skip(app_state, editor), fields(acting_user = %editor.0.username))]
pub async fn create(
    editor: Editor,
    State(app_state): State<AppState>,
    Json(body): Json<NewShipment>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    let (Some(customer_name), Some(job_number), Some(shipping_date), Some(qc_name)) = (
        present(body.customer_name),
        present(body.job_number),
        present(body.shipping_date),
        present(body.qc_name),
    ) else {
        return Err(ApiError::bad_request("Missing required fields"));
    };
    let shipping_date = parse_date("shipping_date", Some(shipping_date))?
        .ok_or_else(|| ApiError::bad_request("Missing required fields"))?;
    let id = app_state
        .store
        .create_shipment(qc_db::models::NewShipment {
            customer_name,
            job_number: job_number.clone(),
            shipping_date: shipping_date.into(),
            qc_name,
        })
        .await
        .map_err(|err| match err {
            qc_db::Error::Conflict(UniqueField::JobNumberAndDate) => ApiError::Conflict(format!(
                "A shipment with Job Number '{job_number}' for date '{shipping_date}' already exists."
            )),
            err => err.into(),
        })?;
    Ok((
        StatusCode::CREATED,
        Json(Created {
            message: "Shipment created successfully",
            id,
        }),
    ))
}

#[tracing::instrument(skip(app_state, user), fields(acting_user = %user.username))]
pub async fn details(
    user: CurrentUser,
    State(app_state): State<AppState>,
    Path(shipment_id): Path<i32>,
) -> Result<Json<ShipmentDetails>, ApiError> {
    app_state
        .store
        .load_shipment_details(shipment_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Shipment not found".to_owned()))
}

#[derive(Debug, serde::Deserialize)]
pub struct StatusChange {
    #[serde(default)]
    status: Option<String>,
}

#[tracing::instrument(skip(app_state, editor), fields(acting_user = %editor.0.username))]
pub async fn update_status(
    editor: Editor,
    State(app_state): State<AppState>,
    Path(shipment_id): Path<i32>,
    Json(body): Json<StatusChange>,
) -> Result<Json<Message>, ApiError> {
    let status = body
        .status
        .as_deref()
        .and_then(|s| s.parse::<ShipmentStatus>().ok())
        .ok_or_else(|| ApiError::bad_request("Invalid status"))?;
    app_state
        .store
        .set_shipment_status(shipment_id, status)
        .await
        .map_err(not_found("Shipment not found"))?;
    Ok(Json(Message {
        message: format!("Shipment status updated to {status}"),
    }))
}

#[tracing::instrument(skip(app_state, admin), fields(acting_user = %admin.0.username))]
pub async fn delete(
    admin: Admin,
    State(app_state): State<AppState>,
    Path(shipment_id): Path<i32>,
) -> Result<Json<Message>, ApiError> {
    app_state
        .store
        .delete_shipment(shipment_id)
        .await
        .map_err(not_found("Shipment not found or already deleted"))?;
    Ok(Json(Message {
        message: "Shipment and all related data successfully deleted".to_owned(),
    }))
}

#[tracing::instrument(skip(app_state, user), fields(acting_user = %user.username))]
pub async fn stats(
    user: CurrentUser,
    State(app_state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<DashboardStats>, ApiError> {
    let filter = query.into_filter()?;
    Ok(Json(app_state.store.dashboard_stats(&filter).await?))
}

#[tracing::instrument(skip(app_state, user), fields(acting_user = %user.username))]
pub async fn stats_over_time(
    user: CurrentUser,
    State(app_state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<MonthlySeries>, ApiError> {
    let filter = query.into_filter()?;
    Ok(Json(app_state.store.stats_over_time(&filter).await?))
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct WeeklyFpyQuery {
    anchor_date: Option<String>,
    weeks: Option<String>,
}

impl WeeklyFpyQuery {
    fn into_window(self) -> Result<FpyWindow, ApiError> {
        let anchor_date = present(self.anchor_date)
            .map(|v| v.parse::<Date>())
            .transpose()
            .map_err(|_| ApiError::bad_request("Invalid anchor_date format. Use YYYY-MM-DD."))?
            .unwrap_or_else(today);
        let weeks = present(self.weeks)
            .map(|v| v.parse::<i64>())
            .transpose()
            .map_err(|_| {
                ApiError::bad_request("Invalid weeks parameter. Use an integer between 1 and 26.")
            })?
            .map_or(DEFAULT_FPY_WEEKS, clamp_weeks);
        Ok(FpyWindow::new(anchor_date, weeks))
    }
}

#[tracing::instrument(skip(app_state, user), fields(acting_user = %user.username))]
pub async fn weekly_fpy(
    user: CurrentUser,
    State(app_state): State<AppState>,
    Query(query): Query<WeeklyFpyQuery>,
) -> Result<Json<WeeklyFpyReport>, ApiError> {
    let window = query.into_window()?;
    Ok(Json(app_state.store.weekly_fpy(window).await?))
}

#[tracing::instrument(skip(app_state, user), fields(acting_user = %user.username))]
pub async fn manifest(
    user: CurrentUser,
    State(app_state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Vec<ShipmentWithUnits>>, ApiError> {
    let filter = query.into_filter()?;
    Ok(Json(app_state.store.manifest(&filter).await?))
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct WeekQuery {
    date: Option<String>,
}

#[tracing::instrument(skip(app_state, user), fields(acting_user = %user.username))]
pub async fn weekly(
    user: CurrentUser,
    State(app_state): State<AppState>,
    Query(query): Query<WeekQuery>,
) -> Result<Json<WeeklyShipments>, ApiError> {
    let date = parse_date("date", query.date)?.unwrap_or_else(today);
    Ok(Json(app_state.store.weekly_shipments(date).await?))
}
