use crate::{
    auth::{CurrentUser, Editor},
    error::{not_found, present, ApiError},
    shipments::{Created, Message},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use http::StatusCode;
use qc_db::{models::UnitFields, Reference, UniqueField};

#[derive(Debug, serde::Deserialize)]
pub struct UnitBody {
    #[serde(default)]
    shipment_id: Option<i32>,
    #[serde(default)]
    model_type: Option<String>,
    #[serde(default)]
    part_number: Option<String>,
    #[serde(default)]
    serial_number: Option<String>,
    #[serde(default)]
    original_serial_number: Option<String>,
    #[serde(default)]
    first_test_pass: Option<bool>,
    #[serde(default)]
    failed_equipment: Option<String>,
    #[serde(default)]
    retest_reason: Option<String>,
}

impl UnitBody {
    fn into_fields(self) -> Result<(Option<i32>, UnitFields), ApiError> {
        let (Some(model_type), Some(part_number), Some(serial_number)) = (
            present(self.model_type),
            present(self.part_number),
            present(self.serial_number),
        ) else {
            return Err(ApiError::bad_request("Missing required fields"));
        };
        let fields = UnitFields {
            model_type,
            part_number,
            serial_number,
            original_serial_number: self.original_serial_number,
            first_test_pass: self.first_test_pass.unwrap_or(true),
            failed_equipment: self.failed_equipment,
            retest_reason: self.retest_reason,
        }
        .normalized();
        Ok((self.shipment_id, fields))
    }
}

/// Explains a rejected insert or update in terms of the unit that was submitted.
fn unit_error(fields: &UnitFields) -> impl FnOnce(qc_db::Error) -> ApiError + '_ {
    move |err| match err {
        qc_db::Error::Conflict(UniqueField::SerialNumber) => ApiError::Conflict(format!(
            "Serial Number '{}' already exists.",
            fields.serial_number
        )),
        qc_db::Error::Conflict(UniqueField::OriginalSerialNumber) => ApiError::Conflict(format!(
            "Original Serial Number '{}' already exists.",
            fields.original_serial_number.as_deref().unwrap_or_default()
        )),
        qc_db::Error::MissingReference(Reference::Shipment) => {
            ApiError::NotFound("Shipment not found".to_owned())
        }
        err => not_found("Unit not found")(err),
    }
}

#[tracing::instrument(skip(app_state, editor), fields(acting_user = %editor.0.username))]
pub async fn create(
    editor: Editor,
    State(app_state): State<AppState>,
    Json(body): Json<UnitBody>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    let (Some(shipment_id), fields) = body.into_fields()? else {
        return Err(ApiError::bad_request("Missing required fields"));
    };
    let id = app_state
        .store
        .add_unit(shipment_id, fields.clone())
        .await
        .map_err(unit_error(&fields))?;
    Ok((
        StatusCode::CREATED,
        Json(Created {
            message: "Unit added successfully",
            id,
        }),
    ))
}

#[tracing::instrument(skip(app_state, editor), fields(acting_user = %editor.0.username))]
pub async fn update(
    editor: Editor,
    State(app_state): State<AppState>,
    Path(unit_id): Path<i32>,
    Json(body): Json<UnitBody>,
) -> Result<Json<Message>, ApiError> {
    let (_, fields) = body.into_fields()?;
    app_state
        .store
        .update_unit(unit_id, fields.clone())
        .await
        .map_err(unit_error(&fields))?;
    Ok(Json(Message {
        message: "Unit updated successfully".to_owned(),
    }))
}

#[tracing::instrument(skip(app_state, editor), fields(acting_user = %editor.0.username))]
pub async fn delete(
    editor: Editor,
    State(app_state): State<AppState>,
    Path(unit_id): Path<i32>,
) -> Result<Json<Message>, ApiError> {
    app_state
        .store
        .delete_unit(unit_id)
        .await
        .map_err(not_found("Unit not found"))?;
    Ok(Json(Message {
        message: "Unit deleted successfully".to_owned(),
    }))
}

#[derive(Debug, serde::Serialize)]
pub struct Uniqueness {
    pub is_unique: bool,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct SerialQuery {
    serial_number: Option<String>,
    original_serial_number: Option<String>,
}

#[tracing::instrument(skip(app_state, user), fields(acting_user = %user.username))]
pub async fn check_serial(
    user: CurrentUser,
    State(app_state): State<AppState>,
    Query(query): Query<SerialQuery>,
) -> Result<Json<Uniqueness>, ApiError> {
    let serial_number = present(query.serial_number)
        .ok_or_else(|| ApiError::bad_request("Serial number is required"))?;
    Ok(Json(Uniqueness {
        is_unique: app_state.store.is_serial_unique(&serial_number).await?,
    }))
}

#[tracing::instrument(skip(app_state, user), fields(acting_user = %user.username))]
pub async fn check_original_serial(
    user: CurrentUser,
    State(app_state): State<AppState>,
    Query(query): Query<SerialQuery>,
) -> Result<Json<Uniqueness>, ApiError> {
    let original_serial_number = present(query.original_serial_number)
        .ok_or_else(|| ApiError::bad_request("Original serial number is required"))?;
    Ok(Json(Uniqueness {
        is_unique: app_state
            .store
            .is_original_serial_unique(&original_serial_number)
            .await?,
    }))
}
