use crate::{
    auth::{CurrentUser, Editor},
    error::{not_found, present, ApiError},
    shipments::{Created, Message},
    units::Uniqueness,
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use http::StatusCode;
use qc_db::{
    models::{ModelNumberChanges, NewModelNumber},
    ModelCatalog, UniqueField,
};

fn part_number_error(part_number: &str) -> impl FnOnce(qc_db::Error) -> ApiError + '_ {
    move |err| match err {
        qc_db::Error::Conflict(UniqueField::PartNumber) => {
            ApiError::Conflict(format!("Part Number '{part_number}' already exists."))
        }
        err => not_found("Model not found")(err),
    }
}

#[tracing::instrument(skip(app_state, user), fields(acting_user = %user.username))]
pub async fn list(
    user: CurrentUser,
    State(app_state): State<AppState>,
) -> Result<Json<ModelCatalog>, ApiError> {
    Ok(Json(app_state.store.list_models().await?))
}

#[derive(Debug, serde::Deserialize)]
pub struct ModelBody {
    #[serde(default)]
    model_type: Option<String>,
    #[serde(default)]
    part_number: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    is_active: Option<bool>,
}

impl ModelBody {
    fn required(self) -> Result<(String, String, Option<String>, Option<bool>), ApiError> {
        match (present(self.model_type), present(self.part_number)) {
            (Some(model_type), Some(part_number)) => Ok((
                model_type,
                part_number,
                present(self.description),
                self.is_active,
            )),
            _ => Err(ApiError::bad_request(
                "Model Type and Part Number are required.",
            )),
        }
    }
}

#[tracing::instrument(skip(app_state, editor), fields(acting_user = %editor.0.username))]
pub async fn create(
    editor: Editor,
    State(app_state): State<AppState>,
    Json(body): Json<ModelBody>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    let (model_type, part_number, description, _) = body.required()?;
    let id = app_state
        .store
        .add_model(NewModelNumber {
            model_type,
            description,
            part_number: part_number.clone(),
        })
        .await
        .map_err(part_number_error(&part_number))?;
    Ok((
        StatusCode::CREATED,
        Json(Created {
            message: "Model added successfully",
            id,
        }),
    ))
}

#[tracing::instrument(skip(app_state, editor), fields(acting_user = %editor.0.username))]
pub async fn update(
    editor: Editor,
    State(app_state): State<AppState>,
    Path(model_id): Path<i32>,
    Json(body): Json<ModelBody>,
) -> Result<Json<Message>, ApiError> {
    let (model_type, part_number, description, is_active) = body.required()?;
    let is_active = is_active.ok_or_else(|| ApiError::bad_request("is_active is required."))?;
    app_state
        .store
        .update_model(
            model_id,
            ModelNumberChanges {
                model_type,
                description,
                part_number: part_number.clone(),
                is_active,
            },
        )
        .await
        .map_err(part_number_error(&part_number))?;
    Ok(Json(Message {
        message: "Model updated successfully".to_owned(),
    }))
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct PartNumberQuery {
    part_number: Option<String>,
}

#[tracing::instrument(skip(app_state, user), fields(acting_user = %user.username))]
pub async fn check_part_number(
    user: CurrentUser,
    State(app_state): State<AppState>,
    Query(query): Query<PartNumberQuery>,
) -> Result<Json<Uniqueness>, ApiError> {
    let part_number = present(query.part_number)
        .ok_or_else(|| ApiError::bad_request("Part number is required"))?;
    Ok(Json(Uniqueness {
        is_unique: app_state.store.is_part_number_unique(&part_number).await?,
    }))
}
