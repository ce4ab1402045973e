use crate::{
    auth::{CurrentUser, Editor},
    error::{present, ApiError},
    shipments::{parse_date, Message},
    AppState,
};
use axum::{extract::State, Json};
use qc_db::{
    models::{ChecklistItem, ChecklistResponse},
    types::ChecklistStatus,
    Reference,
};

#[tracing::instrument(skip(app_state, user), fields(acting_user = %user.username))]
pub async fn items(
    user: CurrentUser,
    State(app_state): State<AppState>,
) -> Result<Json<Vec<ChecklistItem>>, ApiError> {
    Ok(Json(app_state.store.active_checklist_items().await?))
}

#[derive(Debug, serde::Deserialize)]
pub struct ResponseBody {
    #[serde(default)]
    shipment_id: Option<i32>,
    #[serde(default)]
    item_id: Option<i32>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    completed_by: Option<String>,
    #[serde(default)]
    completion_date: Option<String>,
    #[serde(default)]
    comments: Option<String>,
}

impl ResponseBody {
    fn into_response(self) -> Result<ChecklistResponse, ApiError> {
        let (Some(shipment_id), Some(item_id), Some(status), Some(completed_by), Some(_)) = (
            self.shipment_id,
            self.item_id,
            present(self.status),
            present(self.completed_by),
            present(self.completion_date.clone()),
        ) else {
            return Err(ApiError::bad_request("Missing required fields"));
        };
        let status = status
            .parse::<ChecklistStatus>()
            .map_err(|_| ApiError::bad_request("Status must be 'Passed' or 'NA'"))?;
        let completion_date = parse_date("completion_date", self.completion_date)?
            .ok_or_else(|| ApiError::bad_request("Missing required fields"))?;
        Ok(ChecklistResponse {
            shipment_id,
            item_id,
            status: status.as_str().to_owned(),
            completed_by,
            completion_date: completion_date.into(),
            comments: present(self.comments),
        })
    }
}

#[tracing::instrument(skip(app_state, editor), fields(acting_user = %editor.0.username))]
pub async fn save_response(
    editor: Editor,
    State(app_state): State<AppState>,
    Json(body): Json<ResponseBody>,
) -> Result<Json<Message>, ApiError> {
    let response = body.into_response()?;
    app_state
        .store
        .save_checklist_response(response)
        .await
        .map_err(|err| match err {
            qc_db::Error::MissingReference(Reference::Shipment) => {
                ApiError::NotFound("Shipment not found".to_owned())
            }
            qc_db::Error::MissingReference(Reference::ChecklistItem) => {
                ApiError::NotFound("Checklist item not found".to_owned())
            }
            err => err.into(),
        })?;
    Ok(Json(Message {
        message: "Response saved successfully".to_owned(),
    }))
}
