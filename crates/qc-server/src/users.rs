use crate::{
    auth::{self, Admin, CurrentUser},
    error::{not_found, present, AccountError, ApiError},
    AppState,
};
use axum::{
    extract::{Path, State},
    Json,
};
use http::StatusCode;
use qc_db::{
    models::{NewUser, UserSummary},
    types::Role,
    UniqueField,
};

const INVALID_ROLE: &str = "Invalid role specified. Must be 'admin', 'user', 'viewer', or 'QC'.";

#[derive(Debug, serde::Serialize)]
pub struct Msg {
    pub msg: &'static str,
}

fn username_error(username: &str) -> impl FnOnce(qc_db::Error) -> ApiError + '_ {
    move |err| match err {
        qc_db::Error::Conflict(UniqueField::Username) => {
            ApiError::Conflict(format!("Username '{username}' already exists."))
        }
        err => not_found("User not found")(err),
    }
}

fn parse_role(role: Option<String>) -> Result<Role, ApiError> {
    present(role)
        .map_or(Ok(Role::User), |r| r.parse::<Role>())
        .map_err(|_| ApiError::bad_request(INVALID_ROLE))
}

#[tracing::instrument(skip(app_state, admin), fields(acting_user = %admin.0.username))]
pub async fn list(
    admin: Admin,
    State(app_state): State<AppState>,
) -> Result<Json<Vec<UserSummary>>, AccountError> {
    Ok(Json(app_state.store.list_users().await?))
}

#[derive(serde::Deserialize)]
pub struct NewAccount {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

#[tracing::instrument(skip_all, fields(acting_user = %admin.0.username))]
pub async fn create(
    admin: Admin,
    State(app_state): State<AppState>,
    Json(body): Json<NewAccount>,
) -> Result<(StatusCode, Json<Msg>), AccountError> {
    let (Some(username), Some(password)) = (
        present(body.username),
        body.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::bad_request("Username and password are required").into());
    };
    let role = parse_role(body.role)?;
    let password_hash = auth::hash_password(password)
        .await
        .map_err(ApiError::from)?;
    app_state
        .store
        .create_user(NewUser {
            username: username.clone(),
            password_hash,
            role: role.as_str().to_owned(),
        })
        .await
        .map_err(username_error(&username))?;
    tracing::info!(%username, %role, "user created");
    Ok((
        StatusCode::CREATED,
        Json(Msg {
            msg: "User created successfully",
        }),
    ))
}

#[derive(Debug, serde::Deserialize)]
pub struct AccountChanges {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

#[tracing::instrument(skip(app_state, admin), fields(acting_user = %admin.0.username))]
pub async fn update(
    admin: Admin,
    State(app_state): State<AppState>,
    Path(user_id): Path<i32>,
    Json(body): Json<AccountChanges>,
) -> Result<Json<Msg>, AccountError> {
    let (Some(username), Some(role)) = (present(body.username), present(body.role)) else {
        return Err(ApiError::bad_request("Username and role are required").into());
    };
    let role = parse_role(Some(role))?;
    app_state
        .store
        .update_user(user_id, &username, role)
        .await
        .map_err(username_error(&username))?;
    Ok(Json(Msg {
        msg: "User updated successfully",
    }))
}

#[tracing::instrument(skip(app_state, admin), fields(acting_user = %admin.0.username))]
pub async fn toggle_active(
    admin: Admin,
    State(app_state): State<AppState>,
    Path(user_id): Path<i32>,
) -> Result<Json<Msg>, AccountError> {
    app_state
        .store
        .toggle_user_active(user_id)
        .await
        .map_err(not_found("User not found"))?;
    Ok(Json(Msg {
        msg: "User status updated.",
    }))
}

#[derive(serde::Deserialize)]
pub struct NewPassword {
    #[serde(default)]
    password: Option<String>,
}

async fn set_password(
    app_state: &AppState,
    user_id: i32,
    body: NewPassword,
) -> Result<Json<Msg>, AccountError> {
    let password = body
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::bad_request("New password is required"))?;
    let password_hash = auth::hash_password(password)
        .await
        .map_err(ApiError::from)?;
    app_state
        .store
        .set_password_hash(user_id, &password_hash)
        .await
        .map_err(not_found("User not found"))?;
    Ok(Json(Msg {
        msg: "Password updated successfully",
    }))
}

#[tracing::instrument(skip(app_state, body, admin), fields(acting_user = %admin.0.username))]
pub async fn reset_password(
    admin: Admin,
    State(app_state): State<AppState>,
    Path(user_id): Path<i32>,
    Json(body): Json<NewPassword>,
) -> Result<Json<Msg>, AccountError> {
    set_password(&app_state, user_id, body).await
}

#[tracing::instrument(skip_all, fields(user_id = user.id))]
pub async fn change_own_password(
    user: CurrentUser,
    State(app_state): State<AppState>,
    Json(body): Json<NewPassword>,
) -> Result<Json<Msg>, AccountError> {
    set_password(&app_state, user.id, body).await
}
