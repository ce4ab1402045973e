use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn into_body(self, key: &'static str) -> Response {
        let mut body = serde_json::Map::new();
        body.insert(key.to_owned(), self.to_string().into());
        (self.status(), Json(body)).into_response()
    }
}

impl From<qc_db::Error> for ApiError {
    fn from(err: qc_db::Error) -> Self {
        match err {
            qc_db::Error::NotFound => ApiError::NotFound("not found".to_owned()),
            qc_db::Error::Conflict(field) => ApiError::Conflict(format!("{field} already exists.")),
            qc_db::Error::MissingReference(reference) => {
                ApiError::NotFound(format!("{reference} not found"))
            }
            qc_db::Error::InvalidValue(err) => ApiError::BadRequest(err.to_string()),
            err => {
                tracing::error!("store failure: {err}");
                ApiError::Internal(err.to_string())
            }
        }
    }
}

/// Maps a store error to a 404 carrying `message` when the target row was absent.
pub fn not_found(message: &'static str) -> impl FnOnce(qc_db::Error) -> ApiError {
    move |err| match err {
        qc_db::Error::NotFound => ApiError::NotFound(message.to_owned()),
        err => err.into(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(_) | ApiError::Forbidden(_) => self.into_body("msg"),
            _ => self.into_body("error"),
        }
    }
}

/// Errors from the sign-in and account endpoints. Validation and lookup failures are
/// reported under `msg`, while conflicts and internal failures keep the `error` key.
#[derive(Debug)]
pub struct AccountError(pub ApiError);

impl From<ApiError> for AccountError {
    fn from(err: ApiError) -> Self {
        AccountError(err)
    }
}

impl From<qc_db::Error> for AccountError {
    fn from(err: qc_db::Error) -> Self {
        AccountError(err.into())
    }
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        match self.0 {
            err @ (ApiError::Conflict(_) | ApiError::Internal(_)) => err.into_body("error"),
            err => err.into_body("msg"),
        }
    }
}

/// Trims `value` and treats blank text as absent.
pub fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
