use crate::{
    error::{present, AccountError, ApiError},
    AppState,
};
use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::{extract::FromRequestParts, extract::State, Json};
use http::{header, request::Parts};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use qc_db::types::Role;
use std::time::Duration;

const EDITOR_REQUIRED: &str = "Editor or administrator rights required to perform this action.";
const ADMIN_REQUIRED: &str = "Administrator rights required.";
const BAD_CREDENTIALS: &str = "Bad username or password";

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    pub sub: i32,
    pub username: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Token signing failed: {0}")]
    Sign(jsonwebtoken::errors::Error),
    #[error("Stored password hash could not be parsed: {0}")]
    StoredPasswordUnableToParse(argon2::password_hash::Error),
    #[error("Password hash failed: {0}")]
    PasswordHash(argon2::password_hash::Error),
    #[error("Password hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        tracing::error!("authentication failure: {err}");
        ApiError::Internal(err.to_string())
    }
}

/// HS256 keys derived from the configured secret, with the lifetime of issued tokens.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime,
        }
    }

    pub fn issue(&self, user_id: i32, username: &str, role: Role) -> Result<String, Error> {
        let iat = jiff::Timestamp::now().as_second();
        let claims = Claims {
            sub: user_id,
            username: username.to_owned(),
            role: role.as_str().to_owned(),
            iat,
            exp: iat + self.lifetime.as_secs() as i64,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(Error::Sign)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    ApiError::Unauthorized("Token has expired".to_owned())
                }
                _ => ApiError::Unauthorized("Invalid token".to_owned()),
            })
    }
}

pub async fn hash_password(password: String) -> Result<String, Error> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(Error::PasswordHash)
    })
    .await?
}

pub async fn verify_password(password: String, password_hash: String) -> Result<bool, Error> {
    tokio::task::spawn_blocking(move || {
        let parsed_hash =
            PasswordHash::new(&password_hash).map_err(Error::StoredPasswordUnableToParse)?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    })
    .await?
}

/// The holder of a valid bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
    pub role: Role,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization Header".to_owned()))?
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                ApiError::Unauthorized("Authorization header must be 'Bearer <token>'".to_owned())
            })?;
        let claims = state.token_keys.verify(token)?;
        let role = claims
            .role
            .parse::<Role>()
            .map_err(|_| ApiError::Unauthorized("Invalid token".to_owned()))?;
        Ok(CurrentUser {
            id: claims.sub,
            username: claims.username,
            role,
        })
    }
}

/// A signed in `admin` or `user`.
#[derive(Debug, Clone)]
pub struct Editor(pub CurrentUser);

impl FromRequestParts<AppState> for Editor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if user.role.can_edit() {
            Ok(Editor(user))
        } else {
            Err(ApiError::Forbidden(EDITOR_REQUIRED.to_owned()))
        }
    }
}

#[derive(Debug, Clone)]
pub struct Admin(pub CurrentUser);

impl FromRequestParts<AppState> for Admin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if user.role.is_admin() {
            Ok(Admin(user))
        } else {
            Err(ApiError::Forbidden(ADMIN_REQUIRED.to_owned()))
        }
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct Credentials {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct AccessToken {
    access_token: String,
}

#[tracing::instrument(skip_all)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<AccessToken>, AccountError> {
    let (Some(username), Some(password)) = (
        present(credentials.username),
        credentials.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::bad_request("Missing username or password").into());
    };
    let Some(user) = app_state
        .store
        .load_active_user_by_username(&username)
        .await?
    else {
        tracing::info!(%username, "sign in refused: no active user");
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.to_owned()).into());
    };
    if !verify_password(password, user.password_hash.clone())
        .await
        .map_err(ApiError::from)?
    {
        tracing::info!(%username, "sign in refused: password mismatch");
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.to_owned()).into());
    }
    let role = user
        .role
        .parse::<Role>()
        .map_err(|err| ApiError::Internal(err.to_string()))?;
    let access_token = app_state
        .token_keys
        .issue(user.id, &user.username, role)
        .map_err(ApiError::from)?;
    tracing::info!(%username, "signed in");
    Ok(Json(AccessToken { access_token }))
}
