//! Account endpoints: registration, login and the current account

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::middleware::RequireCaller;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::AccountRecord;
use crate::infrastructure::account::RegisterAccountRequest;

pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(get_current_account))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// Registered member this account claims; each member backs one account
    #[serde(default)]
    pub member_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub token: String,
    pub account: AccountRecord,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub account: AccountRecord,
    pub expires_at: DateTime<Utc>,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let session = state
        .accounts
        .register(RegisterAccountRequest {
            username: request.username,
            email: request.email,
            password: request.password,
            full_name: request.full_name,
            phone: request.phone,
            address: request.address,
            member_id: request.member_id,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "註冊成功".to_string(),
            token: session.token.token,
            account: session.account,
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let session = state
        .accounts
        .login(&request.username, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        message: "登錄成功".to_string(),
        token: session.token.token,
        account: session.account,
        expires_at: session.token.expires_at,
    }))
}

/// GET /api/auth/me
pub async fn get_current_account(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
) -> Result<Json<AccountRecord>, ApiError> {
    Ok(Json(state.accounts.get(&caller.account_id).await?))
}
