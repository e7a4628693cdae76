//! Member endpoints
//!
//! Registration and search are public. Profile and directory endpoints
//! require a bearer token.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::middleware::RequireCaller;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::member::{MemberRecord, MemberSummary, NewMemberInput, ProfilePatch};
use crate::domain::MemberId;
use crate::infrastructure::registry::{MemberPage, MemberStats, DEFAULT_PER_PAGE};

pub fn create_members_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_members))
        .route("/register", post(register_member))
        .route("/profile", get(get_profile).put(update_profile))
        .route("/search", get(search_members))
        .route("/stats", get(member_stats))
        .route("/{member_id}", get(get_member))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredResponse {
    pub message: String,
    pub member_id: MemberId,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub term: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

/// POST /api/members/register
pub async fn register_member(
    State(state): State<AppState>,
    Json(input): Json<NewMemberInput>,
) -> Result<(StatusCode, Json<RegisteredResponse>), ApiError> {
    let member_id = state.registry.register(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisteredResponse {
            message: "會員註冊成功".to_string(),
            member_id,
        }),
    ))
}

/// GET /api/members/profile
pub async fn get_profile(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
) -> Result<Json<MemberRecord>, ApiError> {
    Ok(Json(state.registry.get_profile(&caller).await?))
}

/// PUT /api/members/profile
///
/// Keys outside the profile allow-list are dropped before anything is written.
pub async fn update_profile(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    Json(body): Json<Value>,
) -> Result<Json<MemberRecord>, ApiError> {
    let Value::Object(fields) = body else {
        return Err(ApiError::bad_request("Profile update must be a JSON object"));
    };

    let patch = ProfilePatch::from_fields(fields).map_err(crate::domain::DomainError::from)?;
    Ok(Json(state.registry.update_profile(&caller, patch).await?))
}

/// GET /api/members/search?term=
///
/// The term is matched untrimmed.
pub async fn search_members(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<MemberSummary>>, ApiError> {
    Ok(Json(state.registry.search(params.term.as_deref()).await?))
}

/// GET /api/members?page=&per_page=
pub async fn list_members(
    State(state): State<AppState>,
    RequireCaller(_caller): RequireCaller,
    Query(params): Query<ListParams>,
) -> Result<Json<MemberPage>, ApiError> {
    let page = params.page.unwrap_or(1);
    let per_page = params.per_page.unwrap_or(DEFAULT_PER_PAGE);

    Ok(Json(state.registry.list(page, per_page).await?))
}

/// GET /api/members/stats
pub async fn member_stats(
    State(state): State<AppState>,
    RequireCaller(_caller): RequireCaller,
) -> Result<Json<MemberStats>, ApiError> {
    Ok(Json(state.registry.stats().await?))
}

/// GET /api/members/{member_id}
pub async fn get_member(
    State(state): State<AppState>,
    RequireCaller(_caller): RequireCaller,
    Path(member_id): Path<String>,
) -> Result<Json<MemberRecord>, ApiError> {
    Ok(Json(state.registry.get(&member_id).await?))
}
