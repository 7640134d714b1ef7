use axum::extract::{Path, State};

use crate::database::models::School;
use crate::error::ApiError;
use crate::handlers::parse_school_id;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::policy;
use crate::state::AppState;
use crate::validation::schema::{SchoolPayload, SchoolUpdate};
use crate::validation::ValidatedJson;

/// POST /api/schools - create a school with its address, infrastructure and levels
pub async fn post(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<SchoolPayload>,
) -> ApiResult<School> {
    let school = state.schools.create(&payload, &user.id).await?;
    tracing::info!("School {} created by {}", school.id(), user.id);
    Ok(ApiResponse::created(school))
}

/// PUT /api/schools/:id - partial update; present nested blocks replace their child row
pub async fn put(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(changes): ValidatedJson<SchoolUpdate>,
) -> ApiResult<School> {
    let id = parse_school_id(&id)?;
    authorize_change(&state, &user, id).await?;

    let school = state.schools.update(id, &changes, &user.id).await?;
    tracing::info!("School {} updated by {}", id, user.id);
    Ok(ApiResponse::success(school))
}

/// DELETE /api/schools/:id - remove a school and everything attached to it
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<School> {
    let id = parse_school_id(&id)?;
    authorize_change(&state, &user, id).await?;

    let school = state.schools.delete(id).await?;
    tracing::info!("School {} deleted by {}", id, user.id);
    Ok(ApiResponse::success(school))
}

/// Ownership is checked before any write.
async fn authorize_change(state: &AppState, user: &AuthUser, id: i64) -> Result<(), ApiError> {
    let owner = state
        .schools
        .owner_of(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("School {} not found", id)))?;

    if !policy::can_modify(user, &owner) {
        tracing::warn!("User {} tried to modify school {} owned by {}", user.id, id, owner);
        return Err(ApiError::forbidden("You can only modify schools you created"));
    }
    Ok(())
}
