use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use tracing::info;

use mailsmart_db::models::{NewUser, UserChanges};
use mailsmart_types::api::{CreateUserRequest, UpdateUserRequest, UserResponse};

use crate::auth::{AppState, hash_password};
use crate::convert::user_response;
use crate::error::{ApiError, Validator};
use crate::middleware::CurrentUser;

const PASSWORD_MIN_CHARS: usize = 8;

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub search: Option<String>,
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    current.require_admin()?;
    let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let rows = state.db.list_users(search)?;
    Ok(Json(rows.iter().map(user_response).collect()))
}

pub async fn create_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    WithRejection(Json(req), _): WithRejection<Json<CreateUserRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    current.require_admin()?;

    let name = req.name.trim();
    let email = req.email.trim();
    let mut v = Validator::default();
    check_name(&mut v, name);
    check_email(&mut v, email);
    check_password(&mut v, &req.password);
    v.finish()?;

    if state.db.get_user_by_email(email)?.is_some() {
        return Err(email_taken_conflict());
    }

    let password_hash = hash_password(&req.password)?;
    let id = state
        .db
        .create_user(&NewUser {
            name,
            email,
            password_hash: &password_hash,
            role: req.role.as_str(),
            email_verified: req.email_verified,
        })
        .map_err(email_taken)?;
    let row = state
        .db
        .get_user_by_id(id)?
        .ok_or_else(|| anyhow::anyhow!("user {} missing right after insert", id))?;

    info!("Admin {} created user {} ({})", current.id, id, req.role);
    Ok((StatusCode::CREATED, Json(user_response(&row))))
}

pub async fn show_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    current.require_admin()?;
    let row = state.db.get_user_by_id(id)?.ok_or(ApiError::NotFound)?;
    Ok(Json(user_response(&row)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateUserRequest>, ApiError>,
) -> Result<Json<UserResponse>, ApiError> {
    current.require_admin()?;
    state.db.get_user_by_id(id)?.ok_or(ApiError::NotFound)?;

    let name = req.name.as_deref().map(str::trim);
    let email = req.email.as_deref().map(str::trim);
    let mut v = Validator::default();
    if let Some(name) = name {
        check_name(&mut v, name);
    }
    if let Some(email) = email {
        check_email(&mut v, email);
    }
    if let Some(password) = &req.password {
        check_password(&mut v, password);
    }
    v.finish()?;

    if let Some(email) = email {
        if state.db.get_user_by_email(email)?.is_some_and(|other| other.id != id) {
            return Err(email_taken_conflict());
        }
    }

    let password_hash = req.password.as_deref().map(hash_password).transpose()?;
    state.db.update_user(
        id,
        &UserChanges {
            name,
            email,
            password_hash: password_hash.as_deref(),
            role: req.role.map(|r| r.as_str()),
        },
    )
    .map_err(email_taken)?;
    if let Some(verified) = req.email_verified {
        state.db.set_email_verified(id, verified)?;
    }

    let row = state.db.get_user_by_id(id)?.ok_or(ApiError::NotFound)?;
    info!("Admin {} updated user {}", current.id, id);
    Ok(Json(user_response(&row)))
}

/// POST /admin/users/{id}/verify-email
pub async fn verify_email(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    current.require_admin()?;
    if !state.db.set_email_verified(id, true)? {
        return Err(ApiError::NotFound);
    }
    let row = state.db.get_user_by_id(id)?.ok_or(ApiError::NotFound)?;
    Ok(Json(user_response(&row)))
}

/// DELETE /admin/users/{id}: the user's messages are removed with them.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    current.require_admin()?;
    if id == current.id {
        return Err(ApiError::invalid("id", "You cannot delete your own account."));
    }
    if !state.db.delete_user(id)? {
        return Err(ApiError::NotFound);
    }
    info!("Admin {} deleted user {}", current.id, id);
    Ok(StatusCode::NO_CONTENT)
}

fn email_taken_conflict() -> ApiError {
    ApiError::Conflict("The email has already been taken.".into())
}

/// The lookup before a write can race another request; the UNIQUE index settles it.
fn email_taken(err: anyhow::Error) -> ApiError {
    if mailsmart_db::is_unique_violation(&err) {
        email_taken_conflict()
    } else {
        ApiError::Internal(err)
    }
}

fn check_name(v: &mut Validator, name: &str) {
    v.check(!name.is_empty(), "name", "The name field is required.");
}

fn check_email(v: &mut Validator, email: &str) {
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    v.check(well_formed, "email", "The email must be a valid email address.");
}

fn check_password(v: &mut Validator, password: &str) {
    v.check(
        password.chars().count() >= PASSWORD_MIN_CHARS,
        "password",
        "The password must be at least 8 characters.",
    );
}
