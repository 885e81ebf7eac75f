use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::headers::{Cookie, HeaderMapExt};
use tracing::debug;

use mailsmart_types::models::Role;

use crate::access::{self, Access};
use crate::auth::{AppState, SESSION_COOKIE, decode_token};
use crate::convert::parse_role;
use crate::error::ApiError;

/// The authenticated caller, inserted as a request extension by [`require_panel_access`].
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub role: Role,
}

impl CurrentUser {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role.is_admin() { Ok(()) } else { Err(ApiError::Forbidden) }
    }
}

/// Resolve the session and apply the panel policy: mismatches become 303 redirects.
pub async fn require_panel_access(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = match session_token(&req) {
        Some(token) => resolve_user(&state, &token)?,
        None => None,
    };

    let path = req.uri().path().to_string();
    match access::decide(&path, identity.as_ref().map(|u| u.role)) {
        Access::Redirect(to) => {
            debug!("Redirecting {} -> {}", path, to);
            Ok(Redirect::to(to).into_response())
        }
        Access::Proceed => {
            if let Some(user) = identity {
                req.extensions_mut().insert(user);
            }
            Ok(next.run(req).await)
        }
    }
}

/// Bearer token first, then the session cookie set at login.
fn session_token(req: &Request) -> Option<String> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    bearer.or_else(|| {
        req.headers()
            .typed_get::<Cookie>()
            .and_then(|c| c.get(SESSION_COOKIE).map(str::to_string))
    })
}

/// Reload the user behind a token. Deleted or unverified users count as anonymous,
/// and the role always comes from the database rather than the token.
fn resolve_user(state: &AppState, token: &str) -> Result<Option<CurrentUser>, ApiError> {
    let Some(claims) = decode_token(&state.jwt_secret, token) else {
        return Ok(None);
    };

    let user = state.db.get_user_by_id(claims.sub)?;
    Ok(user
        .filter(|u| u.email_verified_at.is_some())
        .map(|u| CurrentUser {
            id: u.id,
            role: parse_role(&u.role, u.id),
        }))
}
