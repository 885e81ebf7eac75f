use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{info, warn};

use mailsmart_db::Database;
use mailsmart_db::models::NewUser;
use mailsmart_types::api::{Claims, LoginRequest, LoginResponse};
use mailsmart_types::models::Role;

use crate::classifier::ClassifierClient;
use crate::convert::{parse_role, user_response};
use crate::error::ApiError;

pub const SESSION_COOKIE: &str = "mailsmart_session";

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub session_ttl: chrono::Duration,
    pub classifier: ClassifierClient,
}

/// Shared by `/login` and `/admin/login`. The response tells the client which
/// panel the user belongs to; the access middleware enforces it afterwards.
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_email(req.email.trim())?
        .ok_or(ApiError::Unauthorized)?;

    if !verify_password(&req.password, &user.password)? {
        warn!("Failed login for {}", user.email);
        return Err(ApiError::Unauthorized);
    }

    if user.email_verified_at.is_none() {
        return Err(ApiError::Forbidden);
    }

    let role = parse_role(&user.role, user.id);
    let token = create_token(&state.jwt_secret, user.id, role, state.session_ttl)?;
    info!("User {} logged in ({})", user.id, role);

    let cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        token,
        state.session_ttl.num_seconds()
    );

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            token,
            user: user_response(&user),
            redirect: role.dashboard_path().to_string(),
        }),
    ))
}

pub async fn logout() -> impl IntoResponse {
    let cookie = format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", SESSION_COOKIE);
    (StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)])
}

pub fn create_token(
    secret: &str,
    user_id: i64,
    role: Role,
    ttl: chrono::Duration,
) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        role,
        exp: (chrono::Utc::now() + ttl).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// `None` for anything that does not verify: bad signature, expired, malformed.
pub fn decode_token(secret: &str, token: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

/// Hash password with Argon2id
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, stored_hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| anyhow::anyhow!("Corrupt password hash: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Create the bootstrap admin account unless that email already exists.
pub fn ensure_admin(db: &Database, name: &str, email: &str, password: &str) -> anyhow::Result<()> {
    if db.get_user_by_email(email)?.is_some() {
        return Ok(());
    }

    let password_hash = hash_password(password)?;
    let id = db.create_user(&NewUser {
        name,
        email,
        password_hash: &password_hash,
        role: Role::Admin.as_str(),
        email_verified: true,
    })?;
    info!("Created bootstrap admin {} (id {})", email, id);
    Ok(())
}
