use std::borrow::Cow;
use std::collections::BTreeMap;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Cow<'static, str>,
    pub message: String,
}

/// Errors surfaced by HTTP handlers.
///
/// Prediction API failures never show up here: they degrade to notifications.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthenticated")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("the given data was invalid")]
    Validation(Vec<FieldError>),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError {
            field: field.into(),
            message: message.into(),
        }])
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, json!({ "error": self.to_string() })),
            Self::Forbidden => (StatusCode::FORBIDDEN, json!({ "error": self.to_string() })),
            Self::NotFound => (StatusCode::NOT_FOUND, json!({ "error": self.to_string() })),
            Self::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            Self::Validation(fields) => {
                let mut errors: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
                for f in fields {
                    errors.entry(f.field.as_ref()).or_default().push(&f.message);
                }
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    json!({ "message": self.to_string(), "errors": errors }),
                )
            }
            Self::Internal(e) => {
                error!("Internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal server error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Malformed or mistyped JSON bodies are reported like any other invalid form,
/// keyed by the offending field when serde names one.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let text = rejection.body_text();
        let detail = text
            .split_once("target type: ")
            .map(|(_, rest)| rest)
            .unwrap_or(&text);
        Self::Validation(vec![FieldError {
            field: rejected_field(detail).into(),
            message: detail.to_string(),
        }])
    }
}

/// `emotion_real: unknown variant ...` names its path up front; unknown and
/// missing fields name themselves in backticks.
fn rejected_field(detail: &str) -> String {
    for prefix in ["unknown field `", "missing field `"] {
        if let Some(rest) = detail.strip_prefix(prefix) {
            if let Some((field, _)) = rest.split_once('`') {
                return field.to_string();
            }
        }
    }
    match detail.split_once(": ") {
        Some((path, _))
            if !path.is_empty()
                && path.chars().all(|c| c.is_ascii_alphanumeric() || "_.[]".contains(c)) =>
        {
            path.to_string()
        }
        _ => "body".to_string(),
    }
}

/// Collects field errors so a form reports every problem at once.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn check(&mut self, ok: bool, field: &'static str, message: &str) -> &mut Self {
        if !ok {
            self.errors.push(FieldError {
                field: field.into(),
                message: message.to_string(),
            });
        }
        self
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }
}

/// Run blocking DB work off the async runtime.
pub async fn blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("background task failed"))
        })?
        .map_err(ApiError::Internal)
}
