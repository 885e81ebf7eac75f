use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Color, Emotion, Role};
use crate::notifications::Notification;

// -- Session --

/// Session token claims. The role is advisory; the middleware reloads the user on
/// every request so role changes and deletions apply immediately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub role: Role,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
    /// Dashboard of the panel matching the user's role.
    pub redirect: String,
}

// -- Users --

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub role_label: String,
    pub role_color: Color,
    pub email_verified: bool,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub email_verified: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub email_verified: Option<bool>,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateMessageRequest {
    pub title: String,
    pub message: String,
}

/// Title and body are fixed once stored; only the corrections are writable.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateMessageRequest {
    pub is_real_spam: Option<bool>,
    pub emotion_real: Option<Emotion>,
}

/// Table row: shows the corrected ("real") labels.
#[derive(Debug, Clone, Serialize)]
pub struct MessageSummary {
    pub id: i64,
    pub user_id: i64,
    pub author_name: String,
    pub title: String,
    pub excerpt: String,
    pub is_spam: bool,
    pub spam_label: String,
    pub spam_color: Color,
    pub emotion: Emotion,
    pub emotion_label: String,
    pub emotion_color: Color,
    pub created_at: DateTime<Utc>,
}

/// Read-only prediction section of the message view. The detected emotion is
/// shown as a neutral `primary` badge; emotion colors belong to the table.
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    pub is_spam: bool,
    pub spam_label: String,
    pub spam_color: Color,
    pub emotion: Emotion,
    pub emotion_label: String,
    pub emotion_color: Color,
}

#[derive(Debug, Clone, Serialize)]
pub struct Corrections {
    pub is_real_spam: bool,
    pub emotion_real: Emotion,
    pub emotion_real_label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageDetail {
    pub id: i64,
    pub user_id: i64,
    pub author_name: String,
    pub title: String,
    pub message: String,
    pub detection: Detection,
    pub corrections: Corrections,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body returned by create/update: the stored record plus any toasts raised while
/// talking to the prediction API.
#[derive(Debug, Serialize)]
pub struct MessageMutationResponse {
    pub message: MessageDetail,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

// -- Dashboards --

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stat {
    pub label: String,
    pub value: String,
    pub description: String,
    pub color: Color,
}

#[derive(Debug, Serialize)]
pub struct AdminDashboard {
    pub stats: Vec<Stat>,
    pub latest_messages: Vec<MessageSummary>,
}

#[derive(Debug, Serialize)]
pub struct UserDashboard {
    pub message_count: u64,
    pub latest_messages: Vec<MessageSummary>,
}

// -- Prediction API (outbound) --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub text: String,
}

/// Subset of the prediction API response we consume; extra fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictResponse {
    #[serde(default)]
    pub is_spam: Option<bool>,
    #[serde(default)]
    pub emotion: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub message_id: i64,
    pub user_id: i64,
    pub text: String,
    pub initial_spam_prediction: bool,
    pub initial_sentiment_prediction: Emotion,
    pub real_spam: bool,
    pub real_emotion: Emotion,
}
