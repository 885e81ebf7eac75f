use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use tracing::info;

use mailsmart_db::models::{MessageChanges, MessageFilter, MessageRow, NewMessage};
use mailsmart_types::api::{
    CreateMessageRequest, MessageDetail, MessageMutationResponse, MessageSummary, Page,
    UpdateMessageRequest,
};
use mailsmart_types::models::Emotion;

use crate::access;
use crate::auth::AppState;
use crate::convert::{message_detail, message_summary};
use crate::error::{ApiError, Validator, blocking};
use crate::lifecycle;
use crate::middleware::CurrentUser;

const PER_PAGE_OPTIONS: [u32; 3] = [10, 25, 50];
const TITLE_MAX_CHARS: usize = 255;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// GET /messages: the caller's own messages.
pub async fn list_own_messages(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<MessageSummary>>, ApiError> {
    list(state, Some(current.id), query).await
}

/// GET /admin/messages: every message.
pub async fn list_all_messages(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<MessageSummary>>, ApiError> {
    current.require_admin()?;
    list(state, None, query).await
}

async fn list(
    state: AppState,
    owner_id: Option<i64>,
    query: ListQuery,
) -> Result<Json<Page<MessageSummary>>, ApiError> {
    let per_page = query.per_page.unwrap_or(PER_PAGE_OPTIONS[0]);
    if !PER_PAGE_OPTIONS.contains(&per_page) {
        return Err(ApiError::invalid("per_page", "The per page must be one of 10, 25, 50."));
    }
    let page = query.page.unwrap_or(1).max(1);
    let search = query
        .search
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let (rows, total) = blocking(move || {
        let search = search.as_deref();
        let rows = state.db.list_messages(&MessageFilter {
            owner_id,
            search,
            limit: per_page,
            offset: (page - 1).saturating_mul(per_page),
        })?;
        let total = state.db.count_messages(owner_id, search)?;
        Ok((rows, total))
    })
    .await?;

    Ok(Json(Page {
        data: rows.iter().map(message_summary).collect(),
        total,
        page,
        per_page,
    }))
}

/// POST /messages: store a new message, classified by the prediction API.
/// A failed classification still saves the message, with default labels.
pub async fn create_message(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    WithRejection(Json(req), _): WithRejection<Json<CreateMessageRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let title = req.title.trim();
    let body = req.message.trim();

    let mut v = Validator::default();
    check_title(&mut v, title);
    check_body(&mut v, body);
    v.finish()?;

    let (prediction, warning) = lifecycle::classify(&state.classifier, title, body).await;

    let id = state.db.insert_message(&NewMessage {
        user_id: current.id,
        title,
        message: body,
        is_spam: prediction.is_spam,
        emotion: prediction.emotion.as_str(),
    })?;
    let row = state
        .db
        .get_message(id)?
        .ok_or_else(|| anyhow::anyhow!("message {} missing right after insert", id))?;

    info!(
        "Message {} created by user {} (spam={}, emotion={})",
        id, current.id, prediction.is_spam, prediction.emotion
    );

    Ok((
        StatusCode::CREATED,
        Json(MessageMutationResponse {
            message: message_detail(&row),
            notifications: warning.into_iter().collect(),
        }),
    ))
}

/// GET /messages/{id}
pub async fn show_message(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<MessageDetail>, ApiError> {
    let row = load_visible(&state, &current, id)?;
    Ok(Json(message_detail(&row)))
}

/// PUT /messages/{id}: edit the correction fields. Title and body are read-only
/// once stored, so unknown fields such as `title` are rejected with a 422.
/// Feedback goes out only when a correction changed value, after the save.
pub async fn update_message(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateMessageRequest>, ApiError>,
) -> Result<Json<MessageMutationResponse>, ApiError> {
    let before = load_visible(&state, &current, id)?;

    let changes = MessageChanges {
        is_real_spam: req.is_real_spam,
        emotion_real: req.emotion_real.map(Emotion::as_str),
    };
    if !state.db.update_message(id, &changes)? {
        return Err(ApiError::NotFound);
    }
    let after = state.db.get_message(id)?.ok_or(ApiError::NotFound)?;

    let mut notifications = Vec::new();
    if lifecycle::corrections_changed(&before, &after) {
        info!("Corrections changed on message {} by user {}", id, current.id);
        notifications.push(lifecycle::report_corrections(&state.classifier, &after).await);
    }

    Ok(Json(MessageMutationResponse {
        message: message_detail(&after),
        notifications,
    }))
}

/// Someone else's message is reported as missing, not forbidden.
fn load_visible(state: &AppState, current: &CurrentUser, id: i64) -> Result<MessageRow, ApiError> {
    let row = state.db.get_message(id)?.ok_or(ApiError::NotFound)?;
    if !access::can_edit_message(current.role, current.id, row.user_id) {
        return Err(ApiError::NotFound);
    }
    Ok(row)
}

fn check_title(v: &mut Validator, title: &str) {
    v.check(!title.is_empty(), "title", "The title field is required.")
        .check(
            title.chars().count() <= TITLE_MAX_CHARS,
            "title",
            "The title may not be greater than 255 characters.",
        );
}

fn check_body(v: &mut Validator, body: &str) {
    v.check(!body.is_empty(), "message", "The message field is required.");
}
