use axum::{Extension, Json, extract::State};

use mailsmart_db::models::{AccuracyCounts, MessageFilter};
use mailsmart_types::api::{AdminDashboard, Stat, UserDashboard};
use mailsmart_types::models::Color;

use crate::auth::AppState;
use crate::convert::message_summary;
use crate::error::{ApiError, blocking};
use crate::middleware::CurrentUser;

const LATEST_MESSAGES: u32 = 10;

/// GET /admin: accuracy stats plus the latest messages of every user.
pub async fn admin_dashboard(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<AdminDashboard>, ApiError> {
    current.require_admin()?;

    let (counts, rows) = blocking(move || {
        let counts = state.db.accuracy_counts()?;
        let rows = state.db.list_messages(&MessageFilter {
            limit: LATEST_MESSAGES,
            ..Default::default()
        })?;
        Ok((counts, rows))
    })
    .await?;

    Ok(Json(AdminDashboard {
        stats: accuracy_stats(counts),
        latest_messages: rows.iter().map(message_summary).collect(),
    }))
}

/// GET /: the caller's own latest messages. No accuracy stats here.
pub async fn user_dashboard(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<UserDashboard>, ApiError> {
    let owner_id = Some(current.id);
    let (count, rows) = blocking(move || {
        let count = state.db.count_messages(owner_id, None)?;
        let rows = state.db.list_messages(&MessageFilter {
            owner_id,
            limit: LATEST_MESSAGES,
            ..Default::default()
        })?;
        Ok((count, rows))
    })
    .await?;

    Ok(Json(UserDashboard {
        message_count: count,
        latest_messages: rows.iter().map(message_summary).collect(),
    }))
}

pub fn accuracy_stats(counts: AccuracyCounts) -> Vec<Stat> {
    vec![
        accuracy_stat("Spam accuracy", counts.spam_correct, counts.total),
        accuracy_stat("Emotion accuracy", counts.emotion_correct, counts.total),
    ]
}

fn accuracy_stat(label: &str, correct: u64, total: u64) -> Stat {
    if total == 0 {
        return Stat {
            label: label.to_string(),
            value: "0%".to_string(),
            description: "No messages".to_string(),
            color: Color::Gray,
        };
    }

    let pct = ((correct as f64 / total as f64) * 100.0 * 100.0).round() / 100.0;
    Stat {
        label: label.to_string(),
        value: format!("{}%", format_percent(pct)),
        description: format!("{} correct predictions out of {}", correct, total),
        color: color_for_accuracy(pct),
    }
}

/// Two decimals at most, trailing zeros dropped: 90 -> "90", 66.70 -> "66.7".
fn format_percent(pct: f64) -> String {
    let s = format!("{:.2}", pct);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn color_for_accuracy(pct: f64) -> Color {
    if pct >= 90.0 {
        Color::Success
    } else if pct >= 70.0 {
        Color::Warning
    } else {
        Color::Danger
    }
}
