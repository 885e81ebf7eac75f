use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use mailsmart_db::models::{MessageRow, UserRow};
use mailsmart_types::api::{Corrections, Detection, MessageDetail, MessageSummary, UserResponse};
use mailsmart_types::models::{Color, Emotion, Role, spam_color, spam_label};

const EXCERPT_CHARS: usize = 50;

pub fn parse_timestamp(raw: &str, what: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
            // Parse as naive UTC and convert.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on {}: {}", raw, what, e);
            DateTime::default()
        })
}

fn parse_emotion(raw: &str, message_id: i64) -> Emotion {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt emotion on message {}: {}", message_id, e);
        Emotion::Neutral
    })
}

pub fn parse_role(raw: &str, user_id: i64) -> Role {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt role on user {}: {}", user_id, e);
        Role::User
    })
}

/// First 50 characters, with an ellipsis when truncated.
pub fn excerpt(text: &str) -> String {
    match text.char_indices().nth(EXCERPT_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

pub fn message_summary(row: &MessageRow) -> MessageSummary {
    let emotion = parse_emotion(&row.emotion_real, row.id);
    MessageSummary {
        id: row.id,
        user_id: row.user_id,
        author_name: row.author_name.clone(),
        title: row.title.clone(),
        excerpt: excerpt(&row.message),
        is_spam: row.is_real_spam,
        spam_label: spam_label(row.is_real_spam).to_string(),
        spam_color: spam_color(row.is_real_spam),
        emotion,
        emotion_label: emotion.label().to_string(),
        emotion_color: emotion.color(),
        created_at: parse_timestamp(&row.created_at, "message"),
    }
}

pub fn message_detail(row: &MessageRow) -> MessageDetail {
    let predicted = parse_emotion(&row.emotion, row.id);
    let corrected = parse_emotion(&row.emotion_real, row.id);
    MessageDetail {
        id: row.id,
        user_id: row.user_id,
        author_name: row.author_name.clone(),
        title: row.title.clone(),
        message: row.message.clone(),
        detection: Detection {
            is_spam: row.is_spam,
            spam_label: spam_label(row.is_spam).to_string(),
            spam_color: spam_color(row.is_spam),
            emotion: predicted,
            emotion_label: predicted.label().to_string(),
            emotion_color: Color::Primary,
        },
        corrections: Corrections {
            is_real_spam: row.is_real_spam,
            emotion_real: corrected,
            emotion_real_label: corrected.label().to_string(),
        },
        created_at: parse_timestamp(&row.created_at, "message"),
        updated_at: parse_timestamp(&row.updated_at, "message"),
    }
}

pub fn user_response(row: &UserRow) -> UserResponse {
    let role = parse_role(&row.role, row.id);
    UserResponse {
        id: row.id,
        name: row.name.clone(),
        email: row.email.clone(),
        role,
        role_label: role.label().to_string(),
        role_color: role.color(),
        email_verified: row.email_verified_at.is_some(),
        email_verified_at: row
            .email_verified_at
            .as_deref()
            .map(|ts| parse_timestamp(ts, "user")),
        created_at: parse_timestamp(&row.created_at, "user"),
    }
}
