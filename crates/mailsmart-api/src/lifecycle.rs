//! Side effects around message persistence.
//!
//! Classification runs before the insert and feedback runs after an update.
//! Neither can fail the surrounding save: every outcome becomes a [`Notification`].

use tracing::{info, warn};

use mailsmart_db::models::MessageRow;
use mailsmart_types::api::FeedbackRequest;
use mailsmart_types::models::Emotion;
use mailsmart_types::notifications::Notification;

use crate::classifier::{ClassifierClient, ClassifierError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Prediction {
    pub is_spam: bool,
    pub emotion: Emotion,
}

/// Text sent to the prediction API for both predict and feedback.
pub fn classification_text(title: &str, message: &str) -> String {
    format!("{} {}", title, message)
}

/// Ask the prediction API about a new message. On any failure the default
/// prediction (not spam, neutral) is returned with a warning to show the user.
pub async fn classify(
    client: &ClassifierClient,
    title: &str,
    message: &str,
) -> (Prediction, Option<Notification>) {
    match client.predict(&classification_text(title, message)).await {
        Ok(resp) => {
            let prediction = Prediction {
                is_spam: resp.is_spam.unwrap_or(false),
                emotion: Emotion::from_prediction(resp.emotion.as_deref()),
            };
            (prediction, None)
        }
        Err(e) => {
            warn!("Classification failed, saving with defaults: {}", e);
            let body = match &e {
                ClassifierError::Status { message, .. } => message.clone(),
                other => other.to_string(),
            };
            (
                Prediction::default(),
                Some(Notification::warning("Message analysis failed", body)),
            )
        }
    }
}

/// True when a correction field actually changed value.
pub fn corrections_changed(before: &MessageRow, after: &MessageRow) -> bool {
    before.is_real_spam != after.is_real_spam || before.emotion_real != after.emotion_real
}

pub fn feedback_payload(row: &MessageRow) -> FeedbackRequest {
    FeedbackRequest {
        message_id: row.id,
        user_id: row.user_id,
        text: classification_text(&row.title, &row.message),
        initial_spam_prediction: row.is_spam,
        initial_sentiment_prediction: Emotion::from_prediction(Some(row.emotion.as_str())),
        real_spam: row.is_real_spam,
        real_emotion: Emotion::from_prediction(Some(row.emotion_real.as_str())),
    }
}

/// Report a stored correction back to the prediction API, once.
pub async fn report_corrections(client: &ClassifierClient, row: &MessageRow) -> Notification {
    match client.send_feedback(&feedback_payload(row)).await {
        Ok(()) => {
            info!("Feedback sent for message {}", row.id);
            Notification::success("Feedback sent", "Thanks for your contribution!")
        }
        Err(ClassifierError::Status { status, message }) => {
            warn!("Feedback for message {} rejected ({}): {}", row.id, status, message);
            Notification::warning("Warning", "The feedback could not be delivered to the API")
        }
        Err(e) => {
            warn!("Feedback for message {} failed: {}", row.id, e);
            Notification::danger("Error", format!("Unable to send feedback: {}", e))
        }
    }
}
