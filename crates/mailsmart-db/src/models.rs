/// Database row types. These map directly to SQLite rows and are kept
/// independent of the mailsmart-types API models.

pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub email_verified_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub struct MessageRow {
    pub id: i64,
    pub user_id: i64,
    pub author_name: String,
    pub title: String,
    pub message: String,
    pub is_spam: bool,
    pub is_real_spam: bool,
    pub emotion: String,
    pub emotion_real: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub email_verified: bool,
}

/// Partial user update; `None` leaves the column untouched.
#[derive(Default)]
pub struct UserChanges<'a> {
    pub name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub password_hash: Option<&'a str>,
    pub role: Option<&'a str>,
}

/// A freshly classified message. Corrections start out equal to the prediction.
pub struct NewMessage<'a> {
    pub user_id: i64,
    pub title: &'a str,
    pub message: &'a str,
    pub is_spam: bool,
    pub emotion: &'a str,
}

/// Writable message columns. Title, body and predictions are only written on insert.
#[derive(Default)]
pub struct MessageChanges<'a> {
    pub is_real_spam: Option<bool>,
    pub emotion_real: Option<&'a str>,
}

#[derive(Default)]
pub struct MessageFilter<'a> {
    /// Restrict to one owner (user panel); `None` lists every message.
    pub owner_id: Option<i64>,
    pub search: Option<&'a str>,
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccuracyCounts {
    pub total: u64,
    pub spam_correct: u64,
    pub emotion_correct: u64,
}
