use crate::models::{
    AccuracyCounts, MessageChanges, MessageFilter, MessageRow, NewMessage, NewUser, UserChanges,
    UserRow,
};
use crate::Database;
use anyhow::Result;
use rusqlite::{Connection, Row};

const USER_COLUMNS: &str =
    "id, name, email, password, role, email_verified_at, created_at, updated_at";

const MESSAGE_SELECT: &str = "SELECT m.id, m.user_id, u.name, m.title, m.message, m.is_spam, m.is_real_spam,
            m.emotion, m.emotion_real, m.created_at, m.updated_at
     FROM messages m
     LEFT JOIN users u ON m.user_id = u.id";

// Shared by list and count so both see the same rows
const MESSAGE_WHERE: &str = "WHERE (?1 IS NULL OR m.user_id = ?1)
       AND (?2 IS NULL
            OR m.title LIKE '%' || ?2 || '%' ESCAPE '\\'
            OR m.message LIKE '%' || ?2 || '%' ESCAPE '\\')";

impl Database {
    // -- Users --

    pub fn create_user(&self, user: &NewUser<'_>) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (name, email, password, role, email_verified_at)
                 VALUES (?1, ?2, ?3, ?4, CASE WHEN ?5 THEN datetime('now') ELSE NULL END)",
                rusqlite::params![
                    user.name,
                    user.email,
                    user.password_hash,
                    user.role,
                    user.email_verified
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS);
            conn.query_row(&sql, [email], user_from_row).optional()
        })
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    pub fn list_users(&self, search: Option<&str>) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM users
                 WHERE ?1 IS NULL
                    OR name LIKE '%' || ?1 || '%' ESCAPE '\\'
                    OR email LIKE '%' || ?1 || '%' ESCAPE '\\'
                 ORDER BY name, id",
                USER_COLUMNS
            );
            let pattern = search.map(escape_like);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([pattern], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Returns false when no such user exists.
    pub fn update_user(&self, id: i64, changes: &UserChanges<'_>) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let updated = conn.execute(
                "UPDATE users SET
                    name = COALESCE(?2, name),
                    email = COALESCE(?3, email),
                    password = COALESCE(?4, password),
                    role = COALESCE(?5, role),
                    updated_at = datetime('now')
                 WHERE id = ?1",
                rusqlite::params![
                    id,
                    changes.name,
                    changes.email,
                    changes.password_hash,
                    changes.role
                ],
            )?;
            Ok(updated > 0)
        })
    }

    /// Marking an already verified user keeps the original timestamp.
    pub fn set_email_verified(&self, id: i64, verified: bool) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let updated = conn.execute(
                "UPDATE users SET
                    email_verified_at = CASE
                        WHEN ?2 THEN COALESCE(email_verified_at, datetime('now'))
                        ELSE NULL
                    END,
                    updated_at = datetime('now')
                 WHERE id = ?1",
                rusqlite::params![id, verified],
            )?;
            Ok(updated > 0)
        })
    }

    /// Deletes the user; their messages go with them (ON DELETE CASCADE).
    pub fn delete_user(&self, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }

    // -- Messages --

    pub fn insert_message(&self, msg: &NewMessage<'_>) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO messages (user_id, title, message, is_spam, is_real_spam, emotion, emotion_real)
                 VALUES (?1, ?2, ?3, ?4, ?4, ?5, ?5)",
                rusqlite::params![msg.user_id, msg.title, msg.message, msg.is_spam, msg.emotion],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_message(&self, id: i64) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!("{} WHERE m.id = ?1", MESSAGE_SELECT);
            conn.query_row(&sql, [id], message_from_row).optional()
        })
    }

    /// Newest first. Timestamps have second resolution, so ties fall back to id.
    pub fn list_messages(&self, filter: &MessageFilter<'_>) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} {} ORDER BY m.created_at DESC, m.id DESC LIMIT ?3 OFFSET ?4",
                MESSAGE_SELECT, MESSAGE_WHERE
            );
            let pattern = filter.search.map(escape_like);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    rusqlite::params![filter.owner_id, pattern, filter.limit, filter.offset],
                    message_from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_messages(&self, owner_id: Option<i64>, search: Option<&str>) -> Result<u64> {
        self.with_conn(|conn| {
            let sql = format!("SELECT COUNT(*) FROM messages m {}", MESSAGE_WHERE);
            let pattern = search.map(escape_like);
            let count: i64 =
                conn.query_row(&sql, rusqlite::params![owner_id, pattern], |row| row.get(0))?;
            Ok(count as u64)
        })
    }

    /// Returns false when no such message exists.
    pub fn update_message(&self, id: i64, changes: &MessageChanges<'_>) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let updated = conn.execute(
                "UPDATE messages SET
                    is_real_spam = COALESCE(?2, is_real_spam),
                    emotion_real = COALESCE(?3, emotion_real),
                    updated_at = datetime('now')
                 WHERE id = ?1",
                rusqlite::params![id, changes.is_real_spam, changes.emotion_real],
            )?;
            Ok(updated > 0)
        })
    }

    /// Prediction-vs-correction agreement over every message, in one pass.
    pub fn accuracy_counts(&self) -> Result<AccuracyCounts> {
        self.with_conn(|conn| {
            let (total, spam, emotion): (i64, i64, i64) = conn.query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(is_spam = is_real_spam), 0),
                        COALESCE(SUM(emotion = emotion_real), 0)
                 FROM messages",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;
            Ok(AccuracyCounts {
                total: total as u64,
                spam_correct: spam as u64,
                emotion_correct: emotion as u64,
            })
        })
    }
}

fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
    conn.query_row(&sql, [id], user_from_row).optional()
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        role: row.get(4)?,
        email_verified_at: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        author_name: row.get::<_, Option<String>>(2)?.unwrap_or_else(|| "unknown".to_string()),
        title: row.get(3)?,
        message: row.get(4)?,
        is_spam: row.get(5)?,
        is_real_spam: row.get(6)?,
        emotion: row.get(7)?,
        emotion_real: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

/// Escape LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
