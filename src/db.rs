use crate::errors::{ApiError, ApiResult};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

pub type DbPool = Arc<Mutex<Connection>>;

pub fn init_db(data_dir: &Path) -> ApiResult<DbPool> {
    std::fs::create_dir_all(data_dir)
        .map_err(|e| ApiError::Database(format!("create dir: {e}")))?;
    let db_path = data_dir.join("tradebook.db");
    let conn = Connection::open(&db_path)?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;")?;

    let schema = include_str!("../migrations/001_init.sql");
    conn.execute_batch(schema)?;

    tracing::info!("database initialized at {}", db_path.display());
    Ok(Arc::new(Mutex::new(conn)))
}

fn lock(db: &DbPool) -> ApiResult<MutexGuard<'_, Connection>> {
    db.lock()
        .map_err(|e| ApiError::Database(format!("lock poisoned: {e}")))
}

// ── Domain types ──

/// Profit or loss outcome. The sign of a trade lives here, never in `amount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeKind {
    Profit,
    Loss,
}

impl TradeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeKind::Profit => "profit",
            TradeKind::Loss => "loss",
        }
    }
}

impl std::fmt::Display for TradeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single journal entry. `id` and `owner_id` are assigned at creation and
/// never change; everything else is editable.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TradeRecord {
    pub id: String,
    pub owner_id: String,
    pub amount: f64,
    pub kind: TradeKind,
    pub target: String,
    pub timestamp: DateTime<Utc>,
    pub notes: Option<String>,
}

impl TradeRecord {
    /// Signed contribution: +amount for a profit, -amount for a loss.
    #[inline]
    pub fn net(&self) -> f64 {
        match self.kind {
            TradeKind::Profit => self.amount,
            TradeKind::Loss => -self.amount,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

// ── User queries ──

pub fn create_user(db: &DbPool, user: &UserRow) -> ApiResult<()> {
    let conn = lock(db)?;
    conn.execute(
        "INSERT INTO users (id, username, password_hash, email, name, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            user.id,
            user.username,
            user.password_hash,
            user.email,
            user.name,
            user.created_at,
            user.updated_at
        ],
    )?;
    Ok(())
}

pub fn get_user_by_username(db: &DbPool, username: &str) -> ApiResult<Option<UserRow>> {
    let conn = lock(db)?;
    let mut stmt = conn.prepare(
        "SELECT id, username, password_hash, email, name, created_at, updated_at
         FROM users WHERE username = ?1",
    )?;
    let mut rows = stmt.query_map(rusqlite::params![username], user_from_row)?;
    Ok(rows.next().transpose()?)
}

pub fn get_user_by_id(db: &DbPool, user_id: &str) -> ApiResult<Option<UserRow>> {
    let conn = lock(db)?;
    let mut stmt = conn.prepare(
        "SELECT id, username, password_hash, email, name, created_at, updated_at
         FROM users WHERE id = ?1",
    )?;
    let mut rows = stmt.query_map(rusqlite::params![user_id], user_from_row)?;
    Ok(rows.next().transpose()?)
}

pub fn username_exists(db: &DbPool, username: &str) -> ApiResult<bool> {
    let conn = lock(db)?;
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE username = ?1",
        rusqlite::params![username],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// True when `email` is already on an account other than `user_id`.
/// Pass an empty `user_id` to check against all accounts (registration).
pub fn email_taken_by_other(db: &DbPool, email: &str, user_id: &str) -> ApiResult<bool> {
    let conn = lock(db)?;
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE email = ?1 AND id != ?2",
        rusqlite::params![email, user_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn update_user_profile(
    db: &DbPool,
    user_id: &str,
    name: Option<&str>,
    email: Option<&str>,
) -> ApiResult<bool> {
    let conn = lock(db)?;
    let changed = conn.execute(
        "UPDATE users SET name = ?1, email = ?2, updated_at = ?3 WHERE id = ?4",
        rusqlite::params![name, email, Utc::now().to_rfc3339(), user_id],
    )?;
    Ok(changed > 0)
}

pub fn update_user_password(db: &DbPool, user_id: &str, password_hash: &str) -> ApiResult<bool> {
    let conn = lock(db)?;
    let changed = conn.execute(
        "UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3",
        rusqlite::params![password_hash, Utc::now().to_rfc3339(), user_id],
    )?;
    Ok(changed > 0)
}

// ── Trade queries (every statement is owner-scoped) ──

pub fn list_trades(db: &DbPool, owner_id: &str) -> ApiResult<Vec<TradeRecord>> {
    let conn = lock(db)?;
    let mut stmt = conn.prepare(
        "SELECT id, owner_id, amount, kind, target, timestamp, notes
         FROM trades WHERE owner_id = ?1 ORDER BY timestamp DESC",
    )?;
    let rows = stmt.query_map(rusqlite::params![owner_id], trade_from_row)?;
    let mut trades = Vec::new();
    for row in rows {
        trades.push(row?);
    }
    Ok(trades)
}

pub fn get_trade(db: &DbPool, trade_id: &str, owner_id: &str) -> ApiResult<Option<TradeRecord>> {
    let conn = lock(db)?;
    let mut stmt = conn.prepare(
        "SELECT id, owner_id, amount, kind, target, timestamp, notes
         FROM trades WHERE id = ?1 AND owner_id = ?2",
    )?;
    let mut rows = stmt.query_map(rusqlite::params![trade_id, owner_id], trade_from_row)?;
    Ok(rows.next().transpose()?)
}

pub fn insert_trade(db: &DbPool, trade: &TradeRecord) -> ApiResult<()> {
    let conn = lock(db)?;
    conn.execute(
        "INSERT INTO trades (id, owner_id, amount, kind, target, timestamp, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            trade.id,
            trade.owner_id,
            trade.amount,
            trade.kind.as_str(),
            trade.target,
            trade.timestamp.to_rfc3339(),
            trade.notes
        ],
    )?;
    Ok(())
}

/// Full-record update. Returns false when no row matched (wrong id or wrong owner).
pub fn update_trade(db: &DbPool, trade: &TradeRecord) -> ApiResult<bool> {
    let conn = lock(db)?;
    let changed = conn.execute(
        "UPDATE trades SET amount = ?1, kind = ?2, target = ?3, timestamp = ?4, notes = ?5
         WHERE id = ?6 AND owner_id = ?7",
        rusqlite::params![
            trade.amount,
            trade.kind.as_str(),
            trade.target,
            trade.timestamp.to_rfc3339(),
            trade.notes,
            trade.id,
            trade.owner_id
        ],
    )?;
    Ok(changed > 0)
}

pub fn delete_trade(db: &DbPool, trade_id: &str, owner_id: &str) -> ApiResult<bool> {
    let conn = lock(db)?;
    let changed = conn.execute(
        "DELETE FROM trades WHERE id = ?1 AND owner_id = ?2",
        rusqlite::params![trade_id, owner_id],
    )?;
    Ok(changed > 0)
}

// ── Row mapping ──

fn user_from_row(row: &rusqlite::Row) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        email: row.get(3)?,
        name: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn trade_from_row(row: &rusqlite::Row) -> rusqlite::Result<TradeRecord> {
    let kind: String = row.get(3)?;
    let timestamp: String = row.get(5)?;
    Ok(TradeRecord {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        amount: row.get(2)?,
        // The schema CHECK constraint restricts kind to these two values
        kind: if kind == "profit" {
            TradeKind::Profit
        } else {
            TradeKind::Loss
        },
        target: row.get(4)?,
        timestamp: DateTime::parse_from_rfc3339(&timestamp)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    5,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?,
        notes: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_pool() -> (tempfile::TempDir, DbPool) {
        let dir = tempfile::tempdir().expect("tempdir");
        let pool = init_db(dir.path()).expect("init db");
        (dir, pool)
    }

    fn test_user(id: &str, username: &str) -> UserRow {
        UserRow {
            id: id.into(),
            username: username.into(),
            password_hash: "$argon2id$test".into(),
            email: None,
            name: None,
            created_at: "2025-01-01T00:00:00+00:00".into(),
            updated_at: "2025-01-01T00:00:00+00:00".into(),
        }
    }

    fn test_trade(id: &str, owner: &str, amount: f64, kind: TradeKind) -> TradeRecord {
        TradeRecord {
            id: id.into(),
            owner_id: owner.into(),
            amount,
            kind,
            target: "150".into(),
            timestamp: Utc.with_ymd_and_hms(2025, 3, 10, 14, 30, 0).unwrap(),
            notes: Some("breakout entry".into()),
        }
    }

    #[test]
    fn test_insert_and_list_scoped_by_owner() {
        let (_dir, db) = test_pool();
        create_user(&db, &test_user("u1", "alice")).unwrap();
        create_user(&db, &test_user("u2", "bob")).unwrap();

        insert_trade(&db, &test_trade("t1", "u1", 100.0, TradeKind::Profit)).unwrap();
        insert_trade(&db, &test_trade("t2", "u1", 40.0, TradeKind::Loss)).unwrap();
        insert_trade(&db, &test_trade("t3", "u2", 75.0, TradeKind::Profit)).unwrap();

        let alice = list_trades(&db, "u1").unwrap();
        assert_eq!(alice.len(), 2);
        assert!(alice.iter().all(|t| t.owner_id == "u1"));

        let bob = list_trades(&db, "u2").unwrap();
        assert_eq!(bob.len(), 1);
        assert_eq!(bob[0].id, "t3");
    }

    #[test]
    fn test_update_refuses_foreign_owner() {
        let (_dir, db) = test_pool();
        create_user(&db, &test_user("u1", "alice")).unwrap();
        create_user(&db, &test_user("u2", "bob")).unwrap();
        insert_trade(&db, &test_trade("t1", "u1", 100.0, TradeKind::Profit)).unwrap();

        // Bob tries to rewrite Alice's record
        let stolen = test_trade("t1", "u2", 1.0, TradeKind::Loss);
        assert!(!update_trade(&db, &stolen).unwrap());

        let original = get_trade(&db, "t1", "u1").unwrap().unwrap();
        assert_eq!(original.amount, 100.0);
        assert_eq!(original.kind, TradeKind::Profit);
    }

    #[test]
    fn test_delete_scoped_by_owner() {
        let (_dir, db) = test_pool();
        create_user(&db, &test_user("u1", "alice")).unwrap();
        create_user(&db, &test_user("u2", "bob")).unwrap();
        insert_trade(&db, &test_trade("t1", "u1", 100.0, TradeKind::Profit)).unwrap();

        assert!(!delete_trade(&db, "t1", "u2").unwrap());
        assert!(delete_trade(&db, "t1", "u1").unwrap());
        assert!(get_trade(&db, "t1", "u1").unwrap().is_none());
    }

    #[test]
    fn test_trade_round_trips_timestamp_and_kind() {
        let (_dir, db) = test_pool();
        create_user(&db, &test_user("u1", "alice")).unwrap();
        let trade = test_trade("t1", "u1", 55.5, TradeKind::Loss);
        insert_trade(&db, &trade).unwrap();

        let loaded = get_trade(&db, "t1", "u1").unwrap().unwrap();
        assert_eq!(loaded.timestamp, trade.timestamp);
        assert_eq!(loaded.kind, TradeKind::Loss);
        assert_eq!(loaded.net(), -55.5);
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let (_dir, db) = test_pool();
        create_user(&db, &test_user("u1", "alice")).unwrap();
        assert!(create_user(&db, &test_user("u2", "alice")).is_err());
    }

    #[test]
    fn test_email_taken_by_other() {
        let (_dir, db) = test_pool();
        let mut user = test_user("u1", "alice");
        user.email = Some("alice@example.com".into());
        create_user(&db, &user).unwrap();

        assert!(email_taken_by_other(&db, "alice@example.com", "").unwrap());
        // The owner of the email is not "another" account
        assert!(!email_taken_by_other(&db, "alice@example.com", "u1").unwrap());
        assert!(!email_taken_by_other(&db, "bob@example.com", "").unwrap());
    }
}
