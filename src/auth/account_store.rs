//! Account Storage
//! Mission: Persist reviewer accounts with SQLite

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::info;
use uuid::Uuid;

/// A reviewer account. The `credential` field holds the serialized password
/// credential and is never exposed to clients.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub display_name: String,
    pub email: String,
    pub credential: String,
    pub karma: Option<f64>,
    pub created_at: String,
}

/// Failure modes of account creation.
#[derive(Debug)]
pub enum StoreError {
    /// The email uniqueness constraint was violated.
    DuplicateEmail,
    Other(anyhow::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::DuplicateEmail => write!(f, "email is already registered"),
            StoreError::Other(e) => write!(f, "account store failure: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

/// Record store contract consumed by the authentication flow. The flow never
/// issues queries itself; it depends only on these two operations.
pub trait AccountStore: Send + Sync {
    fn find_by_email(&self, email: &str) -> Result<Option<Account>>;
    fn create(&self, display_name: &str, email: &str, credential: &str)
        -> Result<Account, StoreError>;
}

/// Account storage with SQLite backend
pub struct SqliteAccountStore {
    db_path: String,
}

impl SqliteAccountStore {
    /// Create a new account store and initialize the schema.
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    fn init_db(&self) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                display_name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                credential TEXT NOT NULL,
                karma REAL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    fn row_to_account(
        row: &rusqlite::Row<'_>,
    ) -> rusqlite::Result<(String, String, String, String, Option<f64>, String)> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
        ))
    }
}

impl AccountStore for SqliteAccountStore {
    fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let conn = Connection::open(&self.db_path)?;

        let mut stmt = conn.prepare(
            "SELECT id, display_name, email, credential, karma, created_at
             FROM accounts WHERE email = ?1",
        )?;

        let row = stmt.query_row(params![email], Self::row_to_account);

        match row {
            Ok((id, display_name, email, credential, karma, created_at)) => {
                let id = Uuid::parse_str(&id).context("corrupt account id in store")?;
                Ok(Some(Account {
                    id,
                    display_name,
                    email,
                    credential,
                    karma,
                    created_at,
                }))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn create(
        &self,
        display_name: &str,
        email: &str,
        credential: &str,
    ) -> Result<Account, StoreError> {
        let account = Account {
            id: Uuid::new_v4(),
            display_name: display_name.to_string(),
            email: email.to_string(),
            credential: credential.to_string(),
            karma: None,
            created_at: Utc::now().to_rfc3339(),
        };

        let conn = Connection::open(&self.db_path)
            .context("Failed to open account database")
            .map_err(StoreError::Other)?;

        let result = conn.execute(
            "INSERT INTO accounts (id, display_name, email, credential, karma, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                account.id.to_string(),
                account.display_name,
                account.email,
                account.credential,
                account.karma,
                account.created_at,
            ],
        );

        match result {
            Ok(_) => {
                info!("Created account: {}", account.display_name);
                Ok(account)
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::DuplicateEmail)
            }
            Err(e) => Err(StoreError::Other(e.into())),
        }
    }
}
