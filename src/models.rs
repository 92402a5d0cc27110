//! Shared configuration loaded from the environment.

use anyhow::Result;

/// Server configuration, one env var per field with a sensible default.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub port: u16,
    /// Idle lifetime of a session, in seconds. The legacy deployment used a
    /// 60 second window, which stays the default.
    pub session_ttl_secs: u64,
    /// PBKDF2 iteration count for newly created credentials. Stored records
    /// carry their own count, so raising this never breaks old accounts.
    pub signup_iterations: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let database_path =
            std::env::var("DATABASE_PATH").unwrap_or_else(|_| "./tableside.db".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .unwrap_or(8000);

        let session_ttl_secs = std::env::var("SESSION_TTL_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .unwrap_or(60);

        let signup_iterations = std::env::var("SIGNUP_ITERATIONS")
            .unwrap_or_else(|_| "36000".to_string())
            .parse()
            .unwrap_or(36_000);

        Ok(Self {
            database_path,
            port,
            session_ttl_secs,
            signup_iterations,
        })
    }
}
