//! Tableside - Restaurant Review Backend
//! Mission: Serve the review app behind a credential-and-session gate

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tableside_backend::{
    auth::{AccountStore, AuthFlow, MemorySessionStore, SessionStore, SqliteAccountStore},
    models::Config,
    routes::build_router,
};
use tokio::{net::TcpListener, time::interval};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let sessions = Arc::new(MemorySessionStore::new(config.session_ttl_secs));
    let accounts = SqliteAccountStore::new(&config.database_path)
        .context("Failed to open account database")?;

    let flow = AuthFlow {
        sessions: sessions.clone() as Arc<dyn SessionStore>,
        accounts: Arc::new(accounts) as Arc<dyn AccountStore>,
        signup_iterations: config.signup_iterations,
    };

    // Expired sessions are also dropped lazily on access; this keeps the map
    // from accumulating tokens of clients that never came back.
    {
        let sessions = sessions.clone();
        tokio::spawn(async move {
            let mut tick = interval(Duration::from_secs(30));
            loop {
                tick.tick().await;
                let purged = sessions.purge_expired();
                if purged > 0 {
                    debug!("purged {} expired sessions", purged);
                }
            }
        });
    }

    let app = build_router(flow);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("* Listening on port {} *", config.port);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
