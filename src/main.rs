//! RWU Inc. record-store service
//!
//! Serves the admin portal's collections over REST with SQLite persistence.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rwu_admin::config::Config;
use rwu_admin::db::{self, Repository};
use rwu_admin::models::{AdminUser, NewAdminUser};
use rwu_admin::session::hash_password;
use rwu_admin::store::{Collection, SharedStore};
use rwu_admin::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting RWU record-store service");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if no key is configured
    if config.api_key.is_none() {
        tracing::warn!("No API key configured (RWU_API_KEY). Authentication is disabled!");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    if let Some(admin) = &config.bootstrap_admin {
        let admins: Collection<AdminUser> = Collection::new(repo.clone() as SharedStore);
        let existing = admins
            .fetch_one(&admins.query().eq("email", admin.email.as_str()))
            .await?;

        if existing.is_none() {
            let user = NewAdminUser {
                email: admin.email.clone(),
                full_name: String::new(),
                role: "admin".to_string(),
                password_hash: hash_password(&admin.password)?,
            };
            admins.insert(&user).await?;
            tracing::info!("Created bootstrap admin {}", admin.email);
        }
    }

    // Create application state
    let state = AppState {
        repo,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
