use std::sync::Arc;

use tera::Tera;
use thiserror::Error;
use tracing::{info, warn};

use automarket_bot::{AdminNotifier, BotRouter, HttpTelegramApi, SellConversation, TelegramApi};
use automarket_core::config::AppConfig;
use automarket_db::repositories::{
    CatalogReader, LeadStore, SessionStore, SqlAdminSessionRepository, SqlCatalogRepository,
    SqlLeadRepository, SqlSessionRepository, SqlUserRepository, UserStore,
};
use automarket_db::{connect_with_settings, migrations, DbPool};

/// Shared handler state for every HTTP route.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db_pool: DbPool,
    pub catalog: Arc<SqlCatalogRepository>,
    pub leads: Arc<SqlLeadRepository>,
    pub admin_sessions: Arc<SqlAdminSessionRepository>,
    pub bot_router: Arc<BotRouter>,
    pub templates: Arc<Tera>,
    pub bot_username: Option<String>,
}

pub struct Application {
    pub state: AppState,
    pub api: Arc<dyn TelegramApi>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("template registration failed: {0}")]
    Templates(#[source] tera::Error),
}

pub async fn bootstrap(config: AppConfig) -> Result<Application, BootstrapError> {
    let api: Arc<dyn TelegramApi> = Arc::new(HttpTelegramApi::new(&config.telegram.bot_token));
    bootstrap_with_api(config, api).await
}

/// Bootstrap against an explicit Bot API client, used by tests to swap in a
/// recording double.
pub async fn bootstrap_with_api(
    config: AppConfig,
    api: Arc<dyn TelegramApi>,
) -> Result<Application, BootstrapError> {
    info!("starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!("database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!("database migrations applied");

    let catalog = Arc::new(SqlCatalogRepository::new(db_pool.clone()));
    let leads = Arc::new(SqlLeadRepository::new(db_pool.clone()));
    let sessions: Arc<dyn SessionStore> = Arc::new(SqlSessionRepository::new(db_pool.clone()));
    let users: Arc<dyn UserStore> = Arc::new(SqlUserRepository::new(db_pool.clone()));
    let admin_sessions = Arc::new(SqlAdminSessionRepository::new(db_pool.clone()));

    let public_url = config.server.public_url.clone();
    let notifier = Arc::new(AdminNotifier::new(
        api.clone(),
        config.telegram.admin_chat_ids.clone(),
        format!("{public_url}/admin/leads"),
    ));
    let conversation = Arc::new(SellConversation::new(
        sessions,
        leads.clone() as Arc<dyn LeadStore>,
        api.clone(),
        notifier,
        public_url.clone(),
    ));
    let bot_router = Arc::new(BotRouter::new(
        api.clone(),
        users,
        catalog.clone() as Arc<dyn CatalogReader>,
        conversation,
        public_url,
    ));

    // The webhook and profile lookups are best effort: a flaky Telegram
    // outage must not keep the site and admin panel down.
    if let Err(error) = api.set_webhook(&config.webhook_url()).await {
        warn!(error = %error, "failed to register telegram webhook");
    } else {
        info!(path = %config.webhook_path(), "telegram webhook registered");
    }
    let bot_username = match api.get_me().await {
        Ok(profile) => Some(profile.username),
        Err(error) => {
            warn!(error = %error, "failed to resolve bot profile");
            None
        }
    };

    let templates = crate::templates::init_templates().map_err(BootstrapError::Templates)?;

    let state = AppState {
        config: Arc::new(config),
        db_pool,
        catalog,
        leads,
        admin_sessions,
        bot_router,
        templates,
        bot_username,
    };

    Ok(Application { state, api })
}
