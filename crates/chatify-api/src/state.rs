//! Application state wiring the chat core to its concrete infrastructure.

use std::path::PathBuf;
use std::sync::Arc;

use chatify_core::ChatHub;
use chatify_infra::avatar::HttpAvatarResolver;
use chatify_infra::config::resolve_database_url;
use chatify_infra::sqlite::{DatabasePool, SqliteChatStore};
use chatify_types::config::ServerConfig;

/// The chat core pinned to SQLite storage and HTTP avatar probing.
pub type ConcreteChatHub = ChatHub<SqliteChatStore, HttpAvatarResolver>;

/// Shared application state.
///
/// Used by both CLI commands and the HTTP/WebSocket handlers.
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<ConcreteChatHub>,
    pub store: Arc<SqliteChatStore>,
    pub config: Arc<ServerConfig>,
    pub data_dir: PathBuf,
    pub database_url: String,
}

impl AppState {
    /// Open the database (running migrations) and wire the chat core.
    pub async fn init(data_dir: PathBuf, config: ServerConfig) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&data_dir).await?;

        let database_url = resolve_database_url(&config, &data_dir);
        let pool = DatabasePool::new(&database_url).await?;
        let store = Arc::new(SqliteChatStore::new(pool));

        let avatars = Arc::new(HttpAvatarResolver::from_config(&config)?);
        if !avatars.is_enabled() {
            tracing::info!("No avatar_base_url configured, profile images disabled");
        }

        let hub = Arc::new(ChatHub::new(Arc::clone(&store), avatars));

        Ok(Self {
            hub,
            store,
            config: Arc::new(config),
            data_dir,
            database_url,
        })
    }
}
