use mongodb::{bson::doc, Client};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::memory::MemoryStore;
use crate::database::mongo::MongoStore;
use crate::database::store::Store;
use crate::errors::{AppError, Result};

pub const MEMORY_URL: &str = "memory://";

/// Open the store named by `DATABASE_URL`.
pub async fn connect(config: &AppConfig) -> Result<Arc<dyn Store>> {
    if config.database_url == MEMORY_URL {
        tracing::warn!("using in-memory store; data is lost on restart");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let client = Client::with_uri_str(&config.database_url)
        .await
        .map_err(|e| AppError::Configuration(format!("invalid DATABASE_URL: {}", e)))?;

    let db = client.database(&config.database_name);

    match db.run_command(doc! { "ping": 1 }).await {
        Ok(_) => tracing::info!("connected to database: {}", config.database_name),
        Err(e) => {
            tracing::error!("database '{}' is unreachable: {}", config.database_name, e);
            return Err(AppError::Database(e.to_string()));
        }
    }

    let store = MongoStore::new(db);
    store.ensure_indexes().await?;

    Ok(Arc::new(store))
}
