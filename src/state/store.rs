use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{BotError, Result};

/// One JSON document per concern, mapping guild id to that guild's state.
///
/// The whole document lives in memory and is rewritten on every mutation.
/// Mutations go through a single lock so two handlers touching the same
/// document can't interleave between read and write.
pub struct GuildStore<T> {
    path: String,
    documents: Mutex<BTreeMap<String, T>>,
}

impl<T> GuildStore<T>
where
    T: Default + Clone + Serialize + DeserializeOwned + Send,
{
    /// Load a store from disk; a missing or empty file yields an empty store
    pub async fn open(path: &str) -> Result<Self> {
        let documents = load_document(path).await?;
        debug!("Opened store {} with {} guild(s)", path, documents.len());
        Ok(Self {
            path: path.to_string(),
            documents: Mutex::new(documents),
        })
    }

    /// Guild state, or the default when the guild has none yet
    pub async fn get(&self, guild_id: &str) -> T {
        let documents = self.documents.lock().await;
        documents.get(guild_id).cloned().unwrap_or_default()
    }

    /// Mutate a guild's state and persist the result.
    ///
    /// The closure sees the default state when the guild has no entry yet.
    /// If the document can't be saved the in-memory state is left untouched.
    pub async fn update<R>(&self, guild_id: &str, f: impl FnOnce(&mut T) -> R) -> Result<R> {
        let mut documents = self.documents.lock().await;
        let previous = documents.get(guild_id).cloned();
        let mut working = previous.clone().unwrap_or_default();
        let result = f(&mut working);

        documents.insert(guild_id.to_string(), working);
        if let Err(e) = save_document(&self.path, &documents).await {
            match previous {
                Some(previous) => documents.insert(guild_id.to_string(), previous),
                None => documents.remove(guild_id),
            };
            return Err(e);
        }
        Ok(result)
    }

    /// Drop a guild's state entirely
    pub async fn remove(&self, guild_id: &str) -> Result<Option<T>> {
        let mut documents = self.documents.lock().await;
        let Some(removed) = documents.remove(guild_id) else {
            return Ok(None);
        };
        if let Err(e) = save_document(&self.path, &documents).await {
            documents.insert(guild_id.to_string(), removed);
            return Err(e);
        }
        Ok(Some(removed))
    }

    /// Copy of every guild's state, for periodic sweeps
    pub async fn snapshot(&self) -> Vec<(String, T)> {
        let documents = self.documents.lock().await;
        documents
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Shared store type
pub type SharedStore<T> = Arc<GuildStore<T>>;

pub async fn open_shared_store<T>(path: &str) -> Result<SharedStore<T>>
where
    T: Default + Clone + Serialize + DeserializeOwned + Send,
{
    Ok(Arc::new(GuildStore::open(path).await?))
}

async fn load_document<T: DeserializeOwned>(path: &str) -> Result<BTreeMap<String, T>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
        Ok(content) => serde_json::from_str(&content).map_err(|e| BotError::StateParse {
            path: path.to_string(),
            source: e,
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(e) => Err(BotError::StateLoad {
            path: path.to_string(),
            source: e,
        }),
    }
}

/// Save to file atomically
async fn save_document<T: Serialize>(path: &str, documents: &BTreeMap<String, T>) -> Result<()> {
    let content = serde_json::to_string_pretty(documents)?;

    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| BotError::StateSave {
                    path: path.to_string(),
                    source: e,
                })?;
        }
    }

    let temp_path = format!("{}.tmp", path);
    tokio::fs::write(&temp_path, &content)
        .await
        .map_err(|e| BotError::StateSave {
            path: path.to_string(),
            source: e,
        })?;

    tokio::fs::rename(&temp_path, path)
        .await
        .map_err(|e| BotError::StateSave {
            path: path.to_string(),
            source: e,
        })?;

    Ok(())
}
