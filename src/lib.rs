pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod dao;
pub mod db;
pub mod harvest;
pub mod jobs;
pub mod mapping;
pub mod preview;
pub mod storage;
pub mod title;
pub mod types;

// --- Library API for embedding ---

/// Convenience re-exports for embedders.
pub mod prelude {
    pub use crate::aggregator::extract;
    pub use crate::config::Settings;
    pub use crate::harvest::{HarvestMode, HarvestOptions};
    pub use crate::jobs::{spawn_worker, JobQueue, PostEvent};
    pub use crate::storage::{CatalogStore, MemoryStore, ThreadSource};
    pub use crate::types::{Catalog, MediaEntry, MediaItem, MediaKind, Post, Thread};
    pub use crate::{MentionedMedia, ThreadView};
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::config::Settings;
use crate::db::Database;
use crate::mapping::{catalog_to_payload, entries_from_payload};
use crate::storage::{CatalogStore, ThreadSource};
use crate::types::{Catalog, MediaEntry};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: String,
    pub post_number: i64,
}

/// Thread detail as served to readers, with the stored catalog attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadView {
    pub id: String,
    pub posts: Vec<PostSummary>,
    pub mentioned_media: Vec<MediaEntry>,
}

/// Async library entry point. Reads threads from a `ThreadSource` and writes
/// one catalog per thread to a `CatalogStore`.
pub struct MentionedMedia {
    source: Arc<dyn ThreadSource>,
    store: Arc<dyn CatalogStore>,
    settings: Settings,
    db: Option<Database>,
}

impl MentionedMedia {
    /// Open the configured database (or the default SQLite file) and optionally run migrations.
    pub async fn connect(settings: Settings, run_migrations: bool) -> Result<Self> {
        let db = Database::connect(settings.database_url.as_deref()).await?;
        if run_migrations { db.run_migrations().await?; }
        let shared = Arc::new(db.clone());
        Ok(Self { source: shared.clone(), store: shared, settings, db: Some(db) })
    }

    pub fn with_backends(source: Arc<dyn ThreadSource>, store: Arc<dyn CatalogStore>, settings: Settings) -> Self {
        Self { source, store, settings, db: None }
    }

    pub fn settings(&self) -> &Settings { &self.settings }

    /// The SQLite/Any database, when built with `connect`.
    pub fn database(&self) -> Option<&Database> { self.db.as_ref() }

    /// Rescan a whole thread and overwrite its stored catalog. `None` when the thread does not exist.
    pub async fn extract_thread(&self, thread_id: &str) -> Result<Option<Catalog>> {
        let Some(thread) = self.source.load_thread(thread_id).await? else {
            debug!(thread_id, "thread not found; skipping extraction");
            return Ok(None);
        };
        let opts = self.settings.harvest_options();
        let posts = thread.posts.len();
        let catalog = tokio::task::spawn_blocking(move || aggregator::extract(&thread, &opts))
            .await
            .context("extraction task failed")?;
        let payload = catalog_to_payload(&catalog)?;
        self.store
            .put_catalog(thread_id, &payload)
            .await
            .with_context(|| format!("storing mentioned media for thread {thread_id}"))?;
        debug!(thread_id, posts, items = catalog.len(), "catalog written");
        Ok(Some(catalog))
    }

    /// Job body for a created or edited post. Returns the number of stored
    /// items, or `None` when the post or its thread is gone.
    pub async fn extract_for_post(&self, post_id: &str) -> Result<Option<usize>> {
        let Some(thread_id) = self.source.thread_for_post(post_id).await? else {
            debug!(post_id, "post not found; skipping extraction");
            return Ok(None);
        };
        Ok(self.extract_thread(&thread_id).await?.map(|c| c.len()))
    }

    /// Stored catalog for a thread; empty when nothing has been extracted yet.
    pub async fn mentioned_media(&self, thread_id: &str) -> Result<Vec<MediaEntry>> {
        let payload = self.store.get_catalog(thread_id).await?;
        Ok(payload.map(|p| entries_from_payload(thread_id, &p)).unwrap_or_default())
    }

    pub async fn thread_view(&self, thread_id: &str) -> Result<Option<ThreadView>> {
        let Some(thread) = self.source.load_thread(thread_id).await? else { return Ok(None) };
        let mentioned_media = self.mentioned_media(thread_id).await?;
        let posts = thread.posts.into_iter().map(|p| PostSummary { id: p.id, post_number: p.post_number }).collect();
        Ok(Some(ThreadView { id: thread.id, posts, mentioned_media }))
    }
}
