use anyhow::{Context, Result};
use directories::ProjectDirs;
use sqlx::{any::AnyConnectOptions, AnyPool, ConnectOptions, migrate::Migrator};
use sqlx::any::AnyPoolOptions;
use std::{path::PathBuf, str::FromStr};
use std::sync::Once;

use crate::dao;
use crate::mapping::{post_insert_from, thread_from_rows};
use crate::storage::{CatalogStore, ThreadSource};
use crate::types::{Post, Thread};

// Ensure drivers are installed exactly once for sqlx::any
static INSTALL_DRIVERS: Once = Once::new();

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Clone)]
pub struct Database {
    pool: AnyPool,
}

impl Database {
    // Create a connection pool. If database_url is None, use a SQLite file in
    // the user's data directory.
    pub async fn connect(database_url: Option<&str>) -> Result<Self> {
        INSTALL_DRIVERS.call_once(sqlx::any::install_default_drivers);

        let url = match database_url {
            Some(u) if !u.trim().is_empty() => u.to_string(),
            _ => default_sqlite_url()?,
        };

        let opts = AnyConnectOptions::from_str(&url)
            .with_context(|| format!("invalid database URL: {url}"))?;
        // Quiet by default; callers can enable SQLX_LOG if they want
        let opts = opts.disable_statement_logging();

        let pool = AnyPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .with_context(|| format!("failed to connect to database: {url}"))?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await.context("running migrations")
    }

    pub fn pool(&self) -> &AnyPool { &self.pool }

    /// Create the thread row if needed, then insert or update the post.
    pub async fn save_post(&self, thread_id: &str, post: &Post) -> Result<()> {
        dao::upsert_thread(&self.pool, &dao::ThreadInsert { id: thread_id.to_string() }).await?;
        dao::upsert_post(&self.pool, &post_insert_from(thread_id, post))
            .await
            .with_context(|| format!("saving post {} in thread {}", post.id, thread_id))
    }

    pub async fn delete_post(&self, post_id: &str) -> Result<u64> { dao::delete_post(&self.pool, post_id).await }

    pub async fn next_post_number(&self, thread_id: &str) -> Result<i64> { dao::next_post_number(&self.pool, thread_id).await }
}

#[async_trait::async_trait]
impl ThreadSource for Database {
    async fn thread_for_post(&self, post_id: &str) -> Result<Option<String>> {
        dao::find_thread_id_for_post(&self.pool, post_id).await
    }

    async fn load_thread(&self, thread_id: &str) -> Result<Option<Thread>> {
        if !dao::thread_exists(&self.pool, thread_id).await? {
            return Ok(None);
        }
        let rows = dao::list_posts_for_thread(&self.pool, thread_id).await?;
        Ok(Some(thread_from_rows(thread_id, rows)))
    }
}

#[async_trait::async_trait]
impl CatalogStore for Database {
    async fn get_catalog(&self, thread_id: &str) -> Result<Option<String>> {
        dao::get_thread_media(&self.pool, thread_id).await
    }

    async fn put_catalog(&self, thread_id: &str, payload: &str) -> Result<()> {
        dao::put_thread_media(&self.pool, thread_id, payload).await
    }
}

fn default_sqlite_url() -> Result<String> {
    let proj = ProjectDirs::from("dev", "mentioned-media", "mentioned-media")
        .context("unable to determine data directory for default sqlite path")?;
    let mut path: PathBuf = proj.data_dir().to_path_buf();
    std::fs::create_dir_all(&path).with_context(|| format!("creating data dir: {}", path.display()))?;
    path.push("mentioned-media.db");
    Ok(sqlite_url_for(&path))
}

/// `sqlite://` URL that creates the file on first use.
pub fn sqlite_url_for(path: &std::path::Path) -> String {
    // Encode spaces in the path for a valid sqlite URL
    let path_str = path.to_string_lossy().replace(' ', "%20");
    format!("sqlite://{path_str}?mode=rwc")
}
