use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mentioned_media::config::Settings;
use mentioned_media::dao;
use mentioned_media::harvest::HarvestMode;
use mentioned_media::jobs::{spawn_worker, PostEvent};
use mentioned_media::types::{item_to_entry, Catalog, Post, Thread};
use mentioned_media::{aggregator, MentionedMedia};

/// Catalog the movies, shows, books, music and games linked from a thread
#[derive(Parser)]
#[command(name = "mentioned-media")]
#[command(about = "Builds per-thread catalogs of mentioned media", long_about = None)]
pub struct Cli {
    /// Database URL (defaults to a SQLite file in the data directory)
    #[arg(long, global = true)]
    pub database_url: Option<String>,
    /// Settings file (defaults to mentioned-media.toml in the config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract from local files without touching the database
    Scan {
        /// One post per file; .html/.htm is rendered, anything else is markdown
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        mode: Option<HarvestMode>,
    },
    /// Create or edit a post, then refresh its thread's catalog
    Post {
        #[arg(long)]
        thread: String,
        /// Existing post id to edit; a new id is generated otherwise
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        number: Option<i64>,
        #[arg(long)]
        raw: Option<PathBuf>,
        #[arg(long)]
        cooked: Option<PathBuf>,
    },
    /// Rescan a thread and store its catalog
    Extract { thread: String },
    /// Print the stored catalog for a thread
    Show { thread: String },
}

pub async fn run(cli: Cli) -> Result<()> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(url) = cli.database_url {
        settings.database_url = Some(url);
    }

    match cli.command {
        Commands::Scan { files, mode } => {
            if let Some(mode) = mode { settings.harvest = mode; }
            let thread = thread_from_files(&files).await?;
            let opts = settings.harvest_options();
            print_catalog(&aggregator::extract(&thread, &opts))
        }
        Commands::Post { thread, id, number, raw, cooked } => {
            if raw.is_none() && cooked.is_none() {
                bail!("a post needs --raw and/or --cooked content");
            }
            let media = Arc::new(MentionedMedia::connect(settings, true).await?);
            let db = media.database().context("no database configured")?.clone();

            let post_id = id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let existed = dao::find_thread_id_for_post(db.pool(), &post_id).await?.is_some();
            let post_number = match number {
                Some(n) => n,
                None => db.next_post_number(&thread).await?,
            };
            let post = Post {
                id: post_id.clone(),
                post_number,
                raw: read_optional(raw.as_deref()).await?,
                cooked: read_optional(cooked.as_deref()).await?,
            };
            db.save_post(&thread, &post).await?;

            let event = if existed { PostEvent::Edited { post_id: post_id.clone() } } else { PostEvent::Created { post_id: post_id.clone() } };
            let (queue, worker) = spawn_worker(media.clone());
            queue.notify(event);
            drop(queue);
            worker.await.context("extraction worker panicked")?;

            println!("{post_id}");
            Ok(())
        }
        Commands::Extract { thread } => {
            let media = MentionedMedia::connect(settings, true).await?;
            match media.extract_thread(&thread).await? {
                Some(catalog) => print_catalog(&catalog),
                None => bail!("thread not found: {thread}"),
            }
        }
        Commands::Show { thread } => {
            let media = MentionedMedia::connect(settings, true).await?;
            let entries = media.mentioned_media(&thread).await?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
            Ok(())
        }
    }
}

async fn thread_from_files(files: &[PathBuf]) -> Result<Thread> {
    let mut posts = Vec::with_capacity(files.len());
    for (i, path) in files.iter().enumerate() {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let is_html = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"));
        let (raw, cooked) = if is_html { (None, Some(text)) } else { (Some(text), None) };
        posts.push(Post { id: path.display().to_string(), post_number: i as i64 + 1, raw, cooked });
    }
    Ok(Thread { id: "scan".to_string(), posts })
}

async fn read_optional(path: Option<&Path>) -> Result<Option<String>> {
    match path {
        Some(p) => Ok(Some(tokio::fs::read_to_string(p).await.with_context(|| format!("reading {}", p.display()))?)),
        None => Ok(None),
    }
}

fn print_catalog(catalog: &Catalog) -> Result<()> {
    let entries: Vec<_> = catalog.iter().map(item_to_entry).collect();
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}
