use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::MentionedMedia;

/// Post lifecycle events that can change a thread's catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostEvent {
    Created { post_id: String },
    Edited { post_id: String },
}

impl PostEvent {
    pub fn post_id(&self) -> &str {
        match self {
            PostEvent::Created { post_id } | PostEvent::Edited { post_id } => post_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractJob {
    pub post_id: String,
}

/// Cloneable handle for enqueueing extraction jobs. The worker stops once
/// every handle is dropped.
#[derive(Debug, Clone)]
pub struct JobQueue {
    tx: mpsc::UnboundedSender<ExtractJob>,
    enabled: bool,
}

impl JobQueue {
    /// Enqueue a job for the event's post. Returns false when the feature is
    /// disabled or the worker has gone away.
    pub fn notify(&self, event: PostEvent) -> bool {
        if !self.enabled {
            debug!(post_id = event.post_id(), "mentioned media disabled; ignoring event");
            return false;
        }
        let job = ExtractJob { post_id: event.post_id().to_string() };
        match self.tx.send(job) {
            Ok(()) => true,
            Err(e) => {
                warn!(post_id = %e.0.post_id, "extraction worker has stopped; dropping job");
                false
            }
        }
    }
}

/// Start the background worker. Jobs run one at a time in arrival order.
pub fn spawn_worker(media: Arc<MentionedMedia>) -> (JobQueue, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<ExtractJob>();
    let enabled = media.settings().enabled;
    let handle = tokio::spawn(async move {
        while let Some(job) = rx.recv().await {
            let run = uuid::Uuid::new_v4();
            match media.extract_for_post(&job.post_id).await {
                Ok(Some(count)) => info!(%run, post_id = %job.post_id, count, "stored mentioned media"),
                Ok(None) => debug!(%run, post_id = %job.post_id, "post or thread gone; nothing stored"),
                Err(e) => warn!(%run, post_id = %job.post_id, error = ?e, "mentioned media extraction failed"),
            }
        }
        debug!("extraction queue closed");
    });
    (JobQueue { tx, enabled }, handle)
}
