use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::types::{Post, Thread};

/// Read side: where thread content comes from.
#[async_trait]
pub trait ThreadSource: Send + Sync {
    /// Thread owning a post, `None` when the post no longer exists.
    async fn thread_for_post(&self, post_id: &str) -> Result<Option<String>>;
    /// Thread with its posts in chronological order.
    async fn load_thread(&self, thread_id: &str) -> Result<Option<Thread>>;
}

/// Write side: one JSON catalog payload per thread.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_catalog(&self, thread_id: &str) -> Result<Option<String>>;
    /// Replaces whatever was stored for the thread.
    async fn put_catalog(&self, thread_id: &str, payload: &str) -> Result<()>;
}

/// In-process backend for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    threads: Mutex<HashMap<String, Vec<Post>>>,
    catalogs: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Insert or replace a post (matched by id) in a thread.
    pub fn upsert_post(&self, thread_id: &str, post: Post) {
        let mut threads = self.threads.lock().unwrap_or_else(|e| e.into_inner());
        let posts = threads.entry(thread_id.to_string()).or_default();
        match posts.iter_mut().find(|p| p.id == post.id) {
            Some(existing) => *existing = post,
            None => posts.push(post),
        }
    }

    pub fn remove_post(&self, post_id: &str) -> bool {
        let mut threads = self.threads.lock().unwrap_or_else(|e| e.into_inner());
        threads.values_mut().any(|posts| {
            let before = posts.len();
            posts.retain(|p| p.id != post_id);
            posts.len() != before
        })
    }
}

#[async_trait]
impl ThreadSource for MemoryStore {
    async fn thread_for_post(&self, post_id: &str) -> Result<Option<String>> {
        let threads = self.threads.lock().unwrap_or_else(|e| e.into_inner());
        Ok(threads.iter().find(|(_, posts)| posts.iter().any(|p| p.id == post_id)).map(|(id, _)| id.clone()))
    }

    async fn load_thread(&self, thread_id: &str) -> Result<Option<Thread>> {
        let threads = self.threads.lock().unwrap_or_else(|e| e.into_inner());
        Ok(threads.get(thread_id).map(|posts| {
            let mut posts = posts.clone();
            posts.sort_by(|a, b| a.post_number.cmp(&b.post_number).then_with(|| a.id.cmp(&b.id)));
            Thread { id: thread_id.to_string(), posts }
        }))
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn get_catalog(&self, thread_id: &str) -> Result<Option<String>> {
        Ok(self.catalogs.lock().unwrap_or_else(|e| e.into_inner()).get(thread_id).cloned())
    }

    async fn put_catalog(&self, thread_id: &str, payload: &str) -> Result<()> {
        self.catalogs.lock().unwrap_or_else(|e| e.into_inner()).insert(thread_id.to_string(), payload.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: &str, n: i64) -> Post { Post { id: id.into(), post_number: n, raw: Some(id.into()), cooked: None } }

    #[tokio::test]
    async fn memory_store_orders_posts_and_finds_threads() {
        let store = MemoryStore::new();
        store.upsert_post("t1", post("b", 2));
        store.upsert_post("t1", post("a", 1));
        store.upsert_post("t2", post("c", 1));

        let thread = store.load_thread("t1").await.unwrap().unwrap();
        let ids: Vec<_> = thread.posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(store.thread_for_post("c").await.unwrap().as_deref(), Some("t2"));
        assert_eq!(store.thread_for_post("zz").await.unwrap(), None);
        assert!(store.load_thread("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn memory_store_edits_and_removes() {
        let store = MemoryStore::new();
        store.upsert_post("t1", post("a", 1));
        store.upsert_post("t1", Post { raw: Some("edited".into()), ..post("a", 1) });
        let thread = store.load_thread("t1").await.unwrap().unwrap();
        assert_eq!(thread.posts.len(), 1);
        assert_eq!(thread.posts[0].raw.as_deref(), Some("edited"));
        assert!(store.remove_post("a"));
        assert!(!store.remove_post("a"));
    }

    #[tokio::test]
    async fn catalog_put_overwrites() {
        let store = MemoryStore::new();
        assert_eq!(store.get_catalog("t1").await.unwrap(), None);
        store.put_catalog("t1", "[1]").await.unwrap();
        store.put_catalog("t1", "[2]").await.unwrap();
        assert_eq!(store.get_catalog("t1").await.unwrap().as_deref(), Some("[2]"));
    }
}
