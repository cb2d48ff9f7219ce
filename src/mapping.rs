use anyhow::Result;
use tracing::warn;

use crate::dao::{PostInsert, PostRow};
use crate::types::{entry_with_icon, item_to_entry, Catalog, MediaEntry, Post, Thread};

pub fn post_from_row(row: PostRow) -> Post {
    let (id, post_number, raw, cooked) = row;
    let present = |s: String| Some(s).filter(|s| !s.is_empty());
    Post { id, post_number, raw: present(raw), cooked: present(cooked) }
}

pub fn thread_from_rows(thread_id: &str, rows: Vec<PostRow>) -> Thread {
    Thread { id: thread_id.to_string(), posts: rows.into_iter().map(post_from_row).collect() }
}

pub fn post_insert_from(thread_id: &str, post: &Post) -> PostInsert {
    PostInsert {
        id: post.id.clone(),
        thread_id: thread_id.to_string(),
        post_number: post.post_number,
        raw: post.raw.clone().unwrap_or_default(),
        cooked: post.cooked.clone().unwrap_or_default(),
    }
}

/// Stored JSON shape: `[{"type","url","title","icon"}]`.
pub fn catalog_to_payload(catalog: &Catalog) -> Result<String> {
    Ok(serde_json::to_string(&catalog.iter().map(item_to_entry).collect::<Vec<_>>())?)
}

/// Parse a stored payload; unreadable payloads read as empty.
pub fn entries_from_payload(thread_id: &str, payload: &str) -> Vec<MediaEntry> {
    match serde_json::from_str::<Vec<MediaEntry>>(payload) {
        Ok(entries) => entries.into_iter().map(entry_with_icon).collect(),
        Err(e) => {
            warn!(thread_id, error = %e, "stored mentioned media is not valid JSON; ignoring");
            Vec::new()
        }
    }
}
