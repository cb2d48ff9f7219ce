use std::collections::HashSet;
use tracing::{debug, trace};

use crate::harvest::{harvest, HarvestOptions};
use crate::preview::build_index;
use crate::title::resolve;
use crate::types::{Catalog, MediaItem, Post, Thread};

/// Accumulates media items across the posts of one thread. The first item seen
/// for a normalized URL is kept; later duplicates are ignored.
pub struct Aggregator {
    opts: HarvestOptions,
    items: Vec<(String, MediaItem)>,
    seen: HashSet<String>,
}

impl Aggregator {
    pub fn new(opts: HarvestOptions) -> Self { Self { opts, items: Vec::new(), seen: HashSet::new() } }

    /// Scan one post; returns how many new items it contributed.
    pub fn add_post(&mut self, post: &Post) -> usize {
        let links = harvest(post, &self.opts);
        if links.is_empty() {
            return 0;
        }
        let index = post.cooked.as_deref().map(build_index).unwrap_or_default();
        let mut added = 0;
        for link in links {
            if self.seen.contains(&link.key) {
                trace!(post_id = %post.id, url = %link.url, "already cataloged");
                continue;
            }
            let title = resolve(&link.url, link.kind, index.get(&link.key), link.link_text.as_deref());
            self.seen.insert(link.key.clone());
            self.items.push((link.key, MediaItem::new(link.kind, link.url, title)));
            added += 1;
        }
        debug!(post_id = %post.id, added, "scanned post");
        added
    }

    pub fn len(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Sorted by `(kind, lower-cased title)`, normalized URL breaking ties.
    pub fn finish(mut self) -> Catalog {
        self.items.sort_by(|(ka, a), (kb, b)| {
            (a.kind.as_str(), a.title.to_lowercase(), ka).cmp(&(b.kind.as_str(), b.title.to_lowercase(), kb))
        });
        self.items.into_iter().map(|(_, item)| item).collect()
    }
}

/// Full catalog for a thread, posts taken in the order given.
pub fn extract(thread: &Thread, opts: &HarvestOptions) -> Catalog {
    let mut agg = Aggregator::new(*opts);
    for post in &thread.posts {
        agg.add_post(post);
    }
    let catalog = agg.finish();
    debug!(thread_id = %thread.id, posts = thread.posts.len(), items = catalog.len(), "extracted mentioned media");
    catalog
}
