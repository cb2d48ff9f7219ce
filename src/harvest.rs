//! Candidate media links from one post.
//!
//! Links come from the rendered fragment (anchors and preview-block sources)
//! and from the authored text (markdown links and bare URLs). Every candidate
//! is classified as it is found; unclassifiable links are dropped before any
//! title work happens.

use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

use crate::classifier::classify_url;
use crate::preview::{block_source, visible_text};
use crate::types::{normalize_url, MediaKind, Post};

pub const DEFAULT_MAX_LINKS_PER_POST: usize = 500;

static ANCHOR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector"));
static IMG_ALT_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img[alt]").expect("img selector"));
static BLOCK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("aside.onebox, [data-onebox-src]").expect("preview block selector"));
// [text](url "title"), allowing one level of parentheses inside the url.
static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[([^\]\n]*)\]\(((?i:https?)://(?:[^\s()<>]|\([^\s()<>]*\))+)(?:\s+"[^"]*")?\)"#)
        .expect("markdown link pattern")
});
static BARE_URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(?i)https?://[^\s<>"]+"#).expect("bare url pattern"));

/// Which parts of a post are scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HarvestMode {
    Raw,
    Rendered,
    #[default]
    Both,
}

impl HarvestMode {
    fn raw(self) -> bool { matches!(self, Self::Raw | Self::Both) }
    fn rendered(self) -> bool { matches!(self, Self::Rendered | Self::Both) }
}

impl FromStr for HarvestMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "rendered" | "cooked" => Ok(Self::Rendered),
            "both" | "all" => Ok(Self::Both),
            other => Err(anyhow::anyhow!("unknown harvest mode `{}` (expected raw, rendered, both)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestOptions {
    pub mode: HarvestMode,
    pub max_links_per_post: usize,
}

impl Default for HarvestOptions {
    fn default() -> Self { Self { mode: HarvestMode::Both, max_links_per_post: DEFAULT_MAX_LINKS_PER_POST } }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestedLink {
    /// As authored, trimmed.
    pub url: String,
    /// Normalized form; identity across posts.
    pub key: String,
    pub kind: MediaKind,
    pub link_text: Option<String>,
}

pub fn harvest(post: &Post, opts: &HarvestOptions) -> Vec<HarvestedLink> {
    let mut acc = Accumulator::new(opts.max_links_per_post);

    if opts.mode.rendered() {
        if let Some(cooked) = post.cooked.as_deref().filter(|c| !c.trim().is_empty()) {
            let doc = Html::parse_fragment(cooked);
            for anchor in doc.select(&ANCHOR_SEL) {
                let Some(href) = anchor.value().attr("href") else { continue };
                let mut text = visible_text(&anchor);
                if text.is_empty() {
                    text = anchor
                        .select(&IMG_ALT_SEL)
                        .filter_map(|img| img.value().attr("alt"))
                        .map(|alt| alt.trim().to_string())
                        .find(|alt| !alt.is_empty())
                        .unwrap_or_default();
                }
                acc.push(href, Some(text));
            }
            for block in doc.select(&BLOCK_SEL) {
                if let Some(src) = block_source(&block) {
                    acc.push(&src, None);
                }
            }
        }
    }

    if opts.mode.raw() {
        if let Some(raw) = post.raw.as_deref() {
            for caps in MARKDOWN_LINK.captures_iter(raw) {
                acc.push(&caps[2], Some(caps[1].trim().to_string()));
            }
            // Bare URLs only outside markdown links.
            let rest = MARKDOWN_LINK.replace_all(raw, " ");
            for m in BARE_URL.find_iter(&rest) {
                acc.push(trim_url_token(m.as_str()), None);
            }
        }
    }

    if acc.truncated {
        debug!(post_id = %post.id, limit = opts.max_links_per_post, "link limit reached; remaining links ignored");
    }
    acc.links
}

struct Accumulator {
    links: Vec<HarvestedLink>,
    seen: HashMap<String, usize>,
    limit: usize,
    truncated: bool,
}

impl Accumulator {
    fn new(limit: usize) -> Self { Self { links: Vec::new(), seen: HashMap::new(), limit, truncated: false } }

    fn push(&mut self, raw: &str, text: Option<String>) {
        let raw = raw.trim();
        let Ok(url) = Url::parse(raw) else { return };
        let Some(class) = classify_url(&url) else { return };
        let Some(key) = normalize_url(&url) else { return };
        let text = text.filter(|t| !t.is_empty());

        if let Some(&idx) = self.seen.get(&key) {
            let existing = &mut self.links[idx];
            if existing.link_text.is_none() {
                existing.link_text = text;
            }
            return;
        }
        if self.links.len() >= self.limit {
            self.truncated = true;
            return;
        }
        self.seen.insert(key.clone(), self.links.len());
        self.links.push(HarvestedLink { url: raw.to_string(), key, kind: class.kind, link_text: text });
    }
}

/// Cut at markdown link syntax, then drop trailing sentence punctuation and
/// unbalanced closing brackets.
fn trim_url_token(token: &str) -> &str {
    let mut s = token.split("](").next().unwrap_or(token);
    loop {
        let Some(last) = s.chars().last() else { return s };
        let unbalanced = |open: char, close: char| s.matches(close).count() > s.matches(open).count();
        let drop = match last {
            '.' | ',' | ';' | ':' | '!' | '?' | '\'' | '*' | '`' | '…' => true,
            ')' => unbalanced('(', ')'),
            ']' => unbalanced('[', ']'),
            '}' => unbalanced('{', '}'),
            _ => false,
        };
        if !drop {
            return s;
        }
        s = &s[..s.len() - last.len_utf8()];
    }
}
