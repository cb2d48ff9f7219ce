//! Captions from embedded link previews ("oneboxes") in rendered posts.

use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::types::normalize_str;

static BLOCK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("aside.onebox, [data-onebox-src]").expect("preview block selector"));
static SOURCE_LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("header.source a[href]").expect("source link selector"));
static HEADING_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1, h2, h3, h4").expect("heading selector"));
static OG_TITLE_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("meta[property='og:title'], meta[name='og:title']").expect("og:title selector")
});
static TWITTER_TITLE_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("meta[name='twitter:title'], meta[property='twitter:title']").expect("twitter:title selector")
});
static STYLED_ANCHOR_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.onebox[href], a.inline-onebox[href]").expect("preview anchor selector"));

/// Normalized URL → best caption, scoped to one post.
#[derive(Debug, Clone, Default)]
pub struct PreviewIndex {
    captions: HashMap<String, String>,
}

impl PreviewIndex {
    pub fn get(&self, normalized_url: &str) -> Option<&str> { self.captions.get(normalized_url).map(String::as_str) }
    pub fn len(&self) -> usize { self.captions.len() }
    pub fn is_empty(&self) -> bool { self.captions.is_empty() }

    fn insert(&mut self, url: &str, caption: String) {
        if let Some(key) = normalize_str(url) {
            self.captions.insert(key, caption);
        }
    }
}

pub fn build_index(cooked: &str) -> PreviewIndex {
    let mut index = PreviewIndex::default();
    if cooked.trim().is_empty() {
        return index;
    }
    let doc = Html::parse_fragment(cooked);

    for block in doc.select(&BLOCK_SEL) {
        let Some(src) = block_source(&block) else { continue };
        if let Some(caption) = block_caption(&block) {
            index.insert(&src, caption);
        }
    }

    for anchor in doc.select(&STYLED_ANCHOR_SEL) {
        if inside_preview_block(&anchor) {
            continue;
        }
        let Some(href) = anchor.value().attr("href").map(str::trim) else { continue };
        let text = visible_text(&anchor);
        if text.is_empty() || text == href {
            continue;
        }
        index.insert(href, text);
    }
    index
}

/// Declared source URL of a preview block.
pub(crate) fn block_source(block: &ElementRef) -> Option<String> {
    block
        .value()
        .attr("data-onebox-src")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| {
            block
                .select(&SOURCE_LINK_SEL)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(|s| s.trim().to_string())
        })
}

fn block_caption(block: &ElementRef) -> Option<String> {
    let heading = block.select(&HEADING_SEL).map(|h| visible_text(&h)).find(|t| !t.is_empty());
    heading
        .or_else(|| meta_content(block, &OG_TITLE_SEL))
        .or_else(|| meta_content(block, &TWITTER_TITLE_SEL))
}

fn meta_content(block: &ElementRef, sel: &Selector) -> Option<String> {
    block
        .select(sel)
        .filter_map(|m| m.value().attr("content"))
        .map(collapse)
        .find(|t| !t.is_empty())
}

fn inside_preview_block(element: &ElementRef) -> bool {
    element.ancestors().filter_map(ElementRef::wrap).any(|el| {
        let v = el.value();
        v.attr("data-onebox-src").is_some() || (v.name() == "aside" && v.classes().any(|c| c.eq_ignore_ascii_case("onebox")))
    })
}

pub(crate) fn visible_text(element: &ElementRef) -> String { collapse(&element.text().collect::<String>()) }

fn collapse(s: &str) -> String { s.split_whitespace().collect::<Vec<_>>().join(" ") }
