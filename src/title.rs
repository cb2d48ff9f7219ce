//! Display titles for classified links.
//!
//! Candidates are tried in a fixed order (site slug, preview caption, link
//! text, last path segment) and the first one that survives [`sanitize`] wins.
//! When nothing survives the kind's generic label is used, so the result is
//! never empty.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::classifier::{classify_url, decode_segment, has_suffix_token, Site, WIKI_SUFFIXES};
use crate::types::MediaKind;

static IMDB_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^tt\d+$").expect("imdb id pattern"));
static STORE_CODES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Apple/App Store style numeric ids.
        r"(?i)^id\d+$",
        // PlayStation content ids: UP0006-CUSA00000_00-...
        r"(?i)^[a-z]{2}\d{4}-[a-z]{4}\d{5}",
        // PlayStation product codes: CUSA12345, PPSA01234.
        r"(?i)^(cusa|ppsa|npub|npeb)\d{5}$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("store code pattern"))
    .collect()
});
static ID_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+[-.]").expect("id prefix pattern"));

/// Titles cut at the first of these (case-insensitive).
const SEPARATORS: &[&str] = &[" by ", " on ", " for ", " - "];
const GLYPHS: &[char] = &['™', '®', '©', '℠'];
const EDGE_PUNCTUATION: &[char] = &['-', '–', '—', ':', ';', ',', '·', '•', '"', '“', '”', '«', '»', '/', '\\'];
const OPAQUE_TOKEN_LEN: usize = 15;
const NINTENDO_PLATFORMS: &[&str] = &["-switch-2", "-switch", "-wii-u", "-3ds"];

/// How a site encodes a readable title in its URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlugStyle {
    /// `/wiki/Dune_(2021_film)`
    Wikipedia,
    /// `/movie/603-the-matrix`, `/book/show/44767458-dune`, `/book/show/234225.Dune`
    IdPrefixed,
    /// `/film/parasite-2019/`, `/app/570/Dota_2/`
    Plain,
    /// `/us/store/products/super-mario-odyssey-switch/`
    Nintendo,
}

impl SlugStyle {
    pub fn for_site(site: Site) -> Option<Self> {
        match site {
            Site::Wikipedia => Some(Self::Wikipedia),
            Site::Tmdb | Site::Goodreads => Some(Self::IdPrefixed),
            Site::Letterboxd | Site::Igdb | Site::Epic | Site::Steam | Site::Gog => Some(Self::Plain),
            Site::Nintendo => Some(Self::Nintendo),
            Site::Imdb | Site::Spotify | Site::AppleMusic | Site::PlayStation | Site::Xbox => None,
        }
    }

    /// Raw title text recovered from the URL path, separators not yet replaced.
    pub fn extract(self, url: &Url) -> Option<String> {
        let segments = path_segments(url);
        match self {
            Self::Wikipedia => segments.last().map(|s| strip_disambiguation(s)),
            Self::IdPrefixed => {
                let seg = segments.iter().rev().find(|s| ID_PREFIX.is_match(s)).or(segments.last())?;
                Some(ID_PREFIX.replace(seg, "").into_owned())
            }
            Self::Plain => segments.last().map(|s| ID_PREFIX.replace(s, "").into_owned()),
            Self::Nintendo => {
                let seg = segments.last()?;
                let lower = seg.to_ascii_lowercase();
                let cut = NINTENDO_PLATFORMS
                    .iter()
                    .find(|p| lower.ends_with(*p) && lower.len() > p.len())
                    .map(|p| seg.len() - p.len())
                    .unwrap_or(seg.len());
                Some(seg[..cut].to_string())
            }
        }
    }
}

/// Resolve the display title for a classified link.
pub fn resolve(url: &str, kind: MediaKind, caption: Option<&str>, link_text: Option<&str>) -> String {
    let parsed = Url::parse(url.trim()).ok();

    let slug = parsed.as_ref().and_then(|u| {
        let style = classify_url(u).and_then(|c| SlugStyle::for_site(c.site))?;
        style.extract(u).map(|s| unslug(&s))
    });
    let caption = caption.filter(|c| !echoes_url(c, url)).map(str::to_string);
    let link_text = link_text.filter(|t| !echoes_url(t, url)).map(str::to_string);
    let generic = parsed.as_ref().and_then(|u| path_segments(u).pop()).map(|s| unslug(&s));

    [slug, caption, link_text, generic]
        .into_iter()
        .flatten()
        .find_map(|candidate| sanitize(&candidate))
        .unwrap_or_else(|| kind.label().to_string())
}

/// Clean a candidate title; `None` when nothing presentable remains.
pub fn sanitize(raw: &str) -> Option<String> {
    let mut s = raw.trim().to_string();
    if let Some(i) = s.find('|') {
        s.truncate(i);
    }
    truncate_at_separator(&mut s);
    let s: String = strip_brackets(&s)
        .chars()
        .filter(|c| !GLYPHS.contains(c))
        .map(|c| if c == '_' { ' ' } else { c })
        .collect();
    let s = collapse_whitespace(&s);
    let s = s.trim_matches(|c: char| c.is_whitespace() || EDGE_PUNCTUATION.contains(&c));
    let title = title_case(s);
    if is_rejected(&title) { None } else { Some(title) }
}

/// True when the sanitized text carries no readable title.
pub fn is_rejected(title: &str) -> bool {
    let t = title.trim();
    if t.is_empty() {
        return true;
    }
    if t.chars().all(|c| c.is_ascii_digit() || c.is_whitespace()) {
        return true;
    }
    if IMDB_ID.is_match(t) || STORE_CODES.iter().any(|re| re.is_match(t)) || is_store_id(t) {
        return true;
    }
    !t.contains(char::is_whitespace) && t.chars().all(char::is_alphanumeric) && t.chars().count() >= OPAQUE_TOKEN_LEN
}

/// Microsoft Store style product id: 12 upper-case alphanumerics with a digit.
fn is_store_id(t: &str) -> bool {
    t.len() == 12
        && t.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        && t.chars().any(|c| c.is_ascii_digit())
}

fn path_segments(url: &Url) -> Vec<String> {
    url.path_segments()
        .map(|segs| segs.filter(|s| !s.is_empty()).map(decode_segment).collect())
        .unwrap_or_default()
}

fn unslug(s: &str) -> String { s.replace(['-', '_'], " ") }

fn strip_disambiguation(segment: &str) -> String {
    let trimmed = segment.trim_end();
    if trimmed.ends_with(')') {
        if let Some(open) = trimmed.rfind('(') {
            return trimmed[..open].trim_end_matches(['_', ' ']).to_string();
        }
    }
    let lower = trimmed.to_lowercase();
    for (suffix, _) in WIKI_SUFFIXES {
        if has_suffix_token(&lower, suffix) && trimmed.len() == lower.len() {
            return trimmed[..trimmed.len() - suffix.len() - 1].to_string();
        }
    }
    trimmed.to_string()
}

/// Text that is just the link itself (possibly without scheme or truncated
/// with an ellipsis, as forums display long links).
fn echoes_url(text: &str, url: &str) -> bool {
    let t = text.trim();
    if t.is_empty() {
        return true;
    }
    let lower = t.to_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("www.") {
        return true;
    }
    let bare = |s: &str| {
        let s = s.trim().to_lowercase();
        let s = s.split_once("://").map(|(_, rest)| rest.to_string()).unwrap_or(s);
        let s = s.strip_prefix("www.").unwrap_or(&s);
        s.trim_end_matches('/').to_string()
    };
    let text_bare = bare(t);
    let url_bare = bare(url);
    if text_bare == url_bare {
        return true;
    }
    match text_bare.strip_suffix('…').or_else(|| text_bare.strip_suffix("...")) {
        Some(prefix) if !prefix.is_empty() => url_bare.starts_with(prefix),
        _ => false,
    }
}

fn truncate_at_separator(s: &mut String) {
    let lower = s.to_ascii_lowercase();
    let cut = SEPARATORS
        .iter()
        .filter_map(|sep| lower.find(sep))
        .filter(|&i| !s[..i].trim().is_empty())
        .min();
    if let Some(i) = cut {
        s.truncate(i);
    }
}

/// Drop `(...)`, `[...]` and `{...}` groups, including an unclosed trailing one.
fn strip_brackets(s: &str) -> String {
    let mut depth = 0usize;
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

fn collapse_whitespace(s: &str) -> String { s.split_whitespace().collect::<Vec<_>>().join(" ") }

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
