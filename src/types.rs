use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Icon used for a stored type string that is not a known [`MediaKind`].
pub const FALLBACK_ICON: &str = "link";
/// Label used for a stored type string that is not a known [`MediaKind`].
pub const FALLBACK_LABEL: &str = "Media";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Tv,
    Book,
    Music,
    Game,
}

impl MediaKind {
    pub const ALL: [MediaKind; 5] = [Self::Movie, Self::Tv, Self::Book, Self::Music, Self::Game];

    /// Canonical string form; also the primary sort key of a catalog.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
            Self::Book => "book",
            Self::Music => "music",
            Self::Game => "game",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
            Self::Book => "book",
            Self::Music => "music",
            Self::Game => "game",
        }
    }

    /// Title used when nothing readable can be recovered from a link.
    pub fn label(self) -> &'static str {
        match self {
            Self::Movie => "Movie",
            Self::Tv => "TV Show",
            Self::Book => "Book",
            Self::Music => "Music",
            Self::Game => "Video Game",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Icon for a raw type string, defaulting to [`FALLBACK_ICON`].
pub fn icon_for_type(kind: &str) -> &'static str {
    MediaKind::parse(kind).map(MediaKind::icon).unwrap_or(FALLBACK_ICON)
}

/// One mentioned piece of media. Field order matches the stored JSON shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub url: String,
    pub title: String,
    pub icon: String,
}

impl MediaItem {
    pub fn new(kind: MediaKind, url: impl Into<String>, title: impl Into<String>) -> Self {
        Self { kind, url: url.into(), title: title.into(), icon: kind.icon().to_string() }
    }

    /// Identity used for deduplication.
    pub fn key(&self) -> Option<String> { normalize_str(&self.url) }
}

/// Sorted, deduplicated list of media mentioned in one thread.
pub type Catalog = Vec<MediaItem>;

/// Stored/exposed form of a catalog entry. Tolerates type strings and missing
/// icons that a [`MediaItem`] could not represent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub icon: String,
}

pub fn item_to_entry(item: &MediaItem) -> MediaEntry {
    MediaEntry { kind: item.kind.as_str().to_string(), url: item.url.clone(), title: item.title.clone(), icon: item.icon.clone() }
}

pub fn entry_with_icon(mut entry: MediaEntry) -> MediaEntry {
    if entry.icon.trim().is_empty() { entry.icon = icon_for_type(&entry.kind).to_string(); }
    entry
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub post_number: i64,
    /// Authored source text (markdown).
    pub raw: Option<String>,
    /// Rendered HTML fragment.
    pub cooked: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    /// Chronological order.
    pub posts: Vec<Post>,
}

/// Dedup key: `scheme://host[:port]/path`, query/fragment and trailing slash
/// removed, host and path lower-cased.
pub fn normalize_url(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    let path = url.path().trim_end_matches('/').to_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}{}", url.scheme(), host, port, path),
        None => format!("{}://{}{}", url.scheme(), host, path),
    })
}

pub fn normalize_str(raw: &str) -> Option<String> {
    Url::parse(raw.trim()).ok().as_ref().and_then(normalize_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_query_fragment_and_trailing_slash() {
        assert_eq!(
            normalize_str("https://WWW.IMDb.com/title/tt0111161/?ref_=nv#top").as_deref(),
            Some("https://www.imdb.com/title/tt0111161")
        );
        assert_eq!(
            normalize_str("https://en.wikipedia.org/wiki/Dune_(2021_film)").as_deref(),
            Some("https://en.wikipedia.org/wiki/dune_(2021_film)")
        );
    }

    #[test]
    fn normalize_keeps_explicit_port() {
        assert_eq!(normalize_str("http://example.com:8080/a/").as_deref(), Some("http://example.com:8080/a"));
    }

    #[test]
    fn normalize_rejects_garbage() {
        assert_eq!(normalize_str("not a url"), None);
        assert_eq!(normalize_str("mailto:someone@example.com"), None);
    }

    #[test]
    fn item_serializes_in_wire_shape() {
        let item = MediaItem::new(MediaKind::Tv, "https://www.themoviedb.org/tv/1396-breaking-bad", "Breaking Bad");
        let json = serde_json::to_string(&item).unwrap();
        assert_eq!(
            json,
            r#"{"type":"tv","url":"https://www.themoviedb.org/tv/1396-breaking-bad","title":"Breaking Bad","icon":"tv"}"#
        );
    }

    #[test]
    fn unknown_types_get_link_icon() {
        let entry: MediaEntry = serde_json::from_str(r#"{"type":"podcast","url":"u","title":"t"}"#).unwrap();
        assert_eq!(entry_with_icon(entry).icon, "link");
        assert_eq!(icon_for_type("GAME"), "game");
    }
}
