//! Maps a link to a media kind by destination host and path shape.
//!
//! The rules are data: an ordered table of `(site, domains, gate)` rows. The
//! first row whose domain matches the host decides; if its path gate rejects
//! the path the link is unclassified (no other row is tried).

use url::Url;

use crate::types::MediaKind;

/// Known cataloging sites. Also selects the slug strategy in [`crate::title`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Site {
    Imdb,
    Tmdb,
    Letterboxd,
    Goodreads,
    Spotify,
    AppleMusic,
    Igdb,
    Steam,
    PlayStation,
    Xbox,
    Nintendo,
    Epic,
    Gog,
    Wikipedia,
}

#[derive(Debug, Clone, Copy)]
enum PathGate {
    /// Single-purpose host: every path is this kind.
    Any(MediaKind),
    /// First listed substring contained in the lower-cased path wins.
    Contains(&'static [(&'static str, MediaKind)]),
    /// `/wiki/<slug>` with a disambiguation suffix.
    WikiSuffix,
}

struct SiteRule {
    site: Site,
    domains: &'static [&'static str],
    gate: PathGate,
}

const RULES: &[SiteRule] = &[
    SiteRule { site: Site::Imdb, domains: &["imdb.com"], gate: PathGate::Contains(&[("/title/", MediaKind::Movie)]) },
    SiteRule {
        site: Site::Tmdb,
        domains: &["themoviedb.org", "tmdb.org"],
        gate: PathGate::Contains(&[("/movie/", MediaKind::Movie), ("/tv/", MediaKind::Tv)]),
    },
    SiteRule { site: Site::Letterboxd, domains: &["letterboxd.com"], gate: PathGate::Contains(&[("/film/", MediaKind::Movie)]) },
    SiteRule { site: Site::Goodreads, domains: &["goodreads.com"], gate: PathGate::Contains(&[("/book/", MediaKind::Book)]) },
    SiteRule {
        site: Site::Spotify,
        domains: &["spotify.com"],
        gate: PathGate::Contains(&[("/album/", MediaKind::Music), ("/track/", MediaKind::Music)]),
    },
    SiteRule {
        site: Site::AppleMusic,
        domains: &["music.apple.com"],
        gate: PathGate::Contains(&[("/album/", MediaKind::Music), ("/artist/", MediaKind::Music)]),
    },
    SiteRule { site: Site::Igdb, domains: &["igdb.com"], gate: PathGate::Any(MediaKind::Game) },
    SiteRule { site: Site::Steam, domains: &["steampowered.com"], gate: PathGate::Any(MediaKind::Game) },
    SiteRule { site: Site::PlayStation, domains: &["playstation.com"], gate: PathGate::Any(MediaKind::Game) },
    SiteRule { site: Site::Xbox, domains: &["xbox.com"], gate: PathGate::Any(MediaKind::Game) },
    SiteRule { site: Site::Nintendo, domains: &["nintendo.com"], gate: PathGate::Any(MediaKind::Game) },
    SiteRule { site: Site::Epic, domains: &["epicgames.com"], gate: PathGate::Any(MediaKind::Game) },
    SiteRule { site: Site::Gog, domains: &["gog.com"], gate: PathGate::Any(MediaKind::Game) },
    SiteRule { site: Site::Wikipedia, domains: &["wikipedia.org"], gate: PathGate::WikiSuffix },
];

/// Wikipedia disambiguation suffixes, checked in order.
pub(crate) const WIKI_SUFFIXES: &[(&str, MediaKind)] = &[
    ("film", MediaKind::Movie),
    ("tv_series", MediaKind::Tv),
    ("book", MediaKind::Book),
    ("album", MediaKind::Music),
    ("video_game", MediaKind::Game),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub site: Site,
    pub kind: MediaKind,
}

impl Classification {
    pub fn icon(&self) -> &'static str { self.kind.icon() }
}

/// `(kind, icon)` for a raw link, or `None` when it is not a known media page.
pub fn classify(raw: &str) -> Option<(MediaKind, &'static str)> {
    let url = Url::parse(raw.trim()).ok()?;
    classify_url(&url).map(|c| (c.kind, c.icon()))
}

pub fn classify_url(url: &Url) -> Option<Classification> {
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = url.host_str()?.to_ascii_lowercase();
    let rule = RULES.iter().find(|r| r.domains.iter().any(|d| host_matches(&host, d)))?;
    let path = url.path().to_lowercase();
    let kind = match rule.gate {
        PathGate::Any(kind) => kind,
        PathGate::Contains(needles) => needles.iter().find(|(n, _)| path.contains(n)).map(|(_, k)| *k)?,
        PathGate::WikiSuffix => wiki_kind(url.path())?,
    };
    Some(Classification { site: rule.site, kind })
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain || host.strip_suffix(domain).is_some_and(|rest| rest.ends_with('.'))
}

/// Kind of a Wikipedia article from the disambiguation suffix of its slug.
fn wiki_kind(path: &str) -> Option<MediaKind> {
    let slug = path.strip_prefix("/wiki/")?;
    if slug.is_empty() || slug.contains('/') {
        return None;
    }
    let slug = decode_segment(slug).to_lowercase();
    let slug = slug.trim_end_matches(')');
    WIKI_SUFFIXES.iter().find(|(suffix, _)| has_suffix_token(slug, suffix)).map(|(_, k)| *k)
}

/// `slug` ends in `_<suffix>` or `(<suffix>` and has something before it.
pub(crate) fn has_suffix_token(slug: &str, suffix: &str) -> bool {
    slug.strip_suffix(suffix)
        .and_then(|rest| rest.strip_suffix(&['_', '('][..]))
        .is_some_and(|rest| !rest.is_empty())
}

pub(crate) fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment).map(|s| s.into_owned()).unwrap_or_else(|_| segment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(url: &str) -> Option<MediaKind> { classify(url).map(|(k, _)| k) }

    #[test]
    fn imdb_titles_only() {
        assert_eq!(classify("https://www.imdb.com/title/tt0111161/"), Some((MediaKind::Movie, "movie")));
        assert_eq!(kind("https://m.imdb.com/title/tt0903747/"), Some(MediaKind::Movie));
        assert_eq!(kind("https://www.imdb.com/name/nm0000151/"), None);
    }

    #[test]
    fn tmdb_movie_and_tv() {
        assert_eq!(kind("https://www.themoviedb.org/movie/603-the-matrix"), Some(MediaKind::Movie));
        assert_eq!(classify("https://www.themoviedb.org/tv/1396-breaking-bad"), Some((MediaKind::Tv, "tv")));
        assert_eq!(kind("https://tmdb.org/movie/603"), Some(MediaKind::Movie));
        assert_eq!(kind("https://www.themoviedb.org/person/287-brad-pitt"), None);
    }

    #[test]
    fn path_gated_sites() {
        assert_eq!(kind("https://letterboxd.com/film/parasite-2019/"), Some(MediaKind::Movie));
        assert_eq!(kind("https://letterboxd.com/someone/list/faves/"), None);
        assert_eq!(kind("https://www.goodreads.com/book/show/44767458-dune"), Some(MediaKind::Book));
        assert_eq!(kind("https://www.goodreads.com/author/show/58.Frank_Herbert"), None);
        assert_eq!(kind("https://open.spotify.com/album/4LH4d3cOWNNsVw41Gqt2kv"), Some(MediaKind::Music));
        assert_eq!(kind("https://open.spotify.com/track/11dFghVXANMlKmJXsNCbNl"), Some(MediaKind::Music));
        assert_eq!(kind("https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M"), None);
        assert_eq!(classify("https://music.apple.com/us/album/abbey-road/1441164426"), Some((MediaKind::Music, "music")));
        assert_eq!(kind("https://music.apple.com/us/artist/the-beatles/136975"), Some(MediaKind::Music));
        assert_eq!(kind("https://www.apple.com/us/album/abbey-road/1"), None);
    }

    #[test]
    fn storefronts_take_any_path() {
        for url in [
            "https://www.igdb.com/games/hades",
            "https://store.steampowered.com/app/570/Dota_2/",
            "https://store.playstation.com/en-us/concept/10001130",
            "https://www.xbox.com/en-US/games/store/halo-infinite/9PP5G1F0C2B6",
            "https://www.nintendo.com/us/store/products/super-mario-odyssey-switch/",
            "https://store.epicgames.com/en-US/p/hades",
            "https://www.gog.com/en/game/the_witcher_3_wild_hunt",
            "https://store.steampowered.com",
        ] {
            assert_eq!(classify(url), Some((MediaKind::Game, "game")), "{url}");
        }
    }

    #[test]
    fn wikipedia_suffixes() {
        assert_eq!(kind("https://en.wikipedia.org/wiki/Dune_(2021_film)"), Some(MediaKind::Movie));
        assert_eq!(kind("https://en.wikipedia.org/wiki/Dune_(film)"), Some(MediaKind::Movie));
        assert_eq!(kind("https://en.wikipedia.org/wiki/Breaking_Bad_(TV_series)"), Some(MediaKind::Tv));
        assert_eq!(kind("https://en.m.wikipedia.org/wiki/Abbey_Road_(album)"), Some(MediaKind::Music));
        assert_eq!(kind("https://en.wikipedia.org/wiki/Portal_2_video_game"), Some(MediaKind::Game));
        assert_eq!(kind("https://de.wikipedia.org/wiki/Dune_%282021_film%29"), Some(MediaKind::Movie));
        assert_eq!(kind("https://en.wikipedia.org/wiki/Dune"), None);
        assert_eq!(kind("https://en.wikipedia.org/wiki/Film"), None);
        assert_eq!(kind("https://en.wikipedia.org/w/index.php?title=Dune_(film)"), None);
    }

    #[test]
    fn unknown_and_malformed() {
        assert_eq!(classify("https://www.nytimes.com/2021/10/21/movies/dune-review.html"), None);
        assert_eq!(classify("https://notimdb.com/title/tt0111161/"), None);
        assert_eq!(classify("ftp://imdb.com/title/tt1/"), None);
        assert_eq!(classify("imdb.com/title/tt0111161"), None);
        assert_eq!(classify("http://"), None);
        assert_eq!(classify(""), None);
    }
}
