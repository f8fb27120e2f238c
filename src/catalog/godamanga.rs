//! Catalog adapter for Godamanga and its `baozimh.one` mirror.
//!
//! Book pages show a short chapter list and, for long books, link an
//! "all chapters" page; each entry is a `.chapteritem` block. Chapter pages
//! are a single long strip of lazily loaded `<img>` tags.

use std::collections::HashSet;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, instrument};
use url::Url;

use super::http::PageClient;
use super::scrape::{
    HREF_RE, capture_text, clean_text, compile_static_regex, decode_entities,
    dedup_preserving_order,
};
use super::{BookInfo, CatalogAdapter, CatalogError, Chapter, sanitize_path_name};

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?s)class="[^"]*\btext-xl\b[^"]*"[^>]*>(.*?)</h[1-3]>"#)
});
static SUBTITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?s)<(\w+)\b[^>]*class="[^"]*\btext-xs\b[^"]*"[^>]*>.*?</\w+>"#)
});
static AUTHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?s)<a\b[^>]*href="[^"]*/author/[^"]*"[^>]*>(.*?)</a>"#)
});
static DESC_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?s)class="[^"]*\btext-medium\b[^"]*"[^>]*>(.*?)</"#)
});
static COVER_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?s)id="MangaCard".*?<img\b[^>]*?\bsrc="([^"]+)""#)
});
static ALL_CHAPTERS_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?s)class="[^"]*\bmy-unit-sm\b[^"]*"[^>]*>\s*<a\b[^>]*\bhref="([^"]+)""#)
});
static CHAPTER_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"class="[^"]*\bchapteritem\b[^"]*""#));
static CHAPTER_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?s)class="[^"]*\bchaptertitle\b[^"]*"[^>]*>(.*?)</"#)
});
static IMG_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"<img\b([^>]*)>"));
static DATA_SRC_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"\bdata-src\s*=\s*"([^"]*)""#));
static SRC_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?:^|\s)src\s*=\s*"([^"]*)""#));

/// Adapter for `godamanga.com` and `baozimh.one`.
///
/// Register it ahead of [`super::BaoziAdapter`]: `baozimh.one` also
/// contains "baozi" but serves this site's markup.
#[derive(Debug, Clone)]
pub struct GodamangaAdapter {
    client: PageClient,
}

impl GodamangaAdapter {
    /// # Errors
    ///
    /// Returns [`CatalogError::Fetch`] when the HTTP client cannot be built.
    pub fn new() -> Result<Self, CatalogError> {
        Ok(Self {
            client: PageClient::new("godamanga")?,
        })
    }
}

#[async_trait]
impl CatalogAdapter for GodamangaAdapter {
    fn name(&self) -> &str {
        "godamanga"
    }

    fn can_handle(&self, target: &str) -> bool {
        Url::parse(target)
            .ok()
            .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
            .is_some_and(|host| host.contains("godamanga") || host.ends_with("baozimh.one"))
    }

    #[instrument(skip(self), fields(adapter = "godamanga"))]
    async fn resolve_catalog(&self, target: &str) -> Result<BookInfo, CatalogError> {
        Url::parse(target).map_err(|_| CatalogError::invalid_url(target))?;
        let (html, page_url) = self.client.get_text(target).await?;
        let mut book = parse_book_page(&html, &page_url)?;

        // Short books have no separate list page.
        let chapters = match all_chapters_link(&html, &page_url) {
            Some(list_url) => {
                let (list_html, list_url) = self.client.get_text(&list_url).await?;
                parse_chapter_list(&list_html, &list_url)
            }
            None => parse_chapter_list(&html, &page_url),
        };
        if chapters.is_empty() {
            return Err(CatalogError::empty(page_url.as_str()));
        }
        book.chapters = chapters;
        book.raw_url = target.to_string();
        debug!(
            book = %book.name,
            chapters = book.chapters.len(),
            "parsed catalog"
        );
        Ok(book)
    }

    #[instrument(skip(self), fields(adapter = "godamanga"))]
    async fn resolve_chapter_assets(&self, chapter_ref: &str) -> Result<Vec<String>, CatalogError> {
        let (html, page_url) = self.client.get_text(chapter_ref).await?;
        let urls = parse_chapter_images(&html, &page_url);
        if urls.is_empty() {
            return Err(CatalogError::unrecognized(
                chapter_ref,
                "no images found on chapter page",
            ));
        }
        Ok(urls)
    }
}

/// Reads metadata only; chapters are filled in by the caller.
fn parse_book_page(html: &str, page_url: &Url) -> Result<BookInfo, CatalogError> {
    let info = html.find("id=\"info\"").map_or(html, |start| &html[start..]);

    let title_fragment = TITLE_RE
        .captures(info)
        .and_then(|caps| caps.get(1))
        .map(|m| SUBTITLE_RE.replace_all(m.as_str(), "").into_owned())
        .unwrap_or_default();
    let name = clean_text(&title_fragment);
    if name.is_empty() {
        return Err(CatalogError::unrecognized(page_url.as_str(), "missing comic title"));
    }

    let cover_url = COVER_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| decode_entities(m.as_str().trim()))
        .unwrap_or_default();

    Ok(BookInfo {
        path_name: sanitize_path_name(&name),
        author: capture_text(&AUTHOR_RE, info),
        desc: capture_text(&DESC_RE, info),
        cover_url,
        cover_path: String::new(),
        chapters: Vec::new(),
        url: page_url.to_string(),
        language: String::new(),
        raw_url: String::new(),
        name,
    })
}

fn all_chapters_link(html: &str, page_url: &Url) -> Option<String> {
    let href = ALL_CHAPTERS_RE.captures(html)?.get(1)?.as_str().trim();
    page_url
        .join(&decode_entities(href))
        .ok()
        .map(|url| url.to_string())
}

/// Chapters from the first `#chapterlists` block, in page order.
fn parse_chapter_list(html: &str, page_url: &Url) -> Vec<Chapter> {
    let Some(start) = html.find("id=\"chapterlists\"") else {
        return Vec::new();
    };
    let section = &html[start..];
    // A second list (the collapsed duplicate) ends this one.
    let section = section[1..]
        .find("id=\"chapterlists\"")
        .map_or(section, |end| &section[..=end]);

    let starts: Vec<usize> = CHAPTER_ITEM_RE
        .find_iter(section)
        .map(|m| m.start())
        .collect();
    let mut seen = HashSet::new();
    starts
        .iter()
        .enumerate()
        .filter_map(|(i, &from)| {
            let to = starts.get(i + 1).copied().unwrap_or(section.len());
            let item = &section[from..to];
            let href = HREF_RE.captures(item)?.get(1)?.as_str().trim();
            let href = page_url.join(&decode_entities(href)).ok()?.to_string();
            seen.insert(href.clone())
                .then(|| (capture_text(&CHAPTER_TITLE_RE, item), href))
        })
        .enumerate()
        .map(|(index, (raw_name, href))| Chapter::new(index, raw_name, href))
        .collect()
}

fn parse_chapter_images(html: &str, page_url: &Url) -> Vec<String> {
    let strip = html
        .find("touch-manipulation")
        .map_or(html, |start| &html[start..]);

    let urls = IMG_RE
        .captures_iter(strip)
        .filter_map(|caps| {
            let attrs = caps.get(1)?.as_str();
            let raw = DATA_SRC_RE
                .captures(attrs)
                .or_else(|| SRC_RE.captures(attrs))?
                .get(1)?
                .as_str()
                .trim();
            if raw.is_empty() {
                return None;
            }
            page_url
                .join(&decode_entities(raw))
                .ok()
                .map(|url| url.to_string())
        })
        .collect();
    dedup_preserving_order(urls)
}
