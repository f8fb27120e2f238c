//! Catalog adapter for the Baozi comic site family.
//!
//! Book pages list chapters as `a.comics-chapters__item` anchors under
//! `#chapter-items` / `#chapters_other_list`; chapter pages embed each image
//! URL in an `<amp-state>` JSON script and split long chapters across pages
//! linked by a "next page" button.

use std::collections::HashSet;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, instrument, warn};
use url::Url;

use super::http::PageClient;
use super::scrape::{
    HREF_RE, capture_text, clean_text, compile_static_regex, decode_entities,
    dedup_preserving_order,
};
use super::{BookInfo, CatalogAdapter, CatalogError, Chapter, sanitize_path_name};

/// Upper bound on "next page" hops inside one chapter.
const MAX_CHAPTER_PAGES: usize = 64;

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?s)class="[^"]*\bcomics-detail__title\b[^"]*"[^>]*>(.*?)</"#)
});
static AUTHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?s)class="[^"]*\bcomics-detail__author\b[^"]*"[^>]*>(.*?)</"#)
});
static DESC_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?s)class="[^"]*\bcomics-detail__desc\b[^"]*"[^>]*>(.*?)</"#)
});
static COVER_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?s)de-info__box.*?<amp-img\b[^>]*?\bsrc="([^"]+)""#)
});
static ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?s)<a\b([^>]*)>(.*?)</a>"));
static SPAN_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?s)<span\b[^>]*>(.*?)</span>"));
static AMP_STATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r"(?s)<amp-state\b[^>]*>\s*<script\b[^>]*>(.*?)</script>")
});
static NEXT_PAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?s)class="[^"]*\bnext_chapter\b[^"]*"[^>]*>.*?<a\b([^>]*)>(.*?)</a>"#)
});
static NEXT_PAGE_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex("下一頁|下一页"));
static MIRROR_HOST_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"tw\.|www\."));

/// Adapter for `baozimh.com` and its mirrors.
#[derive(Debug, Clone)]
pub struct BaoziAdapter {
    client: PageClient,
}

impl BaoziAdapter {
    /// Creates the adapter with the shared page client policy.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Fetch`] when the HTTP client cannot be built.
    pub fn new() -> Result<Self, CatalogError> {
        Ok(Self {
            client: PageClient::new("baozi")?,
        })
    }
}

#[async_trait]
impl CatalogAdapter for BaoziAdapter {
    fn name(&self) -> &str {
        "baozi"
    }

    fn can_handle(&self, target: &str) -> bool {
        Url::parse(target)
            .ok()
            .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
            .is_some_and(|host| host.contains("baozi") || host.contains("fzmanga"))
    }

    /// Rewrites the traditional-Chinese and `www` mirrors to the `cn` host,
    /// which is the only one reliably reachable.
    fn preprocess_target_ref(&self, target: &str) -> String {
        MIRROR_HOST_RE.replace(target, "cn.").into_owned()
    }

    #[instrument(skip(self), fields(adapter = "baozi"))]
    async fn resolve_catalog(&self, target: &str) -> Result<BookInfo, CatalogError> {
        Url::parse(target).map_err(|_| CatalogError::invalid_url(target))?;
        let (html, page_url) = self.client.get_text(target).await?;
        let mut book = parse_book_page(&html, &page_url)?;
        book.raw_url = target.to_string();
        debug!(
            book = %book.name,
            chapters = book.chapters.len(),
            "parsed catalog"
        );
        Ok(book)
    }

    #[instrument(skip(self), fields(adapter = "baozi"))]
    async fn resolve_chapter_assets(&self, chapter_ref: &str) -> Result<Vec<String>, CatalogError> {
        let mut urls = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(chapter_ref.to_string());

        while let Some(page) = next.take() {
            if !visited.insert(page.clone()) {
                break;
            }
            if visited.len() > MAX_CHAPTER_PAGES {
                warn!(chapter_ref, "chapter paging exceeded limit; keeping pages read so far");
                break;
            }
            let (html, page_url) = self.client.get_text(&page).await?;
            let parsed = parse_chapter_page(&html, &page_url);
            urls.extend(parsed.image_urls);
            next = parsed.next_page;
        }

        if urls.is_empty() {
            return Err(CatalogError::unrecognized(
                chapter_ref,
                "no images found on chapter page",
            ));
        }
        Ok(dedup_preserving_order(urls))
    }
}

/// Images and continuation link found on one chapter page.
#[derive(Debug, Default, PartialEq, Eq)]
struct ChapterPage {
    image_urls: Vec<String>,
    next_page: Option<String>,
}

fn parse_book_page(html: &str, page_url: &Url) -> Result<BookInfo, CatalogError> {
    let name = capture_text(&TITLE_RE, html);
    if name.is_empty() {
        return Err(CatalogError::unrecognized(page_url.as_str(), "missing comic title"));
    }

    let chapters = parse_chapter_list(html, page_url);
    if chapters.is_empty() {
        return Err(CatalogError::empty(page_url.as_str()));
    }

    let cover_url = COVER_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| decode_entities(m.as_str().trim()))
        .unwrap_or_default();

    Ok(BookInfo {
        path_name: sanitize_path_name(&name),
        author: capture_text(&AUTHOR_RE, html),
        desc: capture_text(&DESC_RE, html),
        cover_url,
        cover_path: String::new(),
        chapters,
        url: page_url.to_string(),
        language: String::new(),
        raw_url: String::new(),
        name,
    })
}

/// Extracts the full chapter list, falling back to the "latest chapters"
/// block (listed newest first) for books that only have that.
fn parse_chapter_list(html: &str, page_url: &Url) -> Vec<Chapter> {
    let full_list_start = html
        .find("id=\"chapter-items\"")
        .or_else(|| html.find("id=\"chapters_other_list\""));

    let (section, newest_first) = match full_list_start {
        Some(start) => (&html[start..], false),
        None => (html, true),
    };

    let mut entries: Vec<(String, String)> = ANCHOR_RE
        .captures_iter(section)
        .filter_map(|caps| {
            let attrs = caps.get(1)?.as_str();
            if !attrs.contains("comics-chapters__item") {
                return None;
            }
            let href = HREF_RE.captures(attrs)?.get(1)?.as_str().trim();
            let href = page_url.join(&decode_entities(href)).ok()?;
            let body = caps.get(2)?.as_str();
            let title = SPAN_RE
                .captures(body)
                .and_then(|span| span.get(1))
                .map_or(body, |m| m.as_str());
            Some((clean_text(title), href.to_string()))
        })
        .collect();

    if newest_first {
        entries.reverse();
    }

    entries
        .into_iter()
        .enumerate()
        .map(|(index, (raw_name, href))| Chapter::new(index, raw_name, href))
        .collect()
}

fn parse_chapter_page(html: &str, page_url: &Url) -> ChapterPage {
    let content = html
        .find("comic-contain")
        .map_or(html, |start| &html[start..]);

    let image_urls = AMP_STATE_RE
        .captures_iter(content)
        .filter_map(|caps| {
            let json = caps.get(1)?.as_str();
            let value: serde_json::Value = serde_json::from_str(json.trim()).ok()?;
            let url = value.get("url")?.as_str()?.trim();
            (!url.is_empty()).then(|| url.to_string())
        })
        .collect();

    let buttons: Vec<(String, String)> = NEXT_PAGE_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let attrs = caps.get(1)?.as_str();
            let href = HREF_RE.captures(attrs)?.get(1)?.as_str().to_string();
            Some((href, clean_text(caps.get(2)?.as_str())))
        })
        .collect();
    // The page repeats the navigation bar; the second copy is the bottom one.
    let chosen = if buttons.len() > 1 {
        buttons.get(1)
    } else {
        buttons.first()
    };
    let next_page = chosen
        .filter(|(href, text)| !href.is_empty() && NEXT_PAGE_TEXT_RE.is_match(text))
        .and_then(|(href, _)| page_url.join(&decode_entities(href)).ok())
        .map(|url| url.to_string());

    ChapterPage {
        image_urls,
        next_page,
    }
}
