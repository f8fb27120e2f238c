//! Shared User-Agent strings for catalog and asset HTTP clients.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/gxr404/comic-book-dl";

/// Browser User-Agent sent to catalog pages.
///
/// Comic sites serve a stripped or empty page to unknown agents, so catalog
/// scraping always presents itself as a desktop browser.
pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Default User-Agent for asset requests (identifies the tool).
#[must_use]
pub(crate) fn default_asset_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("comic-dl/{version} (+{PROJECT_UA_URL})")
}
