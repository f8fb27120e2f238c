//! Asset file naming and in-progress path resolution.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rand::Rng;
use url::Url;

use super::constants::{DEFAULT_ASSET_EXTENSION, PART_SUFFIX};
use crate::catalog::sanitize_path_name;

const FALLBACK_STEM: &str = "asset";

/// Derives the saved file name for an asset URL.
///
/// The name is the URL's last path segment, percent-decoded and made safe
/// for a single path component. With `fixed_name` the stem is replaced and
/// the URL's extension kept (`jpg` when it has none).
#[must_use]
pub(crate) fn asset_file_name(url: &Url, fixed_name: Option<&str>) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();
    let decoded = urlencoding::decode(segment).map_or_else(|_| segment.to_string(), |d| d.into_owned());
    let from_url = sanitize_path_name(&decoded);

    let fixed = fixed_name
        .map(sanitize_path_name)
        .filter(|name| !name.is_empty());

    match fixed {
        Some(stem) => {
            let extension = extension_of(&from_url).unwrap_or(DEFAULT_ASSET_EXTENSION);
            format!("{stem}.{extension}")
        }
        None if from_url.is_empty() => format!("{FALLBACK_STEM}.{DEFAULT_ASSET_EXTENSION}"),
        None => from_url,
    }
}

/// Picks a stem override for each asset so no two share a file name.
///
/// The first asset to claim a name keeps it (`None`); later ones get
/// `{stem}_2`, `{stem}_3`, ... Names are compared case-insensitively.
/// Unparsable URLs get `None` and never reach the network.
#[must_use]
pub(crate) fn unique_asset_stems(urls: &[String]) -> Vec<Option<String>> {
    let mut taken = HashSet::with_capacity(urls.len());
    urls.iter()
        .map(|raw| {
            let url = Url::parse(raw.trim()).ok()?;
            let natural = asset_file_name(&url, None);
            if taken.insert(natural.to_lowercase()) {
                return None;
            }
            let stem = natural
                .rsplit_once('.')
                .filter(|(stem, _)| !stem.is_empty())
                .map_or(natural.as_str(), |(stem, _)| stem);
            (2..)
                .map(|n| format!("{stem}_{n}"))
                .find(|candidate| {
                    taken.insert(asset_file_name(&url, Some(candidate)).to_lowercase())
                })
        })
        .collect()
}

/// Returns the extension of `name` if it looks like one (1-5 alphanumerics).
fn extension_of(name: &str) -> Option<&str> {
    let (stem, extension) = name.rsplit_once('.')?;
    let plausible = !stem.is_empty()
        && (1..=5).contains(&extension.len())
        && extension.chars().all(|c| c.is_ascii_alphanumeric());
    plausible.then_some(extension)
}

/// Returns a hidden, attempt-unique sibling path to stream `file_name` into.
///
/// Unique per attempt so two concurrent fetches of the same name never share
/// a partial file.
#[must_use]
pub(crate) fn part_path(dest_dir: &Path, file_name: &str) -> PathBuf {
    let nonce: u32 = rand::thread_rng().r#gen();
    dest_dir.join(format!(".{file_name}.{nonce:08x}.{PART_SUFFIX}"))
}
