use std::collections::HashSet;

use tracing::debug;

use crate::dom::{Document, Query};

/// Collects item links from the landing page sections whose `<h2>` text is
/// listed in `sections`.
///
/// Each matching heading contributes every `<a href>` found under its
/// grandparent block. Several headings with the same text are all used.
pub fn extract_top_item_urls(page: &Document, sections: &[String]) -> HashSet<String> {
    let mut urls = HashSet::new();
    let anchors = Query::tag("a").has_attr("href");

    for heading in page.find_all(&Query::tag("h2")) {
        let title = heading.text();
        if !sections.iter().any(|s| *s == title) {
            continue;
        }
        let Some(block) = heading.parent().and_then(|p| p.parent()) else {
            continue;
        };
        let before = urls.len();
        urls.extend(
            block
                .find_all(&anchors)
                .into_iter()
                .filter_map(|a| a.attr("href"))
                .map(str::to_string),
        );
        debug!("Section '{}' added {} links", title, urls.len() - before);
    }
    urls
}

/// Cuts an item path down to its first three `/`-separated segments so an
/// episode link points at its show: `/show/episode/123/` -> `/show/episode/`.
pub fn normalize_episode_path(path: &str) -> String {
    let head: Vec<&str> = path.split('/').take(3).collect();
    format!("{}/", head.join("/"))
}
