use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::dom::{Document, Element, Query};
use crate::models::{ItemKind, Record};

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})\b").expect("valid year regex"));

const TOGGLE_SUFFIXES: [&str; 4] = ["(více)", "(méně)", "(more)", "(less)"];

#[derive(Debug, Clone, Copy, Default)]
pub struct ParserOptions {
    /// Use the first listed title when the titles list has no usable USA entry.
    pub first_title_fallback: bool,
}

/// Turns one item detail page into a [`Record`].
///
/// Every field is extracted on its own and falls back to a default when the
/// markup is missing or malformed. Only a missing title drops the record.
#[derive(Debug, Clone, Default)]
pub struct ItemParser {
    options: ParserOptions,
}

impl ItemParser {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    pub fn parse(&self, page: &Document, url: &str) -> Option<Record> {
        let kind = extract_kind(page);
        let Some(title) = self.extract_title(page) else {
            warn!("'{}' has no US title.", url);
            return None;
        };

        Some(Record {
            kind,
            url: url.to_string(),
            title,
            year: extract_year(page, kind, url).unwrap_or(0),
            genres: extract_genres(page),
            rating: extract_rating(page, url).unwrap_or(0),
        })
    }

    fn extract_title(&self, page: &Document) -> Option<String> {
        let Some(names) = page.find(&Query::tag("ul").class("film-names")) else {
            return header_name(page)?
                .find(&Query::tag("h1"))
                .map(|h1| h1.text())
                .filter(|t| !t.is_empty());
        };

        let entries = names.find_all(&Query::tag("li"));
        let us_title = entries.iter().find_map(|li| {
            let flag = li.find(&Query::tag("img").attr_eq("title", "USA"))?;
            let owner = flag.parent()?;
            // Working titles carry an extra "info" note next to the flag.
            if owner.find(&Query::tag("span").class("info")).is_some() {
                return None;
            }
            Some(clean_title(&owner.text()))
        });

        let title = match us_title {
            Some(title) => Some(title),
            None if self.options.first_title_fallback => {
                entries.first().map(|li| clean_title(&li.text()))
            }
            None => None,
        };
        title.filter(|t| !t.is_empty())
    }
}

fn header_name(page: &Document) -> Option<Element<'_>> {
    page.find(&Query::tag("div").class("film-header-name"))
}

pub(crate) fn extract_kind(page: &Document) -> ItemKind {
    let marker = header_name(page).and_then(|h| h.find(&Query::tag("span").class("type")));
    match marker {
        Some(_) => ItemKind::TvShow,
        None => ItemKind::Movie,
    }
}

fn clean_title(raw: &str) -> String {
    TOGGLE_SUFFIXES
        .iter()
        .fold(raw.to_string(), |acc, suffix| acc.replace(suffix, ""))
        .trim()
        .to_string()
}

pub(crate) fn extract_genres(page: &Document) -> Vec<String> {
    page.find(&Query::tag("div").class("genres"))
        .map(|div| {
            div.text()
                .split('/')
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn extract_rating(page: &Document, url: &str) -> Option<u8> {
    let raw = page
        .find(&Query::tag("div").class("film-rating-average"))?
        .text();
    match raw.trim_end_matches('%').trim().parse::<u8>() {
        Ok(rating) if rating <= 100 => Some(rating),
        _ => {
            warn!("Failed to parse rating '{}' for {}", raw, url);
            None
        }
    }
}

/// Release year for movies, first-air year for shows.
pub(crate) fn extract_year(page: &Document, kind: ItemKind, url: &str) -> Option<i32> {
    let value = page
        .find(&Query::tag("div").class("origin"))?
        .find(&Query::tag("span"))?;
    let text = value.text().replace(',', "");

    let year = match kind {
        ItemKind::TvShow => YEAR_RE
            .captures(&text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok()),
        ItemKind::Movie => text.trim().parse().ok(),
    };
    if year.is_none() {
        warn!("Failed to parse year '{}' for {}", text, url);
    }
    year
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    const URL: &str = "https://www.csfd.cz/film/1/";

    const SAMPLE: &str = r#"
        <html>
            <div class="film-header-name">
                <h1>Test Movie</h1>
                <span class="type">TV Series</span>
            </div>
            <ul class="film-names">
                <li><img title="USA">US Title</li>
            </ul>
            <div class="genres">Action / Drama</div>
            <div class="film-rating-average">85%</div>
            <div class="origin"><span>2020</span></div>
        </html>
    "#;

    fn parse(html: &str) -> Option<Record> {
        ItemParser::default().parse(&Document::parse(html), URL)
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn parses_full_item() {
        let record = parse(SAMPLE).unwrap();
        assert_eq!(record.kind, ItemKind::TvShow);
        assert_eq!(record.url, URL);
        assert_eq!(record.title, "US Title");
        assert_eq!(record.year, 2020);
        assert_eq!(record.genres, vec!["Action", "Drama"]);
        assert_eq!(record.rating, 85);
    }

    #[test]
    fn falls_back_to_heading_without_titles_list() {
        let html = r#"
            <div class="film-header-name">
                <h1>Test Movie</h1>
            </div>
            <div class="genres">Comedy</div>
        "#;
        let record = parse(html).unwrap();
        assert_eq!(record.title, "Test Movie");
        assert_eq!(record.kind, ItemKind::Movie);
    }

    #[test]
    fn empty_page_yields_nothing() {
        assert!(parse("<html></html>").is_none());
    }

    #[test]
    fn kind_follows_type_marker() {
        let show = Document::parse(r#"<div class="film-header-name"><span class="type">(seriál)</span></div>"#);
        let movie = Document::parse(r#"<div class="film-header-name"><h1>X</h1></div>"#);
        let stray = Document::parse(r#"<span class="type">(seriál)</span>"#);
        assert_eq!(extract_kind(&show), ItemKind::TvShow);
        assert_eq!(extract_kind(&movie), ItemKind::Movie);
        assert_eq!(extract_kind(&stray), ItemKind::Movie);
    }

    #[test]
    fn skips_working_titles_and_strips_toggles() {
        let html = r#"
            <ul class="film-names">
              <li><img title="USA">Working <span class="info">(pracovní název)</span></li>
              <li><img title="Czech">Český</li>
              <li><img title="USA">Final Title <a>(více)</a></li>
            </ul>
        "#;
        assert_eq!(parse(html).unwrap().title, "Final Title");
    }

    #[test]
    fn list_without_usa_entry_drops_record() {
        let html = r#"
            <div class="film-header-name"><h1>Heading</h1></div>
            <ul class="film-names"><li><img title="Czech">Český název</li></ul>
        "#;
        assert!(parse(html).is_none());

        let lenient = ItemParser::new(ParserOptions {
            first_title_fallback: true,
        });
        let record = lenient.parse(&Document::parse(html), URL).unwrap();
        assert_eq!(record.title, "Český název");
    }

    #[test]
    fn genres_keep_order_and_drop_empty_pieces() {
        let page = Document::parse(r#"<div class="genres">Krimi / / Drama / Krimi</div>"#);
        assert_eq!(extract_genres(&page), vec!["Krimi", "Drama", "Krimi"]);
        assert!(extract_genres(&Document::parse("<p></p>")).is_empty());
    }

    #[test]
    fn rating_defaults() {
        let ok = Document::parse(r#"<div class="film-rating-average">77%</div>"#);
        let unrated = Document::parse(r#"<div class="film-rating-average">?%</div>"#);
        let too_big = Document::parse(r#"<div class="film-rating-average">150%</div>"#);
        assert_eq!(extract_rating(&ok, URL), Some(77));
        assert_eq!(extract_rating(&unrated, URL), None);
        assert_eq!(extract_rating(&too_big, URL), None);
        assert_eq!(extract_rating(&Document::parse("<p></p>"), URL), None);
    }

    #[test]
    fn unparsable_rating_is_logged_as_warning() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .finish();

        let page = Document::parse(r#"<div class="film-rating-average">?%</div>"#);
        let rating = tracing::subscriber::with_default(subscriber, || extract_rating(&page, URL));

        assert_eq!(rating, None);
        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("WARN"));
        assert!(logs.contains("Failed to parse rating '?%'"));
    }

    #[test]
    fn year_depends_on_kind() {
        let range = Document::parse(r#"<div class="origin">USA, <span>2020, 2023</span></div>"#);
        let open = Document::parse(r#"<div class="origin"><span>(2019-2022)</span></div>"#);
        let movie = Document::parse(r#"<div class="origin"><span>2020</span></div>"#);
        let junk = Document::parse(r#"<div class="origin"><span>unknown</span></div>"#);
        assert_eq!(extract_year(&range, ItemKind::TvShow, URL), Some(2020));
        assert_eq!(extract_year(&open, ItemKind::TvShow, URL), Some(2019));
        assert_eq!(extract_year(&movie, ItemKind::Movie, URL), Some(2020));
        assert_eq!(extract_year(&range, ItemKind::Movie, URL), None);
        assert_eq!(extract_year(&junk, ItemKind::TvShow, URL), None);
        assert_eq!(extract_year(&junk, ItemKind::Movie, URL), None);
    }

    #[test]
    fn malformed_fields_do_not_drop_record() {
        let html = r#"
            <div class="film-header-name"><h1>Only Title</h1></div>
            <div class="film-rating-average">n/a</div>
            <div class="origin">no span here</div>
        "#;
        let record = parse(html).unwrap();
        assert_eq!(record.kind, ItemKind::Movie);
        assert_eq!(record.title, "Only Title");
        assert_eq!(record.year, 0);
        assert_eq!(record.rating, 0);
        assert!(record.genres.is_empty());
    }
}
