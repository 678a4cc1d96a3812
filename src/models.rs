use serde::Serialize;
use std::fmt;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Movie,
    TvShow,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Movie => f.write_str("movie"),
            ItemKind::TvShow => f.write_str("tvshow"),
        }
    }
}

/// One scraped movie or TV show.
///
/// `year` and `rating` use `0` for "unknown". Equality and hashing cover every
/// field, so two scrapes of the same URL that disagree on any value are kept
/// as distinct records.
#[derive(Debug, Serialize, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    pub kind: ItemKind,
    pub url: String,
    pub title: String,
    pub year: i32,
    pub genres: Vec<String>,
    pub rating: u8,
}
