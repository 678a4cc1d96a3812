//! Narrow query layer over parsed HTML.
//!
//! The page processors only ever ask for "the first / every descendant with this
//! tag and these attributes", an element's text, an attribute, or its parent.
//! Everything that knows about the `scraper` crate lives in this file.

use scraper::{ElementRef, Html};

/// A parsed page. Parsing is lenient and never fails; broken markup simply
/// yields a tree with fewer matches.
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }

    /// First element in document order matching `query`, the root included.
    pub fn find(&self, query: &Query<'_>) -> Option<Element<'_>> {
        self.elements().find(|el| query.matches(el))
    }

    pub fn find_all(&self, query: &Query<'_>) -> Vec<Element<'_>> {
        self.elements().filter(|el| query.matches(el)).collect()
    }

    fn elements(&self) -> impl Iterator<Item = Element<'_>> {
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .map(Element)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Element<'a>(ElementRef<'a>);

impl<'a> Element<'a> {
    /// First matching descendant, excluding the element itself.
    pub fn find(&self, query: &Query<'_>) -> Option<Element<'a>> {
        self.descendants().find(|el| query.matches(el))
    }

    pub fn find_all(&self, query: &Query<'_>) -> Vec<Element<'a>> {
        self.descendants().filter(|el| query.matches(el)).collect()
    }

    /// Text of every descendant text node, each piece trimmed, empty pieces
    /// dropped, the rest concatenated without a separator.
    pub fn text(&self) -> String {
        self.0
            .text()
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .collect()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.0.value().attr(name)
    }

    pub fn name(&self) -> &'a str {
        self.0.value().name()
    }

    pub fn parent(&self) -> Option<Element<'a>> {
        self.0.parent().and_then(ElementRef::wrap).map(Element)
    }

    fn descendants(&self) -> impl Iterator<Item = Element<'a>> {
        self.0
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .map(Element)
    }
}

/// Tag name plus attribute constraints, e.g. `Query::tag("div").class("genres")`.
#[derive(Debug, Clone)]
pub struct Query<'q> {
    tag: &'q str,
    class: Option<&'q str>,
    attrs: Vec<(&'q str, Option<&'q str>)>,
}

impl<'q> Query<'q> {
    pub fn tag(tag: &'q str) -> Self {
        Self {
            tag,
            class: None,
            attrs: Vec::new(),
        }
    }

    /// Matches when `class` is one of the element's class tokens.
    pub fn class(mut self, class: &'q str) -> Self {
        self.class = Some(class);
        self
    }

    pub fn attr_eq(mut self, name: &'q str, value: &'q str) -> Self {
        self.attrs.push((name, Some(value)));
        self
    }

    pub fn has_attr(mut self, name: &'q str) -> Self {
        self.attrs.push((name, None));
        self
    }

    fn matches(&self, el: &Element<'_>) -> bool {
        let value = el.0.value();
        if !value.name().eq_ignore_ascii_case(self.tag) {
            return false;
        }
        if let Some(class) = self.class {
            if !value.classes().any(|c| c == class) {
                return false;
            }
        }
        self.attrs.iter().all(|(name, expected)| match (value.attr(name), expected) {
            (Some(actual), Some(expected)) => actual == *expected,
            (Some(_), None) => true,
            (None, _) => false,
        })
    }
}
