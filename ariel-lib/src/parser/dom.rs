//! A small navigation layer over `tl`, shaped after the queries the extractors need:
//! descendants in document order filtered by tag name and attribute predicates.

use std::borrow::Cow;

use tl::{HTMLTag, Node, NodeHandle, Parser, ParserOptions, VDom, VDomGuard};

use super::ParseError;

/// A parsed HTML page.
#[derive(Debug)]
pub struct Document {
    dom: VDomGuard,
}

impl Document {
    pub fn new(bytes: Vec<u8>) -> Result<Self, ParseError> {
        // SAFETY: the guard owns the input buffer for as long as the DOM referencing it lives.
        let dom = unsafe { tl::parse_owned(String::from_utf8(bytes)?, ParserOptions::default())? };

        Ok(Self { dom })
    }

    pub(crate) fn dom(&self) -> &VDom<'_> {
        self.dom.get_ref()
    }

    /// Every element of the page in document order.
    pub(crate) fn descendants(&self) -> Vec<Element<'_>> {
        let dom = self.dom();
        let mut elements = Vec::new();
        for element in elements_of(dom.children(), dom.parser()) {
            elements.push(element);
            element.collect_descendants(&mut elements);
        }
        elements
    }

    /// The first element in document order matching `predicate`.
    pub(crate) fn find(&self, predicate: impl Fn(&Element<'_>) -> bool) -> Option<Element<'_>> {
        self.descendants().into_iter().find(|element| predicate(element))
    }
}

impl std::str::FromStr for Document {
    type Err = ParseError;

    fn from_str(html: &str) -> Result<Self, Self::Err> {
        Self::new(html.as_bytes().to_vec())
    }
}

fn elements_of<'a>(handles: &[NodeHandle], parser: &'a Parser<'a>) -> Vec<Element<'a>> {
    handles
        .iter()
        .filter_map(|handle| handle.get(parser).and_then(Node::as_tag))
        .map(|tag| Element { tag, parser })
        .collect()
}

/// A tag inside a [`Document`](Document).
#[derive(Clone, Copy)]
pub(crate) struct Element<'a> {
    tag: &'a HTMLTag<'a>,
    parser: &'a Parser<'a>,
}

impl<'a> Element<'a> {
    pub fn is(&self, name: &str) -> bool {
        self.tag.name().as_utf8_str().eq_ignore_ascii_case(name)
    }

    pub fn has_attributes(&self) -> bool {
        !self.tag.attributes().is_empty()
    }

    pub fn attr(&self, name: &'static str) -> Option<Cow<'a, str>> {
        self.tag
            .attributes()
            .get(name)
            .flatten()
            .map(|value| value.as_utf8_str())
    }

    /// The attribute value, or `default` if it is absent or valueless.
    pub fn attr_or(&self, name: &'static str, default: &str) -> String {
        self.attr(name)
            .map_or_else(|| default.to_owned(), Cow::into_owned)
    }

    /// Whether attribute `name` exists and its value satisfies `predicate`.
    pub fn attr_matches(&self, name: &'static str, predicate: impl Fn(&str) -> bool) -> bool {
        self.attr(name).map_or(false, |value| predicate(&value))
    }

    pub fn class_is(&self, class: &str) -> bool {
        self.attr_matches("class", |value| value == class)
    }

    pub fn class_contains(&self, class: &str) -> bool {
        self.attr_matches("class", |value| value.contains(class))
    }

    pub fn class_starts_with(&self, class: &str) -> bool {
        self.attr_matches("class", |value| value.starts_with(class))
    }

    /// The `href` of this element, empty if missing.
    pub fn href(&self) -> String {
        self.attr_or("href", "").trim().to_owned()
    }

    /// Text content with HTML entities decoded and surrounding whitespace removed.
    pub fn text(&self) -> String {
        let raw = self.tag.inner_text(self.parser);
        html_escape::decode_html_entities(&raw).trim().to_owned()
    }

    pub fn children(&self) -> Vec<Element<'a>> {
        elements_of(self.tag.children().top().as_slice(), self.parser)
    }

    /// Every element nested in this one, in document order.
    pub fn descendants(&self) -> Vec<Element<'a>> {
        let mut elements = Vec::new();
        self.collect_descendants(&mut elements);
        elements
    }

    fn collect_descendants(&self, elements: &mut Vec<Element<'a>>) {
        for child in self.children() {
            elements.push(child);
            child.collect_descendants(elements);
        }
    }

    pub fn find(&self, predicate: impl Fn(&Element<'a>) -> bool) -> Option<Element<'a>> {
        self.descendants().into_iter().find(|element| predicate(element))
    }

    pub fn find_all(&self, predicate: impl Fn(&Element<'a>) -> bool) -> Vec<Element<'a>> {
        self.descendants()
            .into_iter()
            .filter(|element| predicate(element))
            .collect()
    }

    /// Descendants with the given tag name.
    pub fn all(&self, name: &str) -> Vec<Element<'a>> {
        self.find_all(|element| element.is(name))
    }

    pub fn first(&self, name: &str) -> Option<Element<'a>> {
        self.find(|element| element.is(name))
    }

    pub fn last(&self, name: &str) -> Option<Element<'a>> {
        self.all(name).pop()
    }
}

impl std::fmt::Debug for Element<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("name", &self.tag.name().as_utf8_str())
            .finish_non_exhaustive()
    }
}
