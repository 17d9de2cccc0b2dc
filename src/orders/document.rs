//! Document queries the extractor needs, kept apart from the HTML library.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

/// Table rows the extractor looks for in an order notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRole {
    /// One purchased product.
    OrderItem,
    /// The order subtotal.
    Subtotal,
    /// The discount applied to the order.
    Discount,
}

impl RowRole {
    /// CSS class the gateway puts on rows of this role.
    pub fn class_name(self) -> &'static str {
        match self {
            Self::OrderItem => "order_item",
            Self::Subtotal => "order-totals-subtotal",
            Self::Discount => "order-totals-discount",
        }
    }
}

/// Capability-oriented view of a parsed notification.
pub trait OrderDocument {
    /// Cell texts of every row with the given role, in document order.
    fn rows_by_role(&self, role: RowRole) -> Vec<Vec<String>>;

    /// Text of the first paragraph whose sole text node matches `pattern`.
    ///
    /// Paragraphs with mixed content (text beside markup) are never
    /// candidates, even when their combined text would match.
    fn first_paragraph_matching(&self, pattern: &Regex) -> Option<String>;
}

/// [`OrderDocument`] over an HTML tree parsed with `scraper`.
pub struct HtmlOrderDocument {
    html: Html,
}

fn paragraph_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("p").expect("invalid p selector"))
}

fn cell_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("td").expect("invalid td selector"))
}

fn row_selector(role: RowRole) -> &'static Selector {
    static ITEM: OnceLock<Selector> = OnceLock::new();
    static SUBTOTAL: OnceLock<Selector> = OnceLock::new();
    static DISCOUNT: OnceLock<Selector> = OnceLock::new();
    let slot = match role {
        RowRole::OrderItem => &ITEM,
        RowRole::Subtotal => &SUBTOTAL,
        RowRole::Discount => &DISCOUNT,
    };
    slot.get_or_init(|| {
        Selector::parse(&format!("tr.{}", role.class_name())).expect("invalid row selector")
    })
}

/// Cell text with every text fragment trimmed and the pieces joined
/// without a separator.
fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// The only text node of `element`, looking through wrappers that have a
/// single child themselves. `None` for mixed or empty content.
fn sole_text(element: ElementRef<'_>) -> Option<String> {
    let mut children = element.children();
    let child = children.next()?;
    if children.next().is_some() {
        return None;
    }
    match child.value() {
        Node::Text(text) => Some(text.text.to_string()),
        Node::Element(_) => ElementRef::wrap(child).and_then(sole_text),
        _ => None,
    }
}

impl HtmlOrderDocument {
    /// Parse a document. Malformed markup is repaired, never rejected.
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }
}

impl OrderDocument for HtmlOrderDocument {
    fn rows_by_role(&self, role: RowRole) -> Vec<Vec<String>> {
        self.html
            .select(row_selector(role))
            .map(|row| row.select(cell_selector()).map(stripped_text).collect())
            .collect()
    }

    fn first_paragraph_matching(&self, pattern: &Regex) -> Option<String> {
        self.html
            .select(paragraph_selector())
            .filter_map(sole_text)
            .find(|text| pattern.is_match(text))
    }
}
