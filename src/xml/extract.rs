//! Field-extraction primitives.
//!
//! Absence is a normal, first-class result here: every lookup takes an
//! `Option<&Element>` and returns `None` for a missing node, a missing
//! tag, or unparseable content. None of these functions can fail.

use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;

use super::dom::Element;

/// First descendant element with the given tag, or `None`.
pub fn child_of<'a>(node: Option<&'a Element>, tag: &str) -> Option<&'a Element> {
    node?.descendant(tag)
}

/// Trimmed text of the first matching descendant, or `None`.
pub fn text_of(node: Option<&Element>, tag: &str) -> Option<String> {
    child_of(node, tag)?.text().map(str::to_string)
}

/// Decimal value of the first matching descendant; unparseable → `None`.
pub fn decimal_of(node: Option<&Element>, tag: &str) -> Option<Decimal> {
    text_of(node, tag)?.parse().ok()
}

/// `YYYY-MM-DD` date of the first matching descendant.
pub fn date_of(node: Option<&Element>, tag: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&text_of(node, tag)?, "%Y-%m-%d").ok()
}

/// RFC 3339 timestamp of the first matching descendant (NFe carries
/// offsets, e.g. `2024-06-15T10:30:00-03:00`).
pub fn datetime_of(node: Option<&Element>, tag: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(&text_of(node, tag)?).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlTree;
    use rust_decimal_macros::dec;

    fn tree() -> XmlTree {
        XmlTree::parse(
            "<r><a><v>1.50</v><d>2024-06-15</d><t>2024-06-15T10:30:00-03:00</t><bad>x</bad></a></r>",
        )
        .unwrap()
    }

    #[test]
    fn absence_is_none_not_a_failure() {
        let t = tree();
        let a = t.descendant("a");
        assert_eq!(text_of(None, "v"), None);
        assert_eq!(text_of(a, "missing"), None);
        assert!(child_of(None, "v").is_none());
    }

    #[test]
    fn typed_lookups() {
        let t = tree();
        let a = t.descendant("a");
        assert_eq!(decimal_of(a, "v"), Some(dec!(1.50)));
        assert_eq!(decimal_of(a, "bad"), None);
        assert_eq!(
            date_of(a, "d"),
            NaiveDate::from_ymd_opt(2024, 6, 15)
        );
        assert!(datetime_of(a, "t").is_some());
        assert_eq!(datetime_of(a, "d"), None);
    }
}
