//! Owned element tree over a quick-xml event stream.
//!
//! The extractor contract needs first-matching-descendant lookups from
//! arbitrary nodes, so the event stream is materialized into a small tree
//! once per document instead of being replayed per field. Namespace
//! prefixes are stripped; NFe documents address elements by local name.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::core::FiscalError;

/// One XML element: local name, attributes, accumulated text, children.
#[derive(Debug, Clone)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    /// Local (prefix-stripped) element name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute value by local name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Trimmed text content of this element, or `None` when empty.
    pub fn text(&self) -> Option<&str> {
        let t = self.text.trim();
        (!t.is_empty()).then_some(t)
    }

    /// Direct children in document order.
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// First descendant (depth-first, document order) with the given
    /// local name. The element itself is not considered.
    pub fn descendant(&self, tag: &str) -> Option<&Element> {
        for child in &self.children {
            if child.name == tag {
                return Some(child);
            }
            if let Some(found) = child.descendant(tag) {
                return Some(found);
            }
        }
        None
    }

    /// Every descendant with the given local name, document order.
    pub fn descendants<'a>(&'a self, tag: &str, out: &mut Vec<&'a Element>) {
        for child in &self.children {
            if child.name == tag {
                out.push(child);
            }
            child.descendants(tag, out);
        }
    }
}

/// A parsed document.
#[derive(Debug, Clone)]
pub struct XmlTree {
    root: Element,
}

impl XmlTree {
    /// Build a tree from an XML string. Malformed input (reader errors,
    /// unclosed elements, no root) fails with [`FiscalError::Parse`].
    pub fn parse(xml: &str) -> Result<Self, FiscalError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => stack.push(element_from(e)?),
                Ok(Event::Empty(ref e)) => {
                    let el = element_from(e)?;
                    attach(&mut stack, &mut root, el)?;
                }
                Ok(Event::Text(ref t)) => {
                    if let Some(top) = stack.last_mut() {
                        let text = t
                            .unescape()
                            .map_err(|e| FiscalError::Parse(e.to_string()))?;
                        top.text.push_str(&text);
                    }
                }
                Ok(Event::CData(ref c)) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&String::from_utf8_lossy(c));
                    }
                }
                Ok(Event::End(_)) => {
                    let el = stack
                        .pop()
                        .ok_or_else(|| FiscalError::Parse("unbalanced end tag".into()))?;
                    attach(&mut stack, &mut root, el)?;
                }
                Ok(Event::Eof) => break,
                Ok(_) => {} // declaration, comments, PIs, doctype
                Err(e) => return Err(FiscalError::Parse(e.to_string())),
            }
        }

        if !stack.is_empty() {
            return Err(FiscalError::Parse("unexpected end of document".into()));
        }
        match root {
            Some(root) => Ok(Self { root }),
            None => Err(FiscalError::Parse("no root element".into())),
        }
    }

    /// The document root.
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// First element with the given local name, root included.
    pub fn descendant(&self, tag: &str) -> Option<&Element> {
        if self.root.name == tag {
            return Some(&self.root);
        }
        self.root.descendant(tag)
    }
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    el: Element,
) -> Result<(), FiscalError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(el);
        Ok(())
    } else if root.is_none() {
        *root = Some(el);
        Ok(())
    } else {
        Err(FiscalError::Parse("multiple root elements".into()))
    }
}

fn element_from(start: &BytesStart<'_>) -> Result<Element, FiscalError> {
    let name = local_name(
        std::str::from_utf8(start.name().as_ref())
            .map_err(|e| FiscalError::Parse(e.to_string()))?,
    );
    let mut attributes = Vec::new();
    for attr in start.attributes().flatten() {
        let key = local_name(std::str::from_utf8(attr.key.as_ref()).unwrap_or(""));
        let value = attr
            .unescape_value()
            .map_err(|e| FiscalError::Parse(e.to_string()))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        name,
        attributes,
        text: String::new(),
        children: Vec::new(),
    })
}

fn local_name(qname: &str) -> String {
    qname.rsplit(':').next().unwrap_or(qname).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_tree_and_finds_descendants() {
        let tree = XmlTree::parse("<a><b><c>x</c></b><c>y</c></a>").unwrap();
        assert_eq!(tree.root().name(), "a");
        // Depth-first: the nested <c> comes before the sibling one.
        assert_eq!(tree.descendant("c").unwrap().text(), Some("x"));
        let mut all = Vec::new();
        tree.root().descendants("c", &mut all);
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].text(), Some("y"));
    }

    #[test]
    fn strips_namespace_prefixes() {
        let tree =
            XmlTree::parse(r#"<ns:doc xmlns:ns="urn:x"><ns:item ns:id="7">v</ns:item></ns:doc>"#)
                .unwrap();
        let item = tree.descendant("item").unwrap();
        assert_eq!(item.attribute("id"), Some("7"));
        assert_eq!(item.text(), Some("v"));
    }

    #[test]
    fn unclosed_element_is_a_parse_error() {
        let err = XmlTree::parse("<NFe><infNFe>").unwrap_err();
        assert!(matches!(err, FiscalError::Parse(_)));
    }

    #[test]
    fn empty_input_is_a_parse_error() {
        assert!(matches!(
            XmlTree::parse("   ").unwrap_err(),
            FiscalError::Parse(_)
        ));
    }

    #[test]
    fn self_closing_elements_attach() {
        let tree = XmlTree::parse(r#"<a><b v="1"/></a>"#).unwrap();
        assert_eq!(tree.descendant("b").unwrap().attribute("v"), Some("1"));
    }
}
