//! NFe/CTe XML parsing and normalization.
//!
//! Two layers: the field-extraction primitives over a parsed tree
//! ([`extract`]), and the [`normalize`] function composing them into the
//! canonical [`FiscalDocument`](crate::core::FiscalDocument).
//!
//! # Example
//!
//! ```no_run
//! use notafiscal::xml::normalize;
//!
//! let xml = std::fs::read_to_string("nota.xml").unwrap();
//! let document = normalize(&xml).unwrap();
//! println!("{:?}", document.identification.access_key);
//! ```

mod dom;
pub mod extract;
mod normalize;

pub use dom::{Element, XmlTree};
pub use normalize::normalize;
