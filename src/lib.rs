//! # notafiscal
//!
//! Brazilian fiscal document library covering the processing lifecycle:
//! NFe/CTe XML normalization, DANFE PDF rendering, batch conversion with
//! archive packaging, tabular reporting, and registry lookups.
//!
//! The normalizer is deliberately tolerant: it is not an XSD validator and
//! never recomputes tax values — it extracts what the document declares,
//! degrading every missing optional field to an explicit `None`. All
//! monetary values use [`rust_decimal::Decimal`] — never floating point.
//!
//! ## Quick Start
//!
//! ```rust
//! # #[cfg(feature = "xml")]
//! # {
//! let xml = r#"
//! <nfeProc>
//!   <NFe><infNFe Id="NFe35200714200166000187550010000000046550000004">
//!     <ide><nNF>4</nNF><serie>1</serie><natOp>VENDA</natOp></ide>
//!     <emit><CNPJ>14200166000187</CNPJ><xNome>ACME LTDA</xNome></emit>
//!     <dest><CPF>52998224725</CPF><xNome>Fulano</xNome></dest>
//!     <total><ICMSTot><vNF>150.00</vNF></ICMSTot></total>
//!   </infNFe></NFe>
//! </nfeProc>"#;
//!
//! let document = notafiscal::xml::normalize(xml).unwrap();
//! assert_eq!(document.identification.number.as_deref(), Some("4"));
//! assert_eq!(document.issuer.legal_name.as_deref(), Some("ACME LTDA"));
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Document model, tax variants, identifier validation |
//! | `xml` | NFe/CTe XML parsing and normalization |
//! | `danfe` | DANFE PDF layout & CODE-128C barcode |
//! | `batch` | Parallel batch conversion & ZIP packaging |
//! | `report` | Report projections, flattening, filtering, CSV export |
//! | `registry` | CNPJ / product / NCM lookup clients |
//! | `store` | Append-only operation logs over a key-value store |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "xml")]
pub mod xml;

#[cfg(feature = "danfe")]
pub mod danfe;

#[cfg(feature = "batch")]
pub mod batch;

#[cfg(feature = "report")]
pub mod report;

#[cfg(feature = "registry")]
pub mod registry;

#[cfg(feature = "store")]
pub mod store;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
