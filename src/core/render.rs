use super::error::FiscalError;
use super::types::FiscalDocument;

/// Rendering collaborator consumed by the batch pipeline.
///
/// `render` must be deterministic for a given document and layout, and
/// `barcode` is a pure function of the digit string — it depends on no
/// document semantics beyond the 44 digits themselves.
pub trait RenderAdapter: Send + Sync {
    /// Produce the printable DANFE as PDF bytes.
    fn render(&self, document: &FiscalDocument) -> Result<Vec<u8>, FiscalError>;

    /// Produce a barcode image of the access key.
    fn barcode(&self, access_key: &str) -> Result<Vec<u8>, FiscalError>;
}
