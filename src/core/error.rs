use thiserror::Error;

/// Errors that can occur while normalizing, converting, or packaging
/// fiscal documents.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FiscalError {
    /// The XML input is malformed and no tree could be built.
    #[error("XML parse error: {0}")]
    Parse(String),

    /// The document contains neither an `infNFe` nor an `infCte` block.
    #[error("unrecognized document type: neither NFe nor CTe")]
    UnrecognizedDocumentType,

    /// The document claims a type but lacks a mandatory structural block.
    #[error("missing required structure: {0}")]
    MissingRequiredStructure(&'static str),

    /// More inputs were submitted than the batch accepts.
    #[error("batch limit exceeded: {count} inputs, maximum is {max}")]
    BatchLimitExceeded { count: usize, max: usize },

    /// A rendering adapter failed to produce output.
    #[error("rendering failed: {0}")]
    Render(String),

    /// Archive packaging was requested with zero successful artifacts.
    #[error("nothing to package: no successful artifacts")]
    NothingToPackage,

    /// Archive assembly failed.
    #[error("archive error: {0}")]
    Archive(String),

    /// An identifier (access key, CNPJ, CPF) has an invalid format.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}
