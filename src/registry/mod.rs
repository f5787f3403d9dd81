//! External registry collaborators: CNPJ lookup and product/NCM catalog.
//!
//! Providers return loosely-structured JSON whose shape varies; the
//! extraction here never trusts a single field name. Each logical field
//! is resolved by probing an ordered list of candidate accessor paths and
//! taking the first non-empty hit.

mod cnpj;
mod probe;
mod product;

use std::fmt;

pub use cnpj::{CnpjRecord, fetch_cnpj};
pub use probe::{probe, probe_str};
pub use product::{ProductRecord, fetch_by_gtin, fetch_ncm, search_products};

/// Typed failure of a registry call, derived from the provider's status.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum LookupError {
    /// The identifier was rejected before any network I/O.
    InvalidIdentifier(String),
    /// 404 — the code is unknown to the provider.
    NotFound,
    /// 401 — missing or invalid token.
    Unauthorized,
    /// 403 — the token lacks access.
    Forbidden,
    /// 429 — provider rate limit hit.
    RateLimited,
    /// Any other non-success HTTP status.
    Http(u16),
    /// Connection-level failure.
    Network(String),
    /// The response body could not be decoded.
    Decode(String),
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidIdentifier(e) => write!(f, "invalid identifier: {e}"),
            Self::NotFound => write!(f, "not found (404)"),
            Self::Unauthorized => write!(f, "missing or invalid token (401)"),
            Self::Forbidden => write!(f, "access denied (403)"),
            Self::RateLimited => write!(f, "rate limit exceeded (429)"),
            Self::Http(status) => write!(f, "lookup failed (HTTP {status})"),
            Self::Network(e) => write!(f, "network error: {e}"),
            Self::Decode(e) => write!(f, "decode error: {e}"),
        }
    }
}

impl std::error::Error for LookupError {}

pub(crate) fn status_error(status: u16) -> LookupError {
    match status {
        401 => LookupError::Unauthorized,
        403 => LookupError::Forbidden,
        404 => LookupError::NotFound,
        429 => LookupError::RateLimited,
        s => LookupError::Http(s),
    }
}
