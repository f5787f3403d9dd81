//! Product catalog client: GTIN/EAN lookup, free-text search, NCM lookup.
//!
//! The NCM endpoint differs between provider accounts; `fetch_ncm` walks
//! an ordered candidate list, advancing on 404 and failing fast on
//! anything else.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::probe::probe_str;
use super::{LookupError, status_error};

const TOKEN_HEADER: &str = "X-Cosmos-Token";

/// Normalized product record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub gtin: Option<String>,
    pub description: Option<String>,
    pub ncm: Option<String>,
    pub brand: Option<String>,
}

impl ProductRecord {
    pub fn from_value(value: &Value) -> Self {
        Self {
            gtin: probe_str(value, &["gtin", "ean", "codigo_barras", "barcode"]),
            description: probe_str(value, &["description", "descricao", "nome", "name"]),
            ncm: probe_str(value, &["ncm.code", "ncm", "ncm_codigo"]),
            brand: probe_str(value, &["brand.name", "brand", "marca"]),
        }
    }
}

async fn get_json(url: &str, token: &str) -> Result<Value, LookupError> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(20))
        .build()
        .map_err(|e| LookupError::Network(e.to_string()))?;

    let resp = client
        .get(url)
        .header(TOKEN_HEADER, token)
        .send()
        .await
        .map_err(|e| LookupError::Network(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(status_error(status.as_u16()));
    }
    resp.json()
        .await
        .map_err(|e| LookupError::Decode(e.to_string()))
}

/// Look up a product by its GTIN/EAN.
pub async fn fetch_by_gtin(
    base_url: &str,
    token: &str,
    ean: &str,
) -> Result<ProductRecord, LookupError> {
    let ean = ean.trim();
    if ean.is_empty() || !ean.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LookupError::InvalidIdentifier(format!(
            "'{ean}' is not a valid GTIN/EAN"
        )));
    }
    let url = format!("{}/gtins/{ean}.json", base_url.trim_end_matches('/'));
    debug!(%url, "GTIN lookup");
    let value = get_json(&url, token).await?;
    Ok(ProductRecord::from_value(&value))
}

/// Free-text product search; returns the provider's raw result page
/// alongside the normalized records.
pub async fn search_products(
    base_url: &str,
    token: &str,
    query: &str,
    page: u32,
) -> Result<Vec<ProductRecord>, LookupError> {
    let url = format!(
        "{}/products.json?query={}&page={page}",
        base_url.trim_end_matches('/'),
        urlencode(query),
    );
    debug!(%url, "product search");
    let value = get_json(&url, token).await?;
    let items = value
        .get("products")
        .and_then(Value::as_array)
        .or_else(|| value.as_array())
        .cloned()
        .unwrap_or_default();
    Ok(items.iter().map(ProductRecord::from_value).collect())
}

/// Look up products under an NCM code, trying each known endpoint shape
/// in order. A 404 advances to the next candidate; any other failure is
/// final. All-404 resolves to [`LookupError::NotFound`].
pub async fn fetch_ncm(base_url: &str, token: &str, code: &str) -> Result<Value, LookupError> {
    let base = base_url.trim_end_matches('/');
    let encoded = urlencode(code);
    let candidates = [
        format!("{base}/ncms/{encoded}/products"),
        format!("{base}/retailers/ncms/{encoded}"),
        format!("{base}/ncms/{encoded}/products.json"),
    ];

    for url in &candidates {
        debug!(%url, "NCM lookup attempt");
        match get_json(url, token).await {
            Ok(value) => return Ok(value),
            Err(LookupError::NotFound) => {
                warn!(%url, "NCM endpoint 404, trying next");
                continue;
            }
            Err(e) => return Err(e),
        }
    }
    Err(LookupError::NotFound)
}

fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            b' ' => out.push_str("%20"),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}
