//! Report flattening: documents → flat, filterable, paginated rows.
//!
//! A projection without line-item columns yields one row per document; a
//! projection with any line-item column explodes into one row per
//! (document, line item) pair, repeating the document-level values. A
//! document with zero line items contributes zero rows under an exploding
//! projection.

mod columns;

use rust_decimal::Decimal;

use crate::core::{FiscalDocument, LineItem};

pub use columns::{ColumnKey, ReportModel};

/// One flattened row: projected string values aligned with the
/// projection's column order. Regenerated on every flattening pass,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    values: Vec<(ColumnKey, String)>,
}

impl ReportRow {
    /// Value of a column, if the projection includes it.
    pub fn get(&self, key: ColumnKey) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Values in projection column order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(_, v)| v.as_str())
    }

    /// Case-insensitive substring match over any projected value.
    pub fn matches(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let needle = query.to_lowercase();
        self.values
            .iter()
            .any(|(_, v)| v.to_lowercase().contains(&needle))
    }
}

/// Flatten documents under a projection, preserving document order and,
/// within a document, line-item order.
pub fn flatten(documents: &[FiscalDocument], model: &ReportModel) -> Vec<ReportRow> {
    let columns = model.columns();
    let mut rows = Vec::new();
    for document in documents {
        if model.explodes() {
            for item in &document.line_items {
                rows.push(project(columns, document, Some(item)));
            }
        } else {
            rows.push(project(columns, document, None));
        }
    }
    rows
}

fn project(
    columns: &[ColumnKey],
    document: &FiscalDocument,
    item: Option<&LineItem>,
) -> ReportRow {
    ReportRow {
        values: columns
            .iter()
            .map(|key| (*key, cell(*key, document, item)))
            .collect(),
    }
}

fn cell(key: ColumnKey, d: &FiscalDocument, item: Option<&LineItem>) -> String {
    let icms = item.and_then(|i| i.taxes.icms.as_ref());
    match key {
        ColumnKey::Key => opt(d.identification.access_key.as_deref()),
        ColumnKey::EmissionDate => d
            .identification
            .issued_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_default(),
        ColumnKey::IssuerTaxId => opt(d.issuer.tax_id.as_ref().map(|t| t.digits())),
        ColumnKey::Issuer => opt(d.issuer.legal_name.as_deref()),
        ColumnKey::RecipientTaxId => opt(d.recipient.tax_id.as_ref().map(|t| t.digits())),
        ColumnKey::Recipient => opt(d.recipient.legal_name.as_deref()),
        ColumnKey::Number => opt(d.identification.number.as_deref()),
        ColumnKey::Value => dec(d.totals.grand_total),
        ColumnKey::ProductCode => opt(item.and_then(|i| i.code.as_deref())),
        ColumnKey::ProductName => opt(item.and_then(|i| i.description.as_deref())),
        ColumnKey::ProductQuantity => dec(item.and_then(|i| i.quantity)),
        ColumnKey::ProductUnitValue => dec(item.and_then(|i| i.unit_value)),
        ColumnKey::IcmsOrigin => opt(icms.and_then(|i| i.origin.as_deref())),
        ColumnKey::IcmsStatus => opt(icms.and_then(|i| i.status.as_ref().map(|s| s.code()))),
        ColumnKey::IcmsBaseModality => opt(icms.and_then(|i| i.base_modality.as_deref())),
        ColumnKey::IcmsBase => dec(icms.and_then(|i| i.base)),
        ColumnKey::IcmsRate => dec(icms.and_then(|i| i.rate)),
        ColumnKey::IcmsValue => dec(icms.and_then(|i| i.value)),
    }
}

fn opt(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

fn dec(value: Option<Decimal>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Filterable, paginated view over a flattened row set.
///
/// Changing the documents, the projection, or the query re-anchors the
/// page to 1; filtering always happens over the full flattened set,
/// before pagination.
#[derive(Debug, Clone)]
pub struct ReportView {
    model: ReportModel,
    rows: Vec<ReportRow>,
    query: String,
    page: usize,
    page_size: usize,
}

impl ReportView {
    pub fn new(model: ReportModel, page_size: usize) -> Self {
        Self {
            model,
            rows: Vec::new(),
            query: String::new(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn model(&self) -> &ReportModel {
        &self.model
    }

    /// Replace the underlying document set; re-flattens and resets to
    /// page 1.
    pub fn set_documents(&mut self, documents: &[FiscalDocument]) {
        self.rows = flatten(documents, &self.model);
        self.page = 1;
    }

    /// Switch projection; the caller re-supplies the documents since rows
    /// are projection-shaped.
    pub fn set_model(&mut self, model: ReportModel, documents: &[FiscalDocument]) {
        self.model = model;
        self.rows = flatten(documents, &self.model);
        self.page = 1;
    }

    /// Change the free-text filter; resets to page 1.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.page = 1;
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    /// Select a 1-based page, clamped to the available range.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.clamp(1, self.page_count().max(1));
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// The filtered (not paginated) row set.
    pub fn filtered(&self) -> Vec<&ReportRow> {
        self.rows.iter().filter(|r| r.matches(&self.query)).collect()
    }

    /// Rows of the current page — a contiguous slice of the filtered set.
    pub fn page_rows(&self) -> Vec<&ReportRow> {
        self.filtered()
            .into_iter()
            .skip((self.page - 1) * self.page_size)
            .take(self.page_size)
            .collect()
    }

    pub fn page_count(&self) -> usize {
        self.filtered().len().div_ceil(self.page_size)
    }

    /// Export the full filtered set (independent of the current page) as
    /// semicolon-separated CSV with the on-screen header labels.
    pub fn export_csv(&self) -> String {
        let mut out = String::new();
        for (i, key) in self.model.columns().iter().enumerate() {
            if i > 0 {
                out.push(';');
            }
            csv_field(&mut out, key.label());
        }
        out.push_str("\r\n");
        for row in self.filtered() {
            for (i, value) in row.values().enumerate() {
                if i > 0 {
                    out.push(';');
                }
                csv_field(&mut out, value);
            }
            out.push_str("\r\n");
        }
        out
    }
}

fn csv_field(out: &mut String, value: &str) {
    out.push('"');
    for ch in value.chars() {
        if ch == '"' {
            out.push_str("\"\"");
        } else {
            out.push(ch);
        }
    }
    out.push('"');
}
