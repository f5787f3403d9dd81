//! Flattening engine: explosion, ordering, filtering, pagination, export.

#![cfg(feature = "report")]

use chrono::DateTime;
use notafiscal::core::*;
use notafiscal::report::{ColumnKey, ReportModel, ReportView, flatten};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn item(code: &str, description: &str) -> LineItem {
    LineItem {
        code: Some(code.into()),
        description: Some(description.into()),
        quantity: Some(dec!(1)),
        unit_value: Some(dec!(10)),
        taxes: LineTaxes {
            icms: Some(IcmsDetail {
                variant: "ICMS00".into(),
                origin: Some("0".into()),
                status: Some(TaxStatus::Cst("00".into())),
                base_modality: Some("3".into()),
                base: Some(dec!(10)),
                rate: Some(dec!(18)),
                value: Some(dec!(1.80)),
            }),
            ..LineTaxes::default()
        },
        ..LineItem::default()
    }
}

fn document(key: &str, total: Decimal, items: Vec<LineItem>) -> FiscalDocument {
    let mut doc = FiscalDocument::new(DocumentType::Nfe);
    doc.identification.access_key = Some(key.into());
    doc.identification.number = Some("1".into());
    doc.identification.issued_at =
        DateTime::parse_from_rfc3339("2024-08-15T10:30:00-03:00").ok();
    doc.issuer.legal_name = Some("ACME".into());
    doc.recipient.legal_name = Some("CLIENTE".into());
    doc.totals.grand_total = Some(total);
    doc.line_items = items;
    doc
}

#[test]
fn non_exploding_projection_is_one_row_per_document() {
    let docs = vec![
        document("A", dec!(100), vec![item("1", "x"), item("2", "y")]),
        document("B", dec!(200), vec![]),
    ];
    let rows = flatten(&docs, &ReportModel::NfeParties);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get(ColumnKey::Key), Some("A"));
    assert_eq!(rows[1].get(ColumnKey::Key), Some("B"));
}

#[test]
fn exploding_projection_preserves_item_and_document_order() {
    let docs = vec![
        document("D1", dec!(10), vec![item("A", "a"), item("B", "b"), item("C", "c")]),
        document("D2", dec!(20), vec![item("D", "d")]),
    ];
    let rows = flatten(&docs, &ReportModel::NfeProducts);
    let codes: Vec<_> = rows
        .iter()
        .map(|r| r.get(ColumnKey::ProductCode).unwrap())
        .collect();
    assert_eq!(codes, ["A", "B", "C", "D"]);
    // Document-level values repeat across the document's rows.
    assert!(rows[..3].iter().all(|r| r.get(ColumnKey::Key) == Some("D1")));
    assert_eq!(rows[3].get(ColumnKey::Key), Some("D2"));
}

#[test]
fn zero_item_document_contributes_zero_rows_when_exploding() {
    let docs = vec![document("EMPTY", dec!(1), vec![])];
    assert!(flatten(&docs, &ReportModel::NfeProducts).is_empty());
    assert_eq!(flatten(&docs, &ReportModel::NfeParties).len(), 1);
}

#[test]
fn icms_projection_carries_the_tax_columns() {
    let docs = vec![document("K", dec!(10), vec![item("P", "prod")])];
    let rows = flatten(&docs, &ReportModel::NfeProductsIcms);
    assert_eq!(rows[0].get(ColumnKey::IcmsStatus), Some("00"));
    assert_eq!(rows[0].get(ColumnKey::IcmsBase), Some("10"));
    assert_eq!(rows[0].get(ColumnKey::IcmsRate), Some("18"));
    assert_eq!(rows[0].get(ColumnKey::IcmsValue), Some("1.80"));
}

fn key_value_view(pairs: &[(&str, Decimal)]) -> ReportView {
    let docs: Vec<_> = pairs
        .iter()
        .map(|(k, v)| document(k, *v, vec![]))
        .collect();
    let mut view = ReportView::new(
        ReportModel::Custom(vec![ColumnKey::Key, ColumnKey::Value]),
        10,
    );
    view.set_documents(&docs);
    view
}

#[test]
fn filter_matches_any_projected_column_value() {
    let mut view = key_value_view(&[("A", dec!(100)), ("B", dec!(200))]);
    view.set_query("100");
    let filtered = view.filtered();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].get(ColumnKey::Key), Some("A"));

    // Case-insensitive, and matches the key column too.
    view.set_query("b");
    let filtered = view.filtered();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].get(ColumnKey::Key), Some("B"));
}

#[test]
fn pagination_slices_the_filtered_set() {
    let pairs: Vec<(String, Decimal)> = (0..25)
        .map(|i| (format!("K{i:02}"), Decimal::from(i)))
        .collect();
    let borrowed: Vec<(&str, Decimal)> =
        pairs.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    let mut view = key_value_view(&borrowed);

    assert_eq!(view.page_count(), 3);
    view.set_page(3);
    let page = view.page_rows();
    assert_eq!(page.len(), 5);
    assert_eq!(page[0].get(ColumnKey::Key), Some("K20"));
    assert_eq!(page[4].get(ColumnKey::Key), Some("K24"));
}

#[test]
fn page_reanchors_on_query_model_and_document_changes() {
    let pairs: Vec<(String, Decimal)> = (0..25)
        .map(|i| (format!("K{i:02}"), Decimal::from(i)))
        .collect();
    let borrowed: Vec<(&str, Decimal)> =
        pairs.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    let mut view = key_value_view(&borrowed);

    view.set_page(3);
    assert_eq!(view.page(), 3);

    view.set_query("K0");
    assert_eq!(view.page(), 1);

    view.set_page(1);
    let docs = vec![document("X", dec!(1), vec![])];
    view.set_model(ReportModel::NfeParties, &docs);
    assert_eq!(view.page(), 1);

    // Out-of-range selection clamps instead of going blank.
    view.set_page(99);
    assert_eq!(view.page(), view.page_count().max(1));
}

#[test]
fn export_covers_the_filtered_set_not_the_page() {
    let pairs: Vec<(String, Decimal)> = (0..25)
        .map(|i| (format!("K{i:02}"), Decimal::from(100 + i)))
        .collect();
    let borrowed: Vec<(&str, Decimal)> =
        pairs.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    let mut view = key_value_view(&borrowed);
    view.set_page(2);

    let csv = view.export_csv();
    let lines: Vec<_> = csv.trim_end().split("\r\n").collect();
    // Header + all 25 filtered rows, not just the 10 on the current page.
    assert_eq!(lines.len(), 26);
    assert_eq!(lines[0], "\"Chave\";\"Valor\"");
    assert_eq!(lines[1], "\"K00\";\"100\"");
    assert_eq!(lines[25], "\"K24\";\"124\"");
}

#[test]
fn export_escapes_embedded_quotes() {
    let mut doc = document("K", dec!(1), vec![]);
    doc.issuer.legal_name = Some(r#"ACME "PREMIUM" SA"#.into());
    let mut view = ReportView::new(
        ReportModel::Custom(vec![ColumnKey::Issuer]),
        10,
    );
    view.set_documents(&[doc]);
    let csv = view.export_csv();
    assert!(csv.contains(r#""ACME ""PREMIUM"" SA""#));
}
