//! DANFE renderer output checks.

#![cfg(feature = "danfe")]

use notafiscal::core::{DocumentType, FiscalDocument, LineItem, RenderAdapter};
use notafiscal::danfe::{DanfeRenderer, barcode_svg, bars};
use rust_decimal_macros::dec;

const KEY: &str = "35240814200166000187550010000012341000012345";

fn sample_document(items: usize) -> FiscalDocument {
    let mut doc = FiscalDocument::new(DocumentType::Nfe);
    doc.identification.access_key = Some(KEY.into());
    doc.identification.number = Some("1234".into());
    doc.identification.series = Some("1".into());
    doc.identification.operation_nature = Some("VENDA".into());
    doc.issuer.legal_name = Some("ACME COMÉRCIO LTDA".into());
    doc.recipient.legal_name = Some("CLIENTE SA".into());
    doc.totals.grand_total = Some(dec!(125.00));
    doc.line_items = (0..items)
        .map(|i| LineItem {
            number: Some(i as u32 + 1),
            code: Some(format!("P{i:03}")),
            description: Some(format!("PRODUTO {i}")),
            quantity: Some(dec!(1)),
            unit_value: Some(dec!(10)),
            total: Some(dec!(10)),
            ..LineItem::default()
        })
        .collect();
    doc
}

#[test]
fn renders_a_pdf() {
    let pdf = DanfeRenderer::new().render(&sample_document(2)).unwrap();
    assert!(pdf.starts_with(b"%PDF-"));
    assert!(pdf.len() > 500);
}

#[test]
fn rendering_is_deterministic() {
    let doc = sample_document(3);
    let renderer = DanfeRenderer::new();
    assert_eq!(renderer.render(&doc).unwrap(), renderer.render(&doc).unwrap());
}

#[test]
fn long_item_lists_paginate() {
    let one_page = DanfeRenderer::new().render(&sample_document(5)).unwrap();
    let three_pages = DanfeRenderer::new().render(&sample_document(70)).unwrap();
    assert!(contains(&one_page, b"/Count 1"));
    assert!(contains(&three_pages, b"/Count 3"));
}

#[test]
fn renders_even_a_bare_document() {
    // Nothing declared at all — blanks everywhere, but still a PDF.
    let doc = FiscalDocument::new(DocumentType::Nfe);
    let pdf = DanfeRenderer::new().render(&doc).unwrap();
    assert!(pdf.starts_with(b"%PDF-"));
}

#[test]
fn barcode_is_an_svg_of_the_key() {
    let svg = DanfeRenderer::new().barcode(KEY).unwrap();
    let text = String::from_utf8(svg).unwrap();
    assert!(text.starts_with("<svg"));
    // start + 22 pairs + checksum symbols, 3 bars each, plus stop (4 bars).
    assert_eq!(text.matches("fill=\"#000000\"").count(), 24 * 3 + 4);
}

#[test]
fn barcode_rejects_non_key_input() {
    assert!(barcode_svg("hello").is_err());
    assert!(barcode_svg(&"1".repeat(43)).is_err());
}

#[test]
fn bar_geometry_is_eleven_modules_per_symbol() {
    let geometry = bars(KEY).unwrap();
    // start + 22 data + checksum = 24 symbols of 11 modules, stop = 13.
    assert_eq!(geometry.modules, 24 * 11 + 13);
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
