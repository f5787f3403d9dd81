//! DANFE rendering — the fixed-layout printable representation of an NFe.
//!
//! Builds an A4 PDF from scratch with lopdf: issuer header, access-key
//! box with CODE-128C bars, recipient, items table (paginated), totals
//! grid, transport block, additional information. Output is
//! deterministic for a given document.

mod barcode;

use lopdf::content::{Content, Operation};
use lopdf::{Document as Pdf, Object, Stream, dictionary};
use rust_decimal::Decimal;

use crate::core::{FiscalDocument, FiscalError, LineItem, RenderAdapter, TaxId};

pub use barcode::{Bar, BarGeometry, barcode_svg, bars};

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 28.0;

/// Item rows on the first page (shared with header/totals/transport)
/// and on continuation pages.
const FIRST_PAGE_ROWS: usize = 18;
const CONT_PAGE_ROWS: usize = 40;

/// Renders [`FiscalDocument`]s into DANFE PDFs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DanfeRenderer;

impl DanfeRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl RenderAdapter for DanfeRenderer {
    fn render(&self, document: &FiscalDocument) -> Result<Vec<u8>, FiscalError> {
        render_danfe(document)
    }

    fn barcode(&self, access_key: &str) -> Result<Vec<u8>, FiscalError> {
        barcode_svg(access_key)
    }
}

/// Build the DANFE PDF for a normalized document.
pub fn render_danfe(document: &FiscalDocument) -> Result<Vec<u8>, FiscalError> {
    let mut pdf = Pdf::with_version("1.5");
    let pages_id = pdf.new_object_id();

    let font_regular = pdf.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let font_bold = pdf.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });

    let chunks = paginate(&document.line_items);
    let total_pages = chunks.len();
    let mut page_ids = Vec::with_capacity(total_pages);

    for (index, chunk) in chunks.iter().enumerate() {
        let ops = if index == 0 {
            first_page(document, chunk, index + 1, total_pages)
        } else {
            continuation_page(document, chunk, index + 1, total_pages)
        };
        let content = Content { operations: ops };
        let encoded = content
            .encode()
            .map_err(|e| FiscalError::Render(e.to_string()))?;
        let content_id = pdf.add_object(Stream::new(dictionary! {}, encoded));

        let page_id = pdf.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(PAGE_WIDTH),
                Object::Real(PAGE_HEIGHT),
            ],
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "Font" => dictionary! {
                    "F1" => Object::Reference(font_regular),
                    "F2" => Object::Reference(font_bold),
                },
            },
        });
        page_ids.push(Object::Reference(page_id));
    }

    let page_count = page_ids.len() as i64;
    pdf.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids,
            "Count" => page_count,
        }),
    );
    let catalog_id = pdf.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    pdf.trailer.set("Root", Object::Reference(catalog_id));
    pdf.compress();

    let mut out = Vec::new();
    pdf.save_to(&mut out)
        .map_err(|e| FiscalError::Render(e.to_string()))?;
    Ok(out)
}

fn paginate(items: &[LineItem]) -> Vec<&[LineItem]> {
    if items.len() <= FIRST_PAGE_ROWS {
        return vec![items];
    }
    let mut chunks = vec![&items[..FIRST_PAGE_ROWS]];
    chunks.extend(items[FIRST_PAGE_ROWS..].chunks(CONT_PAGE_ROWS));
    chunks
}

// ---------------------------------------------------------------------------
// Page composition
// ---------------------------------------------------------------------------

fn first_page(
    document: &FiscalDocument,
    items: &[LineItem],
    page: usize,
    total: usize,
) -> Vec<Operation> {
    let mut c = Canvas::new();
    let d = document;
    let right = PAGE_WIDTH - MARGIN;
    let mut y = PAGE_HEIGHT - MARGIN;

    // --- Issuer header + DANFE box ---
    c.stroke_rect(MARGIN, y - 70.0, right - MARGIN, 70.0);
    c.vline(MARGIN + 250.0, y - 70.0, 70.0);
    c.vline(MARGIN + 330.0, y - 70.0, 70.0);

    c.bold(MARGIN + 6.0, y - 16.0, 9.0, d.issuer.legal_name.as_deref().unwrap_or(""));
    let issuer_addr = format_address(d);
    c.text(MARGIN + 6.0, y - 28.0, 7.0, &issuer_addr.0);
    c.text(MARGIN + 6.0, y - 38.0, 7.0, &issuer_addr.1);
    if let Some(phone) = &d.issuer.address.phone {
        c.text(MARGIN + 6.0, y - 48.0, 7.0, &format!("Fone: {phone}"));
    }

    c.bold(MARGIN + 262.0, y - 16.0, 12.0, "DANFE");
    c.text(MARGIN + 256.0, y - 28.0, 5.5, "Documento Auxiliar da");
    c.text(MARGIN + 256.0, y - 36.0, 5.5, "Nota Fiscal Eletrônica");
    let direction = match d.identification.operation_type.as_deref() {
        Some("0") => "0 - ENTRADA",
        Some("1") => "1 - SAÍDA",
        _ => "",
    };
    c.text(MARGIN + 256.0, y - 48.0, 6.5, direction);
    c.bold(
        MARGIN + 256.0,
        y - 60.0,
        7.0,
        &format!(
            "Nº {}  Série {}  Folha {page}/{total}",
            d.identification.number.as_deref().unwrap_or("-"),
            d.identification.series.as_deref().unwrap_or("-"),
        ),
    );

    // Access key + barcode
    if let Some(key) = &d.identification.access_key {
        if let Ok(geometry) = bars(key) {
            draw_bars(&mut c, &geometry, MARGIN + 338.0, y - 34.0, right - MARGIN - 344.0, 28.0);
        }
        c.text(MARGIN + 338.0, y - 46.0, 5.5, "CHAVE DE ACESSO");
        c.text(MARGIN + 338.0, y - 55.0, 6.5, &spaced_key(key));
    }
    y -= 70.0;

    // --- Operation nature + protocol ---
    c.stroke_rect(MARGIN, y - 22.0, right - MARGIN, 22.0);
    c.vline(MARGIN + 330.0, y - 22.0, 22.0);
    c.label_value(
        MARGIN + 4.0,
        y,
        "NATUREZA DA OPERAÇÃO",
        d.identification.operation_nature.as_deref().unwrap_or(""),
    );
    let protocol_line = d
        .protocol
        .as_ref()
        .map(|p| {
            format!(
                "{} - {}",
                p.number.as_deref().unwrap_or(""),
                p.received_at
                    .map(|t| t.format("%d/%m/%Y %H:%M:%S").to_string())
                    .unwrap_or_default(),
            )
        })
        .unwrap_or_default();
    c.label_value(
        MARGIN + 334.0,
        y,
        "PROTOCOLO DE AUTORIZAÇÃO DE USO",
        &protocol_line,
    );
    y -= 22.0;

    // --- Recipient ---
    c.bold(MARGIN, y - 10.0, 7.0, "DESTINATÁRIO / REMETENTE");
    y -= 14.0;
    c.stroke_rect(MARGIN, y - 34.0, right - MARGIN, 34.0);
    c.label_value(
        MARGIN + 4.0,
        y,
        "NOME / RAZÃO SOCIAL",
        d.recipient.legal_name.as_deref().unwrap_or(""),
    );
    c.label_value(
        MARGIN + 340.0,
        y,
        "CNPJ / CPF",
        &tax_id_text(&d.recipient.tax_id),
    );
    c.label_value(
        MARGIN + 470.0,
        y,
        "DATA DA EMISSÃO",
        &d.identification
            .issued_at
            .map(|t| t.format("%d/%m/%Y").to_string())
            .unwrap_or_default(),
    );
    let addr = &d.recipient.address;
    c.label_value(
        MARGIN + 4.0,
        y - 17.0,
        "ENDEREÇO",
        &join_nonempty(&[
            addr.street.as_deref(),
            addr.number.as_deref(),
            addr.district.as_deref(),
        ]),
    );
    c.label_value(
        MARGIN + 340.0,
        y - 17.0,
        "MUNICÍPIO / UF",
        &join_nonempty(&[addr.municipality.as_deref(), addr.state.as_deref()]),
    );
    c.label_value(
        MARGIN + 470.0,
        y - 17.0,
        "CEP",
        addr.postal_code.as_deref().unwrap_or(""),
    );
    y -= 34.0;

    // --- Billing installments ---
    if !d.billing.installments.is_empty() {
        c.bold(MARGIN, y - 10.0, 7.0, "FATURA / DUPLICATAS");
        y -= 14.0;
        c.stroke_rect(MARGIN, y - 16.0, right - MARGIN, 16.0);
        let mut x = MARGIN + 4.0;
        for dup in d.billing.installments.iter().take(6) {
            c.text(
                x,
                y - 11.0,
                6.5,
                &format!(
                    "{} venc. {} R$ {}",
                    dup.number.as_deref().unwrap_or("-"),
                    dup.due_date
                        .map(|dt| dt.format("%d/%m/%Y").to_string())
                        .unwrap_or_default(),
                    money(dup.value),
                ),
            );
            x += 90.0;
        }
        y -= 16.0;
    }

    // --- Totals grid ---
    c.bold(MARGIN, y - 10.0, 7.0, "CÁLCULO DO IMPOSTO");
    y -= 14.0;
    let t = &d.totals;
    let row1: [(&str, Option<Decimal>); 5] = [
        ("BASE DE CÁLC. DO ICMS", t.tax_base),
        ("VALOR DO ICMS", t.tax_value),
        ("BASE DE CÁLC. ICMS S.T.", t.st_base),
        ("VALOR DO ICMS SUBST.", t.st_value),
        ("V. TOTAL PRODUTOS", t.products_value),
    ];
    let row2: [(&str, Option<Decimal>); 5] = [
        ("VALOR DO FRETE", t.freight),
        ("VALOR DO SEGURO", t.insurance),
        ("DESCONTO", t.discount),
        ("OUTRAS DESPESAS", t.other_expenses),
        ("V. TOTAL DA NOTA", t.grand_total),
    ];
    y = totals_row(&mut c, y, &row1);
    y = totals_row(&mut c, y, &row2);

    // --- Transport ---
    c.bold(MARGIN, y - 10.0, 7.0, "TRANSPORTADOR / VOLUMES TRANSPORTADOS");
    y -= 14.0;
    c.stroke_rect(MARGIN, y - 17.0, right - MARGIN, 17.0);
    let tr = &d.transport;
    c.label_value(
        MARGIN + 4.0,
        y,
        "RAZÃO SOCIAL",
        tr.carrier.name.as_deref().unwrap_or(""),
    );
    c.label_value(
        MARGIN + 230.0,
        y,
        "FRETE POR CONTA",
        freight_mode_text(tr.freight_mode.as_deref()),
    );
    c.label_value(
        MARGIN + 330.0,
        y,
        "PLACA",
        &join_nonempty(&[tr.vehicle.plate.as_deref(), tr.vehicle.state.as_deref()]),
    );
    c.label_value(
        MARGIN + 440.0,
        y,
        "CNPJ / CPF",
        &tax_id_text(&tr.carrier.tax_id),
    );
    y -= 17.0;
    if let Some(vol) = tr.volumes.first() {
        c.stroke_rect(MARGIN, y - 17.0, right - MARGIN, 17.0);
        c.label_value(MARGIN + 4.0, y, "QUANTIDADE", &money(vol.quantity));
        c.label_value(MARGIN + 110.0, y, "ESPÉCIE", vol.kind.as_deref().unwrap_or(""));
        c.label_value(MARGIN + 220.0, y, "MARCA", vol.brand.as_deref().unwrap_or(""));
        c.label_value(MARGIN + 330.0, y, "PESO LÍQUIDO", &money(vol.net_weight));
        c.label_value(MARGIN + 440.0, y, "PESO BRUTO", &money(vol.gross_weight));
        y -= 17.0;
    }

    // --- Items ---
    y = items_table(&mut c, y, items);

    // --- Additional info ---
    c.bold(MARGIN, y - 10.0, 7.0, "DADOS ADICIONAIS");
    y -= 14.0;
    c.stroke_rect(MARGIN, y - 40.0, right - MARGIN, 40.0);
    if let Some(info) = &d.additional_info.complement {
        for (i, line) in wrap(info, 110).into_iter().take(4).enumerate() {
            c.text(MARGIN + 4.0, y - 10.0 - (i as f32) * 9.0, 6.0, &line);
        }
    }

    c.finish()
}

fn continuation_page(
    document: &FiscalDocument,
    items: &[LineItem],
    page: usize,
    total: usize,
) -> Vec<Operation> {
    let mut c = Canvas::new();
    let y = PAGE_HEIGHT - MARGIN;
    c.bold(
        MARGIN,
        y - 12.0,
        8.0,
        &format!(
            "DANFE - {} - Nº {}  Folha {page}/{total}",
            document.issuer.legal_name.as_deref().unwrap_or(""),
            document.identification.number.as_deref().unwrap_or("-"),
        ),
    );
    items_table(&mut c, y - 20.0, items);
    c.finish()
}

/// Column x-offsets of the items table.
const COLS: [(f32, &str); 9] = [
    (0.0, "CÓDIGO"),
    (60.0, "DESCRIÇÃO"),
    (250.0, "NCM"),
    (295.0, "CST"),
    (325.0, "CFOP"),
    (360.0, "UN"),
    (390.0, "QTD"),
    (440.0, "V. UNIT."),
    (490.0, "V. TOTAL"),
];

fn items_table(c: &mut Canvas, mut y: f32, items: &[LineItem]) -> f32 {
    let right = PAGE_WIDTH - MARGIN;
    c.bold(MARGIN, y - 10.0, 7.0, "DADOS DOS PRODUTOS / SERVIÇOS");
    y -= 14.0;

    let header_y = y;
    y -= 12.0;
    for (x, label) in COLS {
        c.bold(MARGIN + 2.0 + x, header_y - 9.0, 6.0, label);
    }
    c.hline(MARGIN, header_y - 12.0, right - MARGIN);

    for item in items {
        let status = item
            .taxes
            .icms
            .as_ref()
            .and_then(|i| i.status.as_ref())
            .map(|s| s.code().to_string())
            .unwrap_or_default();
        let cells: [String; 9] = [
            item.code.clone().unwrap_or_default(),
            truncate(item.description.as_deref().unwrap_or(""), 44),
            item.ncm.clone().unwrap_or_default(),
            status,
            item.cfop.clone().unwrap_or_default(),
            item.unit.clone().unwrap_or_default(),
            money(item.quantity),
            money(item.unit_value),
            money(item.total),
        ];
        for ((x, _), cell) in COLS.iter().zip(&cells) {
            c.text(MARGIN + 2.0 + x, y - 8.0, 6.0, cell);
        }
        y -= 11.0;
    }
    c.hline(MARGIN, y, right - MARGIN);
    y - 4.0
}

fn totals_row(c: &mut Canvas, y: f32, cells: &[(&str, Option<Decimal>)]) -> f32 {
    let width = (PAGE_WIDTH - 2.0 * MARGIN) / cells.len() as f32;
    for (i, (label, value)) in cells.iter().enumerate() {
        let x = MARGIN + width * i as f32;
        c.stroke_rect(x, y - 18.0, width, 18.0);
        c.text(x + 2.0, y - 7.0, 5.0, label);
        c.text(x + 2.0, y - 15.0, 6.5, &money(*value));
    }
    y - 18.0
}

fn draw_bars(c: &mut Canvas, geometry: &BarGeometry, x: f32, y: f32, width: f32, height: f32) {
    let module = width / geometry.modules as f32;
    for bar in &geometry.bars {
        c.fill_rect(x + bar.x as f32 * module, y, bar.width as f32 * module, height);
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

fn format_address(d: &FiscalDocument) -> (String, String) {
    let a = &d.issuer.address;
    (
        join_nonempty(&[a.street.as_deref(), a.number.as_deref(), a.district.as_deref()]),
        join_nonempty(&[
            a.municipality.as_deref(),
            a.state.as_deref(),
            a.postal_code.as_deref(),
        ]),
    )
}

fn join_nonempty(parts: &[Option<&str>]) -> String {
    parts
        .iter()
        .filter_map(|p| *p)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

fn tax_id_text(tax_id: &Option<TaxId>) -> String {
    tax_id.as_ref().map(|t| t.digits().to_string()).unwrap_or_default()
}

fn freight_mode_text(code: Option<&str>) -> &'static str {
    match code {
        Some("0") => "0 - EMITENTE",
        Some("1") => "1 - DESTINATÁRIO",
        Some("2") => "2 - TERCEIROS",
        Some("9") => "9 - SEM FRETE",
        _ => "",
    }
}

/// Brazilian money formatting: `1234567.8` → `1.234.567,80`.
/// `None` renders blank, never `0,00`.
fn money(value: Option<Decimal>) -> String {
    let Some(value) = value else {
        return String::new();
    };
    let plain = format!("{:.2}", value);
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped},{frac_part}")
}

/// Access key in the conventional 4-digit groups.
fn spaced_key(key: &str) -> String {
    key.as_bytes()
        .chunks(4)
        .map(|c| std::str::from_utf8(c).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + word.chars().count() + 1 > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

// ---------------------------------------------------------------------------
// Low-level content-stream canvas
// ---------------------------------------------------------------------------

struct Canvas {
    ops: Vec<Operation>,
}

impl Canvas {
    fn new() -> Self {
        let mut ops = Vec::new();
        ops.push(Operation::new("w", vec![Object::Real(0.5)]));
        Self { ops }
    }

    fn finish(self) -> Vec<Operation> {
        self.ops
    }

    fn text_with_font(&mut self, font: &str, x: f32, y: f32, size: f32, s: &str) {
        if s.is_empty() {
            return;
        }
        self.ops.push(Operation::new("BT", vec![]));
        self.ops.push(Operation::new(
            "Tf",
            vec![Object::Name(font.into()), Object::Real(size)],
        ));
        self.ops
            .push(Operation::new("Td", vec![Object::Real(x), Object::Real(y)]));
        self.ops
            .push(Operation::new("Tj", vec![Object::string_literal(win_ansi(s))]));
        self.ops.push(Operation::new("ET", vec![]));
    }

    fn text(&mut self, x: f32, y: f32, size: f32, s: &str) {
        self.text_with_font("F1", x, y, size, s);
    }

    fn bold(&mut self, x: f32, y: f32, size: f32, s: &str) {
        self.text_with_font("F2", x, y, size, s);
    }

    /// Small caption at `y` top with its value just below.
    fn label_value(&mut self, x: f32, y_top: f32, label: &str, value: &str) {
        self.text(x, y_top - 7.0, 5.0, label);
        self.text(x, y_top - 16.0, 7.0, value);
    }

    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.ops.push(Operation::new(
            "re",
            vec![Object::Real(x), Object::Real(y), Object::Real(w), Object::Real(h)],
        ));
        self.ops.push(Operation::new("S", vec![]));
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.ops.push(Operation::new(
            "re",
            vec![Object::Real(x), Object::Real(y), Object::Real(w), Object::Real(h)],
        ));
        self.ops.push(Operation::new("f", vec![]));
    }

    fn hline(&mut self, x: f32, y: f32, w: f32) {
        self.ops
            .push(Operation::new("m", vec![Object::Real(x), Object::Real(y)]));
        self.ops.push(Operation::new(
            "l",
            vec![Object::Real(x + w), Object::Real(y)],
        ));
        self.ops.push(Operation::new("S", vec![]));
    }

    fn vline(&mut self, x: f32, y: f32, h: f32) {
        self.ops
            .push(Operation::new("m", vec![Object::Real(x), Object::Real(y)]));
        self.ops.push(Operation::new(
            "l",
            vec![Object::Real(x), Object::Real(y + h)],
        ));
        self.ops.push(Operation::new("S", vec![]));
    }
}

/// Type1 Helvetica with WinAnsiEncoding wants single-byte text; anything
/// outside Latin-1 degrades to '?'.
fn win_ansi(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| {
            let code = c as u32;
            if (0x20..=0xFF).contains(&code) {
                code as u8
            } else {
                b'?'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_formatting() {
        use rust_decimal_macros::dec;
        assert_eq!(money(Some(dec!(1234567.8))), "1.234.567,80");
        assert_eq!(money(Some(dec!(0))), "0,00");
        assert_eq!(money(Some(dec!(-42.5))), "-42,50");
        assert_eq!(money(None), "");
    }

    #[test]
    fn key_grouping() {
        let key = "12345678901234567890123456789012345678901234";
        assert!(spaced_key(key).starts_with("1234 5678 9012"));
    }

    #[test]
    fn win_ansi_degrades_outside_latin1() {
        assert_eq!(win_ansi("Aç"), vec![b'A', 0xE7]);
        assert_eq!(win_ansi("日"), vec![b'?']);
    }

    #[test]
    fn pagination_splits_after_first_page() {
        let items = vec![LineItem::default(); FIRST_PAGE_ROWS + CONT_PAGE_ROWS + 1];
        let chunks = paginate(&items);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), FIRST_PAGE_ROWS);
        assert_eq!(chunks[1].len(), CONT_PAGE_ROWS);
        assert_eq!(chunks[2].len(), 1);
    }
}
