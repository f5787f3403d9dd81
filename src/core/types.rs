use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::tax::LineTaxes;

/// The canonical normalized fiscal document.
///
/// Produced once by the normalizer and treated as read-only afterwards:
/// rendering, flattening, and export all derive new structures from it and
/// never mutate it in place. Every consumer must treat `None` and empty
/// strings as "not declared in the source", not as a business value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiscalDocument {
    /// Document kind discriminator.
    pub doc_type: DocumentType,
    /// `ide` block plus the access key.
    pub identification: Identification,
    /// `emit` block.
    pub issuer: Party,
    /// `dest` block.
    pub recipient: Party,
    /// `det` blocks in document order. May be empty (some CTe documents).
    pub line_items: Vec<LineItem>,
    /// `total/ICMSTot` block — declared totals, never recomputed.
    pub totals: Totals,
    /// `transp` block.
    pub transport: Transport,
    /// `cobr` block.
    pub billing: Billing,
    /// `pag` block.
    pub payments: Payments,
    /// `infAdic` block.
    pub additional_info: AdditionalInfo,
    /// `protNFe/infProt` block; absent for unauthorized or draft documents.
    pub protocol: Option<Protocol>,
}

impl FiscalDocument {
    /// An all-default document of the given type. The normalizer fills in
    /// whatever the source declares; everything else stays "unknown".
    pub fn new(doc_type: DocumentType) -> Self {
        Self {
            doc_type,
            identification: Identification::default(),
            issuer: Party::default(),
            recipient: Party::default(),
            line_items: Vec::new(),
            totals: Totals::default(),
            transport: Transport::default(),
            billing: Billing::default(),
            payments: Payments::default(),
            additional_info: AdditionalInfo::default(),
            protocol: None,
        }
    }
}

/// Fiscal document kinds the normalizer recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentType {
    /// NFe — electronic invoice (modelo 55/65).
    Nfe,
    /// CTe — electronic transport document, supported in reduced form.
    Cte,
}

/// SEFAZ environment flag (`tpAmb`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Environment {
    /// 1 — production.
    Production,
    /// 2 — homologation (test).
    Homologation,
    /// Absent or unrecognized code.
    #[default]
    Unknown,
}

impl Environment {
    /// Parse from the `tpAmb` code.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "1" => Self::Production,
            "2" => Self::Homologation,
            _ => Self::Unknown,
        }
    }
}

/// `ide` block plus the resolved access key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identification {
    /// 44-digit access key, from `protNFe/infProt/chNFe` or the `infNFe`
    /// `Id` attribute with its `NFe` prefix stripped.
    pub access_key: Option<String>,
    /// `nNF` — document number.
    pub number: Option<String>,
    /// `serie` — document series.
    pub series: Option<String>,
    /// `mod` — layout model (55 NFe, 65 NFCe).
    pub model: Option<String>,
    /// `dhEmi` — emission timestamp with offset.
    pub issued_at: Option<DateTime<FixedOffset>>,
    /// `dhSaiEnt` — exit/entry timestamp.
    pub departed_at: Option<DateTime<FixedOffset>>,
    /// `natOp` — nature of the operation.
    pub operation_nature: Option<String>,
    /// `tpNF` — 0 entry, 1 exit.
    pub operation_type: Option<String>,
    /// `tpAmb`.
    pub environment: Environment,
    /// `cUF` — issuing state IBGE code.
    pub state_code: Option<String>,
    /// `cMunFG` — municipality of the taxable event.
    pub municipality_code: Option<String>,
    /// `finNFe` — emission purpose.
    pub purpose: Option<String>,
}

/// CNPJ (company) or CPF (person) tax identifier.
///
/// The two never coexist on a party; the source carries exactly one tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxId {
    /// 14-digit company identifier.
    Cnpj(String),
    /// 11-digit person identifier.
    Cpf(String),
}

impl TaxId {
    /// The raw digit string regardless of kind.
    pub fn digits(&self) -> &str {
        match self {
            Self::Cnpj(d) | Self::Cpf(d) => d,
        }
    }
}

/// `emit` / `dest` — issuer or recipient identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Party {
    /// `CNPJ` or `CPF`.
    pub tax_id: Option<TaxId>,
    /// `xNome` — legal name.
    pub legal_name: Option<String>,
    /// `xFant` — trade name (issuer only).
    pub trade_name: Option<String>,
    /// `IE` — state registration.
    pub state_registration: Option<String>,
    /// `CRT` — tax regime code (issuer only; 1 = Simples Nacional).
    pub tax_regime: Option<String>,
    /// `enderEmit` / `enderDest`.
    pub address: Address,
}

/// Postal address (`enderEmit` / `enderDest`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    /// `xLgr` — street.
    pub street: Option<String>,
    /// `nro` — number.
    pub number: Option<String>,
    /// `xBairro` — district.
    pub district: Option<String>,
    /// `cMun` — municipality IBGE code.
    pub municipality_code: Option<String>,
    /// `xMun` — municipality name.
    pub municipality: Option<String>,
    /// `UF` — state abbreviation.
    pub state: Option<String>,
    /// `CEP` — postal code.
    pub postal_code: Option<String>,
    /// `xPais` — country name.
    pub country: Option<String>,
    /// `fone` — phone.
    pub phone: Option<String>,
}

/// One `det` block — a product or service line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// `nItem` attribute — 1-based ordinal within the document.
    pub number: Option<u32>,
    /// `cProd` — product code.
    pub code: Option<String>,
    /// `cEAN` — GTIN/EAN.
    pub ean: Option<String>,
    /// `xProd` — description.
    pub description: Option<String>,
    /// `NCM` — tariff classification.
    pub ncm: Option<String>,
    /// `CFOP` — fiscal operation code.
    pub cfop: Option<String>,
    /// `uCom` — commercial unit.
    pub unit: Option<String>,
    /// `qCom` — quantity.
    pub quantity: Option<Decimal>,
    /// `vUnCom` — unit value.
    pub unit_value: Option<Decimal>,
    /// `vProd` — line total.
    pub total: Option<Decimal>,
    /// `vDesc` — line discount.
    pub discount: Option<Decimal>,
    /// `infAdProd` — free-text note.
    pub additional_info: Option<String>,
    /// `imposto` — resolved tax details.
    pub taxes: LineTaxes,
}

/// `total/ICMSTot` — declared aggregates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    /// `vBC` — ICMS base.
    pub tax_base: Option<Decimal>,
    /// `vICMS`.
    pub tax_value: Option<Decimal>,
    /// `vBCST` — substitution base.
    pub st_base: Option<Decimal>,
    /// `vST`.
    pub st_value: Option<Decimal>,
    /// `vProd` — sum of line totals.
    pub products_value: Option<Decimal>,
    /// `vFrete`.
    pub freight: Option<Decimal>,
    /// `vSeg`.
    pub insurance: Option<Decimal>,
    /// `vDesc`.
    pub discount: Option<Decimal>,
    /// `vIPI`.
    pub ipi_value: Option<Decimal>,
    /// `vPIS`.
    pub pis_value: Option<Decimal>,
    /// `vCOFINS`.
    pub cofins_value: Option<Decimal>,
    /// `vOutro` — other expenses.
    pub other_expenses: Option<Decimal>,
    /// `vNF` — grand total.
    pub grand_total: Option<Decimal>,
}

/// `transp` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transport {
    /// `modFrete` — freight payment responsibility code.
    pub freight_mode: Option<String>,
    /// `transporta`.
    pub carrier: Carrier,
    /// `veicTransp`.
    pub vehicle: Vehicle,
    /// `vol` blocks in document order.
    pub volumes: Vec<Volume>,
}

/// `transporta` — carrier identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Carrier {
    /// `CNPJ` or `CPF`.
    pub tax_id: Option<TaxId>,
    /// `xNome`.
    pub name: Option<String>,
    /// `IE`.
    pub state_registration: Option<String>,
    /// `xEnder` — single-line address.
    pub address: Option<String>,
    /// `xMun`.
    pub municipality: Option<String>,
    /// `UF`.
    pub state: Option<String>,
}

/// `veicTransp` — transport vehicle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// `placa` — plate.
    pub plate: Option<String>,
    /// `UF` — plate state.
    pub state: Option<String>,
    /// `RNTC` — national carrier registry.
    pub rntc: Option<String>,
}

/// One `vol` block — a volume descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    /// `qVol` — volume count.
    pub quantity: Option<Decimal>,
    /// `esp` — kind (e.g. "CAIXA").
    pub kind: Option<String>,
    /// `marca` — brand.
    pub brand: Option<String>,
    /// `nVol` — volume numbering.
    pub numbering: Option<String>,
    /// `pesoL` — net weight in kg.
    pub net_weight: Option<Decimal>,
    /// `pesoB` — gross weight in kg.
    pub gross_weight: Option<Decimal>,
}

/// `cobr` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Billing {
    /// `fat` — invoice reference.
    pub invoice: Option<InvoiceRef>,
    /// `dup` blocks in document order. May be empty.
    pub installments: Vec<Installment>,
}

/// `fat` — billing invoice reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRef {
    /// `nFat`.
    pub number: Option<String>,
    /// `vOrig` — original value.
    pub original_value: Option<Decimal>,
    /// `vDesc`.
    pub discount: Option<Decimal>,
    /// `vLiq` — net value.
    pub net_value: Option<Decimal>,
}

/// One `dup` block — an installment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    /// `nDup`.
    pub number: Option<String>,
    /// `dVenc` — due date.
    pub due_date: Option<NaiveDate>,
    /// `vDup` — value.
    pub value: Option<Decimal>,
}

/// `pag` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payments {
    /// `detPag` blocks in document order.
    pub entries: Vec<Payment>,
    /// `vTroco` — change given.
    pub change: Option<Decimal>,
}

/// One `detPag` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// `tPag` — payment method code.
    pub method: Option<String>,
    /// `vPag` — amount.
    pub value: Option<Decimal>,
}

/// `infAdic` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdditionalInfo {
    /// `infCpl` — complementary free text.
    pub complement: Option<String>,
    /// `infAdFisco` — fiscal-authority-only note.
    pub fisco: Option<String>,
}

/// `protNFe/infProt` — authorization protocol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Protocol {
    /// `chNFe` — access key echo.
    pub access_key: Option<String>,
    /// `dhRecbto` — receipt timestamp.
    pub received_at: Option<DateTime<FixedOffset>>,
    /// `nProt` — protocol number.
    pub number: Option<String>,
    /// `cStat` — status code (100 = authorized).
    pub status_code: Option<String>,
    /// `xMotivo` — status reason.
    pub status_reason: Option<String>,
    /// `tpAmb`.
    pub environment: Environment,
    /// `verAplic` — authorizing application version.
    pub application_version: Option<String>,
    /// `digVal` — digest value.
    pub digest: Option<String>,
}
