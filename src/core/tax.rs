//! Per-line tax details.
//!
//! In the source XML each tax appears as a wrapper element (`ICMS`, `IPI`,
//! `PIS`, `COFINS`) containing exactly one of several mutually exclusive
//! sub-variant elements (`ICMS00`, `ICMS10`, …, `ICMSSN102`, …). The
//! normalizer selects the first present variant and extracts a uniform
//! field set from it; a wrapper with no recognized variant resolves to
//! `None` for that tax.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Tax situation code — CST under the normal regime, CSOSN under the
/// Simples Nacional regime. A line carries exactly one of the two or
/// neither; the enum makes the both-populated state unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxStatus {
    /// `CST` — normal regime.
    Cst(String),
    /// `CSOSN` — Simples Nacional.
    Csosn(String),
}

impl TaxStatus {
    /// The raw code regardless of regime.
    pub fn code(&self) -> &str {
        match self {
            Self::Cst(c) | Self::Csosn(c) => c,
        }
    }

    /// True for the Simples Nacional variant.
    pub fn is_simples(&self) -> bool {
        matches!(self, Self::Csosn(_))
    }
}

/// Resolved taxes of one line item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineTaxes {
    /// `vTotTrib` — approximate total tax burden of the line.
    pub total_tax: Option<Decimal>,
    pub icms: Option<IcmsDetail>,
    pub ipi: Option<IpiDetail>,
    pub pis: Option<PisDetail>,
    pub cofins: Option<CofinsDetail>,
}

/// Uniform field set extracted from whichever `ICMS*` variant is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IcmsDetail {
    /// Tag name of the matched variant ("ICMS00", "ICMS20", "ICMSSN102", …).
    pub variant: String,
    /// `orig` — merchandise origin code.
    pub origin: Option<String>,
    /// `CST` or `CSOSN`.
    pub status: Option<TaxStatus>,
    /// `modBC` — base determination modality.
    pub base_modality: Option<String>,
    /// `vBC`.
    pub base: Option<Decimal>,
    /// `pICMS` — rate percent.
    pub rate: Option<Decimal>,
    /// `vICMS`.
    pub value: Option<Decimal>,
}

/// Extracted from the first of `IPITrib` / `IPINT`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IpiDetail {
    /// `CST`.
    pub cst: Option<String>,
    /// `vBC`.
    pub base: Option<Decimal>,
    /// `pIPI`.
    pub rate: Option<Decimal>,
    /// `vIPI`.
    pub value: Option<Decimal>,
}

/// Extracted from the first of `PISAliq` / `PISQtde` / `PISNT` / `PISOutr`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PisDetail {
    /// `CST`.
    pub cst: Option<String>,
    /// `vBC`.
    pub base: Option<Decimal>,
    /// `pPIS`.
    pub rate: Option<Decimal>,
    /// `vPIS`.
    pub value: Option<Decimal>,
}

/// Extracted from the first of `COFINSAliq` / `COFINSQtde` / `COFINSNT` /
/// `COFINSOutr`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CofinsDetail {
    /// `CST`.
    pub cst: Option<String>,
    /// `vBC`.
    pub base: Option<Decimal>,
    /// `pCOFINS`.
    pub rate: Option<Decimal>,
    /// `vCOFINS`.
    pub value: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tax_status_code_access() {
        assert_eq!(TaxStatus::Cst("00".into()).code(), "00");
        assert_eq!(TaxStatus::Csosn("102".into()).code(), "102");
        assert!(TaxStatus::Csosn("102".into()).is_simples());
        assert!(!TaxStatus::Cst("00".into()).is_simples());
    }
}
