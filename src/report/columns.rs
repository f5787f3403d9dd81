use serde::{Deserialize, Serialize};

/// Recognized report column keys.
///
/// A key is either document-level (one value per document) or line-item
/// derived; the latter force a projection to explode into one row per
/// (document, line item) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKey {
    /// Access key.
    Key,
    /// Emission timestamp.
    EmissionDate,
    /// Issuer CNPJ/CPF.
    IssuerTaxId,
    /// Issuer legal name.
    Issuer,
    /// Recipient CNPJ/CPF.
    RecipientTaxId,
    /// Recipient legal name.
    Recipient,
    /// Document number.
    Number,
    /// Document grand total.
    Value,
    /// Line item: product code.
    ProductCode,
    /// Line item: description.
    ProductName,
    /// Line item: quantity.
    ProductQuantity,
    /// Line item: unit value.
    ProductUnitValue,
    /// Line item: ICMS origin code.
    IcmsOrigin,
    /// Line item: CST or CSOSN code.
    IcmsStatus,
    /// Line item: ICMS base modality.
    IcmsBaseModality,
    /// Line item: ICMS base value.
    IcmsBase,
    /// Line item: ICMS rate.
    IcmsRate,
    /// Line item: ICMS value.
    IcmsValue,
}

impl ColumnKey {
    /// Human-readable header label, as displayed on screen and exported.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Key => "Chave",
            Self::EmissionDate => "Emissão",
            Self::IssuerTaxId => "Emitente CNPJ/CPF",
            Self::Issuer => "Emitente",
            Self::RecipientTaxId => "Destinatário CNPJ/CPF",
            Self::Recipient => "Destinatário",
            Self::Number => "Número",
            Self::Value => "Valor",
            Self::ProductCode => "Código",
            Self::ProductName => "Nome",
            Self::ProductQuantity => "Quantidade",
            Self::ProductUnitValue => "Valor Unitário",
            Self::IcmsOrigin => "ICMS Origem",
            Self::IcmsStatus => "ICMS CST/CSOSN",
            Self::IcmsBaseModality => "ICMS Mod. BC",
            Self::IcmsBase => "ICMS Base",
            Self::IcmsRate => "ICMS Alíquota",
            Self::IcmsValue => "ICMS Valor",
        }
    }

    /// True when the value comes from a line item (forces explosion).
    pub fn is_line_item(&self) -> bool {
        matches!(
            self,
            Self::ProductCode
                | Self::ProductName
                | Self::ProductQuantity
                | Self::ProductUnitValue
                | Self::IcmsOrigin
                | Self::IcmsStatus
                | Self::IcmsBaseModality
                | Self::IcmsBase
                | Self::IcmsRate
                | Self::IcmsValue
        )
    }
}

/// A named projection — the fixed set of columns shaping the flattened
/// output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportModel {
    /// Document-level parties view.
    NfeParties,
    /// Parties plus exploded product columns.
    NfeProducts,
    /// Product rows with the ICMS detail columns.
    NfeProductsIcms,
    /// Reduced CTe view (same shape as `NfeParties`).
    CteSimple,
    /// User-assembled column set.
    Custom(Vec<ColumnKey>),
}

impl ReportModel {
    /// The projection's columns, in display order.
    pub fn columns(&self) -> &[ColumnKey] {
        use ColumnKey::*;
        match self {
            Self::NfeParties | Self::CteSimple => &[
                Key,
                EmissionDate,
                IssuerTaxId,
                Issuer,
                RecipientTaxId,
                Recipient,
                Number,
                Value,
            ],
            Self::NfeProducts => &[
                Key,
                EmissionDate,
                Issuer,
                Recipient,
                Number,
                Value,
                ProductCode,
                ProductName,
                ProductQuantity,
                ProductUnitValue,
            ],
            Self::NfeProductsIcms => &[
                Key,
                Number,
                ProductCode,
                ProductName,
                IcmsOrigin,
                IcmsStatus,
                IcmsBaseModality,
                IcmsBase,
                IcmsRate,
                IcmsValue,
            ],
            Self::Custom(columns) => columns,
        }
    }

    /// A projection explodes when any of its columns is line-item derived.
    pub fn explodes(&self) -> bool {
        self.columns().iter().any(ColumnKey::is_line_item)
    }

    /// Display name of the projection.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NfeParties => "NFe Emitente/Destinatário",
            Self::NfeProducts => "NFe Emitente/Destinatário/Produtos",
            Self::NfeProductsIcms => "NFe Emitente/Destinatário/Produtos (ICMS)",
            Self::CteSimple => "CTe Modelo Simples",
            Self::Custom(_) => "Personalizado",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explosion_follows_column_kinds() {
        assert!(!ReportModel::NfeParties.explodes());
        assert!(ReportModel::NfeProducts.explodes());
        assert!(ReportModel::NfeProductsIcms.explodes());
        assert!(!ReportModel::Custom(vec![ColumnKey::Key]).explodes());
        assert!(ReportModel::Custom(vec![ColumnKey::Key, ColumnKey::ProductCode]).explodes());
    }
}
