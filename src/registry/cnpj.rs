//! CNPJ registry client.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::core::{is_valid_cnpj, sanitize_digits};

use super::probe::probe_str;
use super::{LookupError, status_error};

/// Normalized company record assembled from whichever provider shape
/// came back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CnpjRecord {
    pub cnpj: String,
    /// Razão social.
    pub legal_name: Option<String>,
    /// Nome fantasia.
    pub trade_name: Option<String>,
    /// Situação cadastral.
    pub status: Option<String>,
    /// Data da situação cadastral.
    pub status_date: Option<String>,
    /// Início de atividade.
    pub opened_at: Option<String>,
    pub municipality: Option<String>,
    pub state: Option<String>,
    /// Inscrição estadual.
    pub state_registration: Option<String>,
    /// Regime tributário.
    pub tax_regime: Option<String>,
}

impl CnpjRecord {
    /// Assemble a record from provider JSON by probing the known shape
    /// variants for each field.
    pub fn from_value(cnpj: &str, value: &Value) -> Self {
        Self {
            cnpj: cnpj.to_string(),
            legal_name: probe_str(value, &["razao_social", "nome", "name", "company.name"]),
            trade_name: probe_str(
                value,
                &[
                    "estabelecimento.nome_fantasia",
                    "fantasia",
                    "nome_fantasia",
                    "trade_name",
                    "alias",
                ],
            ),
            status: probe_str(
                value,
                &[
                    "estabelecimento.situacao_cadastral",
                    "situacao",
                    "status",
                    "descricao_situacao_cadastral",
                ],
            ),
            status_date: probe_str(
                value,
                &[
                    "estabelecimento.data_situacao_cadastral",
                    "data_situacao",
                    "situacao_data",
                ],
            ),
            opened_at: probe_str(
                value,
                &[
                    "estabelecimento.data_inicio_atividade",
                    "abertura",
                    "data_abertura",
                    "founded",
                ],
            ),
            municipality: probe_str(
                value,
                &[
                    "estabelecimento.cidade",
                    "municipio",
                    "cidade",
                    "city",
                    "address.city",
                ],
            ),
            state: probe_str(
                value,
                &[
                    "estabelecimento.estado",
                    "estabelecimento.uf",
                    "uf",
                    "estado",
                    "state",
                ],
            ),
            state_registration: probe_str(
                value,
                &[
                    "estabelecimento.inscricao_estadual",
                    "inscricao_estadual",
                    "inscricoes_estaduais.0.inscricao_estadual",
                ],
            ),
            tax_regime: probe_str(
                value,
                &[
                    "regime_tributario",
                    "estabelecimento.regime_tributario",
                    "simples.situacao",
                ],
            ),
        }
    }
}

/// Look up a CNPJ against a registry provider.
///
/// The identifier is validated (14 digits + check digits) before any
/// network I/O; a malformed CNPJ is a [`LookupError::InvalidIdentifier`],
/// reported distinctly from provider failures.
pub async fn fetch_cnpj(base_url: &str, cnpj: &str) -> Result<CnpjRecord, LookupError> {
    let digits = sanitize_digits(cnpj);
    if !is_valid_cnpj(&digits) {
        return Err(LookupError::InvalidIdentifier(format!(
            "'{cnpj}' is not a valid CNPJ"
        )));
    }

    let url = format!("{}/{digits}", base_url.trim_end_matches('/'));
    debug!(%url, "CNPJ lookup");

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .build()
        .map_err(|e| LookupError::Network(e.to_string()))?;

    let resp = client
        .get(&url)
        .send()
        .await
        .map_err(|e| LookupError::Network(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(status_error(status.as_u16()));
    }

    let value: Value = resp
        .json()
        .await
        .map_err(|e| LookupError::Decode(e.to_string()))?;
    Ok(CnpjRecord::from_value(&digits, &value))
}
