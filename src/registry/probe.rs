//! Candidate-path probing over loosely-typed provider JSON.

use serde_json::Value;

/// Walk a dot-separated path (`"estabelecimento.cidade.nome"`) into a
/// JSON value.
fn walk<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            other => other.get(segment)?,
        };
    }
    Some(current)
}

/// Try each candidate path in order and return the first present,
/// non-null value.
pub fn probe<'a>(value: &'a Value, paths: &[&str]) -> Option<&'a Value> {
    paths
        .iter()
        .filter_map(|p| walk(value, p))
        .find(|v| !v.is_null())
}

/// Like [`probe`], but coerced to a non-empty string: strings pass
/// through, numbers are formatted, and objects fall back to their own
/// `descricao`/`nome`/`sigla` field (providers wrap the same value both
/// ways).
pub fn probe_str(value: &Value, paths: &[&str]) -> Option<String> {
    let found = probe(value, paths)?;
    as_text(found).filter(|s| !s.is_empty())
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(_) => ["descricao", "nome", "sigla", "id"]
            .iter()
            .filter_map(|k| value.get(k))
            .find_map(as_text),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_present_path_wins() {
        let v = json!({"razao_social": "ACME LTDA", "nome": "ignored"});
        assert_eq!(
            probe_str(&v, &["razao_social", "nome", "name"]),
            Some("ACME LTDA".into())
        );
    }

    #[test]
    fn falls_through_missing_and_null() {
        let v = json!({"nome": null, "name": "Fallback Inc"});
        assert_eq!(
            probe_str(&v, &["razao_social", "nome", "name"]),
            Some("Fallback Inc".into())
        );
    }

    #[test]
    fn nested_paths_and_object_fallbacks() {
        let v = json!({"estabelecimento": {"cidade": {"nome": "Porto Alegre"}}});
        assert_eq!(
            probe_str(&v, &["municipio", "estabelecimento.cidade"]),
            Some("Porto Alegre".into())
        );
    }

    #[test]
    fn numbers_coerce_to_text() {
        let v = json!({"cnae_fiscal": 6201501});
        assert_eq!(probe_str(&v, &["cnae_fiscal"]), Some("6201501".into()));
    }

    #[test]
    fn nothing_present_is_none() {
        let v = json!({"other": 1});
        assert_eq!(probe_str(&v, &["a", "b.c"]), None);
    }
}
