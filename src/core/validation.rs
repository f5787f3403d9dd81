//! Identifier format validation.
//!
//! These checks gate intake paths (pasted access keys, registry lookups)
//! before any processing or network I/O happens; a rejection here is a
//! capacity/validation condition, distinct from downstream failures.

/// Strip every non-ASCII-digit character.
pub fn sanitize_digits(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// True when `key` is exactly 44 ASCII digits.
pub fn is_access_key_well_formed(key: &str) -> bool {
    key.len() == 44 && key.bytes().all(|b| b.is_ascii_digit())
}

/// Compute the mod-11 check digit over the first 43 digits of an access key.
///
/// Weights cycle 2..=9 from the rightmost digit leftwards. A remainder of
/// 0 or 1 yields digit 0.
pub fn access_key_check_digit(digits: &str) -> Option<u8> {
    if digits.len() < 43 || !digits.bytes().take(43).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut weight = 2u32;
    let mut sum = 0u32;
    for b in digits.as_bytes()[..43].iter().rev() {
        sum += u32::from(b - b'0') * weight;
        weight = if weight == 9 { 2 } else { weight + 1 };
    }
    let rem = sum % 11;
    Some(if rem < 2 { 0 } else { (11 - rem) as u8 })
}

/// Well-formedness plus check-digit verification of a 44-digit access key.
pub fn validate_access_key(key: &str) -> bool {
    if !is_access_key_well_formed(key) {
        return false;
    }
    let expected = match access_key_check_digit(key) {
        Some(d) => d,
        None => return false,
    };
    key.as_bytes()[43] - b'0' == expected
}

/// Pull every well-formed 44-digit access key out of free text
/// (one per line or whitespace-separated, as pasted by users).
pub fn extract_access_keys(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(str::trim)
        .filter(|k| is_access_key_well_formed(k))
        .map(str::to_string)
        .collect()
}

fn mod11_digit(digits: &[u8], weights: &[u32]) -> u8 {
    let sum: u32 = digits
        .iter()
        .zip(weights)
        .map(|(d, w)| u32::from(*d) * w)
        .sum();
    let rem = sum % 11;
    if rem < 2 { 0 } else { (11 - rem) as u8 }
}

/// Validate a CNPJ: 14 digits plus both check digits.
pub fn is_valid_cnpj(cnpj: &str) -> bool {
    let digits: Vec<u8> = sanitize_digits(cnpj).bytes().map(|b| b - b'0').collect();
    if digits.len() != 14 || digits.iter().all(|d| *d == digits[0]) {
        return false;
    }
    const W1: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
    const W2: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
    mod11_digit(&digits[..12], &W1) == digits[12] && mod11_digit(&digits[..13], &W2) == digits[13]
}

/// Validate a CPF: 11 digits plus both check digits.
pub fn is_valid_cpf(cpf: &str) -> bool {
    let digits: Vec<u8> = sanitize_digits(cpf).bytes().map(|b| b - b'0').collect();
    if digits.len() != 11 || digits.iter().all(|d| *d == digits[0]) {
        return false;
    }
    const W1: [u32; 9] = [10, 9, 8, 7, 6, 5, 4, 3, 2];
    const W2: [u32; 10] = [11, 10, 9, 8, 7, 6, 5, 4, 3, 2];
    mod11_digit(&digits[..9], &W1) == digits[9] && mod11_digit(&digits[..10], &W2) == digits[10]
}

#[cfg(test)]
mod tests {
    use super::*;

    // Key with a correct final check digit (computed by the same published
    // mod-11 rule the SEFAZ portal uses).
    fn keyed(prefix43: &str) -> String {
        let dv = access_key_check_digit(prefix43).unwrap();
        format!("{prefix43}{dv}")
    }

    #[test]
    fn well_formedness() {
        assert!(is_access_key_well_formed(&"1".repeat(44)));
        assert!(!is_access_key_well_formed(&"1".repeat(43)));
        assert!(!is_access_key_well_formed(&"a".repeat(44)));
    }

    #[test]
    fn check_digit_round_trip() {
        let key = keyed(&"35200714200166000187550010000000046550000004"[..43]);
        assert!(validate_access_key(&key));
        // Corrupt one digit — the check digit no longer matches.
        let mut bad = key.into_bytes();
        bad[10] = if bad[10] == b'9' { b'0' } else { bad[10] + 1 };
        assert!(!validate_access_key(&String::from_utf8(bad).unwrap()));
    }

    #[test]
    fn extracts_only_well_formed_keys() {
        let text = format!(
            "{}\nnot-a-key\n{} 123",
            "1".repeat(44),
            "2".repeat(44)
        );
        let keys = extract_access_keys(&text);
        assert_eq!(keys, vec!["1".repeat(44), "2".repeat(44)]);
    }

    #[test]
    fn cnpj_check_digits() {
        // Receita Federal's own published example.
        assert!(is_valid_cnpj("11.222.333/0001-81"));
        assert!(!is_valid_cnpj("11.222.333/0001-80"));
        assert!(!is_valid_cnpj("11111111111111"));
        assert!(!is_valid_cnpj("123"));
    }

    #[test]
    fn cpf_check_digits() {
        assert!(is_valid_cpf("529.982.247-25"));
        assert!(!is_valid_cpf("529.982.247-26"));
        assert!(!is_valid_cpf("00000000000"));
    }
}
