// src/common/documento.rs
//
// Validações de documentos brasileiros usadas pelos payloads (`validator`).

use validator::ValidationError;

pub fn only_digits(value: &str) -> Vec<u32> {
    value.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn check_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    let resto = sum % 11;
    if resto < 2 { 0 } else { 11 - resto }
}

fn all_equal(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

pub fn is_valid_cpf(value: &str) -> bool {
    let digits = only_digits(value);
    if digits.len() != 11 || all_equal(&digits) {
        return false;
    }
    let d1 = check_digit(&digits[..9], &[10, 9, 8, 7, 6, 5, 4, 3, 2]);
    let d2 = check_digit(&digits[..10], &[11, 10, 9, 8, 7, 6, 5, 4, 3, 2]);
    digits[9] == d1 && digits[10] == d2
}

pub fn is_valid_cnpj(value: &str) -> bool {
    let digits = only_digits(value);
    if digits.len() != 14 || all_equal(&digits) {
        return false;
    }
    let d1 = check_digit(&digits[..12], &[5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2]);
    let d2 = check_digit(&digits[..13], &[6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2]);
    digits[12] == d1 && digits[13] == d2
}

/// CPF ou CNPJ, decidido pela quantidade de dígitos.
pub fn validate_documento(value: &str) -> Result<(), ValidationError> {
    let valido = match only_digits(value).len() {
        11 => is_valid_cpf(value),
        14 => is_valid_cnpj(value),
        _ => false,
    };
    if valido {
        Ok(())
    } else {
        let mut err = ValidationError::new("documento");
        err.message = Some("CPF/CNPJ inválido.".into());
        Err(err)
    }
}

pub fn validate_cep(value: &str) -> Result<(), ValidationError> {
    let digits = only_digits(value);
    if digits.len() == 8 && value.chars().all(|c| c.is_ascii_digit() || c == '-' || c == '.') {
        Ok(())
    } else {
        let mut err = ValidationError::new("cep");
        err.message = Some("CEP deve ter 8 dígitos.".into());
        Err(err)
    }
}

/// Mantém só os dígitos (formato armazenado no banco).
pub fn normalize(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpf_check_digits() {
        assert!(is_valid_cpf("529.982.247-25"));
        assert!(is_valid_cpf("52998224725"));
        assert!(!is_valid_cpf("529.982.247-26"));
        assert!(!is_valid_cpf("111.111.111-11"));
        assert!(!is_valid_cpf("1234"));
    }

    #[test]
    fn cnpj_check_digits() {
        assert!(is_valid_cnpj("11.222.333/0001-81"));
        assert!(!is_valid_cnpj("11.222.333/0001-82"));
        assert!(!is_valid_cnpj("00000000000000"));
    }

    #[test]
    fn documento_dispatches_on_length() {
        assert!(validate_documento("52998224725").is_ok());
        assert!(validate_documento("11222333000181").is_ok());
        assert!(validate_documento("123").is_err());
    }

    #[test]
    fn cep_format() {
        assert!(validate_cep("01310-100").is_ok());
        assert!(validate_cep("01310100").is_ok());
        assert!(validate_cep("0131010").is_err());
        assert!(validate_cep("01310-10a").is_err());
        assert_eq!(normalize("01310-100"), "01310100");
    }
}
