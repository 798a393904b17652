//! Input checks shared by the services. Each returns a field-scoped
//! validation error.

use rust_decimal::Decimal;

use crate::config::TenancyConfig;
use crate::error::ApiError;

pub fn required(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::invalid_field(field, "This field is required"));
    }
    Ok(())
}

/// Brazilian CEP: `00000000` or `00000-000`. Empty is allowed.
pub fn zip_code(value: &str) -> Result<(), ApiError> {
    let bytes = value.as_bytes();
    let ok = match bytes.len() {
        0 => true,
        8 => bytes.iter().all(u8::is_ascii_digit),
        9 => {
            bytes[..5].iter().all(u8::is_ascii_digit)
                && bytes[5] == b'-'
                && bytes[6..].iter().all(u8::is_ascii_digit)
        }
        _ => false,
    };
    if !ok {
        return Err(ApiError::invalid_field("zip_code", "CEP must have 8 digits (00000-000)"));
    }
    Ok(())
}

/// `#RRGGBB`.
pub fn color(value: &str) -> Result<(), ApiError> {
    let bytes = value.as_bytes();
    let ok = bytes.len() == 7 && bytes[0] == b'#' && bytes[1..].iter().all(u8::is_ascii_hexdigit);
    if !ok {
        return Err(ApiError::invalid_field("primary_color", "Color must be in #RRGGBB format"));
    }
    Ok(())
}

/// Normalizes and checks a custom domain. Returns the lowercase host name;
/// platform and loopback hosts are refused.
pub fn custom_domain(value: &str, tenancy: &TenancyConfig) -> Result<String, ApiError> {
    let domain = value.trim().trim_end_matches('.').to_ascii_lowercase();
    let invalid = || ApiError::invalid_field("custom_domain", "Enter a bare domain name, e.g. pousada.com.br");

    let labels: Vec<&str> = domain.split('.').collect();
    if domain.len() > 253 || labels.len() < 2 {
        return Err(invalid());
    }
    for label in &labels {
        let well_formed = !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-');
        if !well_formed {
            return Err(invalid());
        }
    }
    if tenancy.is_reserved(&domain) {
        return Err(ApiError::invalid_field("custom_domain", "This domain is reserved by the platform"));
    }
    Ok(domain)
}

pub fn positive(field: &str, value: Decimal) -> Result<(), ApiError> {
    if value <= Decimal::ZERO {
        return Err(ApiError::invalid_field(field, "Must be greater than zero"));
    }
    Ok(())
}

pub fn non_negative(field: &str, value: Decimal) -> Result<(), ApiError> {
    if value < Decimal::ZERO {
        return Err(ApiError::invalid_field(field, "Must not be negative"));
    }
    Ok(())
}

pub fn at_least(field: &str, value: i32, min: i32) -> Result<(), ApiError> {
    if value < min {
        return Err(ApiError::invalid_field(field, format!("Must be at least {}", min)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cep_accepts_both_formats() {
        assert!(zip_code("78195000").is_ok());
        assert!(zip_code("78195-000").is_ok());
        assert!(zip_code("").is_ok());
        assert!(zip_code("7819500").is_err());
        assert!(zip_code("78195_000").is_err());
        assert!(zip_code("abcde-fgh").is_err());
        assert!(zip_code("1234é678").is_err());
        assert!(zip_code("1234é67").is_err());
        assert!(zip_code("78195—00").is_err());
    }

    #[test]
    fn color_is_hex_triplet() {
        assert!(color("#1a2B3c").is_ok());
        assert!(color("1a2b3c").is_err());
        assert!(color("#12345").is_err());
        assert!(color("#gggggg").is_err());
        assert!(color("#é1234").is_err());
        assert!(color("é12345").is_err());
    }

    #[test]
    fn domain_is_normalized_and_checked() {
        let tenancy = TenancyConfig::default();
        assert_eq!(
            custom_domain(" PousadaVista.com.br. ", &tenancy).unwrap(),
            "pousadavista.com.br"
        );
        assert!(custom_domain("https://pousada.com.br", &tenancy).is_err());
        assert!(custom_domain("pousada.com.br:8080", &tenancy).is_err());
        assert!(custom_domain("localhost", &tenancy).is_err());
        assert!(custom_domain("app.seuservico.com", &tenancy).is_err());
        assert!(custom_domain("-bad.com", &tenancy).is_err());
    }

    #[test]
    fn prices() {
        assert!(positive("base_price", Decimal::ZERO).is_err());
        assert!(positive("base_price", Decimal::ONE).is_ok());
        assert!(non_negative("cleaning_fee", Decimal::ZERO).is_ok());
        assert!(non_negative("cleaning_fee", Decimal::NEGATIVE_ONE).is_err());
    }
}
