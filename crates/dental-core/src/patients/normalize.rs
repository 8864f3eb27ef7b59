//! Phone, name and email normalization for patient records.

use crate::models::{ValidationError, ValidationResult};

/// Canonical phone numbers are 10-digit local numbers.
pub const PHONE_DIGITS: usize = 10;

/// Reduce a phone number to its canonical 10-digit form.
///
/// Non-digits are stripped, then a `91` country code (12 digits) or a leading
/// trunk `0` (11 digits) is removed. Anything that does not end up as exactly
/// 10 digits is rejected.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    let local = match digits.len() {
        12 if digits.starts_with("91") => &digits[2..],
        11 if digits.starts_with('0') => &digits[1..],
        _ => digits.as_str(),
    };

    if local.len() == PHONE_DIGITS {
        Some(local.to_string())
    } else {
        None
    }
}

/// Trim, collapse internal whitespace and title-case each word.
pub fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    upper + &chars.as_str().to_lowercase()
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Minimal shape check: one `@`, non-empty local part, dotted domain.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let invalid = || ValidationError::InvalidEmail(email.to_string());

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let mut labels = domain.split('.');
    let valid_domain = domain.contains('.') && labels.all(|label| !label.is_empty());
    if !valid_domain {
        return Err(invalid());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_phone_prefixes() {
        assert_eq!(normalize_phone("+91 9876543210").as_deref(), Some("9876543210"));
        assert_eq!(normalize_phone("09876543210").as_deref(), Some("9876543210"));
        assert_eq!(normalize_phone("9876543210").as_deref(), Some("9876543210"));
        assert_eq!(normalize_phone("(987) 654-3210").as_deref(), Some("9876543210"));
    }

    #[test]
    fn test_normalize_phone_rejects() {
        assert_eq!(normalize_phone(""), None);
        assert_eq!(normalize_phone("12345"), None);
        // 12 digits without the country code
        assert_eq!(normalize_phone("449876543210"), None);
        // 11 digits without a trunk zero
        assert_eq!(normalize_phone("19876543210"), None);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("  john   SMITH "), "John Smith");
        assert_eq!(title_case("o'neil"), "O'neil");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("asha@clinic.in").is_ok());
        assert!(validate_email("asha.rao+1@mail.example.com").is_ok());
        assert!(validate_email("asha").is_err());
        assert!(validate_email("@clinic.in").is_err());
        assert!(validate_email("asha@clinic").is_err());
        assert!(validate_email("asha@clinic..in").is_err());
        assert!(validate_email("a b@clinic.in").is_err());
    }

    proptest! {
        #[test]
        fn prop_prefixed_forms_agree(local in "[1-9][0-9]{9}") {
            let expected = Some(local.clone());
            prop_assert_eq!(normalize_phone(&local), expected.clone());
            prop_assert_eq!(normalize_phone(&format!("0{}", local)), expected.clone());
            prop_assert_eq!(normalize_phone(&format!("+91 {}", local)), expected.clone());
            prop_assert_eq!(normalize_phone(&format!("91-{}", local)), expected);
        }

        #[test]
        fn prop_normalized_is_ten_digits(raw in ".{0,20}") {
            if let Some(phone) = normalize_phone(&raw) {
                prop_assert_eq!(phone.len(), PHONE_DIGITS);
                prop_assert!(phone.chars().all(|c| c.is_ascii_digit()));
            }
        }
    }
}
