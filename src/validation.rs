// Registration Validator
// Required-field check first, phone format second

use crate::form::{Registrant, PHONE_LENGTH};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Lütfen tüm zorunlu alanları doldurun.")]
    MissingRequiredField,

    #[error("Lütfen geçerli bir telefon numarası girin.")]
    InvalidPhoneFormat,
}

/// A registrant that passed validation, with the age unwrapped.
#[derive(Debug, Clone, Copy)]
pub struct ValidRegistrant<'a> {
    pub registrant: &'a Registrant,
    pub age: u8,
}

/// Check the main participant fields.
///
/// An empty phone is reported as missing, never as malformed.
pub fn validate_registrant(registrant: &Registrant) -> Result<ValidRegistrant<'_>, ValidationError> {
    let age = match registrant.age {
        Some(age) if age > 0 => age,
        _ => return Err(ValidationError::MissingRequiredField),
    };

    if registrant.full_name.is_empty() || registrant.phone.is_empty() {
        return Err(ValidationError::MissingRequiredField);
    }

    if !is_valid_phone(&registrant.phone) {
        return Err(ValidationError::InvalidPhoneFormat);
    }

    Ok(ValidRegistrant { registrant, age })
}

pub fn is_valid_phone(phone: &str) -> bool {
    phone.chars().count() == PHONE_LENGTH && phone.chars().all(|c| c.is_ascii_digit())
}

// ============================================================================
// TESTS
// ============================================================================
