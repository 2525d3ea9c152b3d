// Form Model - Registrant fields and input normalization
// The widgets clamp numbers and cap lengths; everything else is left to the validator

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_COUNTRY_CODE: &str = "+90";
pub const PHONE_LENGTH: usize = 10;
pub const MIN_AGE: u8 = 1;
pub const MAX_AGE: u8 = 120;
pub const MAX_GUEST_AGE: u8 = 120;

// ============================================================================
// YES / NO CHOICE
// ============================================================================

/// Binary choice shown as a radio pair ("Evet" / "Hayır")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum YesNo {
    #[serde(rename = "Evet")]
    Yes,
    #[default]
    #[serde(rename = "Hayır")]
    No,
}

impl YesNo {
    pub fn label(&self) -> &'static str {
        match self {
            YesNo::Yes => "Evet",
            YesNo::No => "Hayır",
        }
    }

    pub fn is_yes(&self) -> bool {
        *self == YesNo::Yes
    }

    pub fn toggle(&self) -> Self {
        match self {
            YesNo::Yes => YesNo::No,
            YesNo::No => YesNo::Yes,
        }
    }
}

impl fmt::Display for YesNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChoice(pub String);

impl fmt::Display for UnknownChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown choice '{}', expected Evet or Hayır", self.0)
    }
}

impl std::error::Error for UnknownChoice {}

impl FromStr for YesNo {
    type Err = UnknownChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Evet" => Ok(YesNo::Yes),
            "Hayır" => Ok(YesNo::No),
            other => Err(UnknownChoice(other.to_string())),
        }
    }
}

// ============================================================================
// REGISTRANT
// ============================================================================

/// Main participant fields as currently entered.
/// Guests live next to this in the session, see [`crate::guests::GuestList`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registrant {
    pub full_name: String,
    /// `None` when the age box is empty or unparsable
    pub age: Option<u8>,
    pub country_code: String,
    pub phone: String,
    pub club_member: YesNo,
    pub has_guests: YesNo,
}

impl Default for Registrant {
    fn default() -> Self {
        Self {
            full_name: String::new(),
            age: None,
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            phone: String::new(),
            club_member: YesNo::No,
            has_guests: YesNo::No,
        }
    }
}

// ============================================================================
// INPUT NORMALIZATION
// ============================================================================

/// Participant age as the number widget reports it: clamped to 1..=120,
/// `None` for empty or non-numeric input.
pub fn parse_age(input: &str) -> Option<u8> {
    let value: i64 = input.trim().parse().ok()?;
    Some(value.clamp(MIN_AGE as i64, MAX_AGE as i64) as u8)
}

/// Guest age: clamped to 0..=120, unparsable input falls back to 0.
pub fn parse_guest_age(input: &str) -> u8 {
    input
        .trim()
        .parse::<i64>()
        .map(|value| value.clamp(0, MAX_GUEST_AGE as i64) as u8)
        .unwrap_or(0)
}

// ============================================================================
// TESTS
// ============================================================================
