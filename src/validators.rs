//! Field-level checks shared by the encoder.
//!
//! Each check is a pure function. The encoder turns failures into [`Error`]s in a fixed
//! order, see [`crate::encode`].

use once_cell::sync::Lazy;
use regex::Regex;

use super::{string_types::StringExt, Error};

/// Member states of the UEMOA, the only countries a PI-SPI payload may carry.
pub const UEMOA_COUNTRIES: [&str; 8] = ["BJ", "BF", "CI", "ML", "NE", "SN", "TG", "GW"];

pub const MAX_REFERENCE_LABEL_LEN: usize = 25;
pub const MAX_AMOUNT_DIGITS: usize = 13;

static UUID_V4: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
        .expect("UUID v4 pattern compiles")
});

/// 8-4-4-4-12 hex groups, version nibble `4`, variant nibble in `8..=b`. Case-insensitive.
pub fn is_uuid_v4(alias: &str) -> bool {
    UUID_V4.is_match(alias)
}

/// Case-insensitive membership in [`UEMOA_COUNTRIES`].
pub fn is_supported_country(code: &str) -> bool {
    code.to_exact_size::<2>()
        .map(|code| UEMOA_COUNTRIES.contains(&code.to_ascii_uppercase().as_str()))
        .unwrap_or(false)
}

pub fn is_valid_reference_label(label: &str) -> bool {
    label.to_max_size::<MAX_REFERENCE_LABEL_LEN>().is_some()
}

/// Custom template 62 sub-tags are two ASCII letters or digits.
pub fn is_valid_sub_tag(tag: &str) -> bool {
    tag.to_exact_size::<2>()
        .map(|tag| tag.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or(false)
}

/// Checks an already normalized amount: digits only, at most 13 of them.
pub fn check_amount_digits(amount: &str) -> super::Result<()> {
    if amount.is_empty() || !amount.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::AmountNotDigits);
    }

    if amount.len() > MAX_AMOUNT_DIGITS {
        return Err(Error::AmountTooLong(amount.len()));
    }

    Ok(())
}
