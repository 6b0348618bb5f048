//! Country reference data.
//!
//! Static lookup table of ISO 3166-1 alpha-2 codes, international dial
//! codes, and the expected national-number digit range for E.164
//! validation. The range covers the digits after the dial code, not the
//! full number.

/// Reference data for one country.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountryInfo {
    /// ISO 3166-1 alpha-2 code, uppercase.
    pub code: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// International dial code without the leading `+`.
    pub dial_code: &'static str,
    /// Minimum national-number digits (after the dial code).
    pub min_digits: u8,
    /// Maximum national-number digits (after the dial code).
    pub max_digits: u8,
}

/// The supported country table, ordered by code.
pub const COUNTRIES: &[CountryInfo] = &[
    CountryInfo { code: "AE", name: "United Arab Emirates", dial_code: "971", min_digits: 8, max_digits: 9 },
    CountryInfo { code: "AT", name: "Austria", dial_code: "43", min_digits: 8, max_digits: 12 },
    CountryInfo { code: "AU", name: "Australia", dial_code: "61", min_digits: 9, max_digits: 9 },
    CountryInfo { code: "BE", name: "Belgium", dial_code: "32", min_digits: 8, max_digits: 9 },
    CountryInfo { code: "BR", name: "Brazil", dial_code: "55", min_digits: 10, max_digits: 11 },
    CountryInfo { code: "CA", name: "Canada", dial_code: "1", min_digits: 10, max_digits: 10 },
    CountryInfo { code: "CH", name: "Switzerland", dial_code: "41", min_digits: 9, max_digits: 9 },
    CountryInfo { code: "DE", name: "Germany", dial_code: "49", min_digits: 9, max_digits: 11 },
    CountryInfo { code: "DK", name: "Denmark", dial_code: "45", min_digits: 8, max_digits: 8 },
    CountryInfo { code: "ES", name: "Spain", dial_code: "34", min_digits: 9, max_digits: 9 },
    CountryInfo { code: "FI", name: "Finland", dial_code: "358", min_digits: 8, max_digits: 10 },
    CountryInfo { code: "FR", name: "France", dial_code: "33", min_digits: 9, max_digits: 9 },
    CountryInfo { code: "GB", name: "United Kingdom", dial_code: "44", min_digits: 9, max_digits: 10 },
    CountryInfo { code: "IE", name: "Ireland", dial_code: "353", min_digits: 8, max_digits: 9 },
    CountryInfo { code: "IN", name: "India", dial_code: "91", min_digits: 10, max_digits: 10 },
    CountryInfo { code: "IT", name: "Italy", dial_code: "39", min_digits: 9, max_digits: 10 },
    CountryInfo { code: "JP", name: "Japan", dial_code: "81", min_digits: 9, max_digits: 10 },
    CountryInfo { code: "NL", name: "Netherlands", dial_code: "31", min_digits: 9, max_digits: 9 },
    CountryInfo { code: "NO", name: "Norway", dial_code: "47", min_digits: 8, max_digits: 8 },
    CountryInfo { code: "NZ", name: "New Zealand", dial_code: "64", min_digits: 8, max_digits: 9 },
    CountryInfo { code: "PL", name: "Poland", dial_code: "48", min_digits: 9, max_digits: 9 },
    CountryInfo { code: "PT", name: "Portugal", dial_code: "351", min_digits: 9, max_digits: 9 },
    CountryInfo { code: "SE", name: "Sweden", dial_code: "46", min_digits: 8, max_digits: 9 },
    CountryInfo { code: "SG", name: "Singapore", dial_code: "65", min_digits: 8, max_digits: 8 },
    CountryInfo { code: "US", name: "United States", dial_code: "1", min_digits: 10, max_digits: 10 },
    CountryInfo { code: "ZA", name: "South Africa", dial_code: "27", min_digits: 9, max_digits: 9 },
];

/// Look up a country by its alpha-2 code (case-insensitive).
#[must_use]
pub fn lookup(code: &str) -> Option<&'static CountryInfo> {
    COUNTRIES
        .iter()
        .find(|c| c.code.eq_ignore_ascii_case(code.trim()))
}

/// Validate an E.164 phone number against a country's expected shape.
///
/// The number must start with `+`, contain only digits after it (1-15
/// total), begin with the country's dial code, and have a national part
/// whose length falls inside the country's configured digit range.
///
/// # Errors
///
/// Returns a human-readable reason string on rejection.
pub fn validate_e164(country: &CountryInfo, phone: &str) -> Result<(), String> {
    let Some(digits) = phone.strip_prefix('+') else {
        return Err("must start with '+'".to_owned());
    };

    if digits.is_empty() || digits.len() > 15 {
        return Err(format!(
            "expected 1-15 digits after '+', got {}",
            digits.len()
        ));
    }

    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err("may only contain digits after '+'".to_owned());
    }

    let Some(national) = digits.strip_prefix(country.dial_code) else {
        return Err(format!(
            "expected dial code +{} for {}",
            country.dial_code, country.code
        ));
    };

    let (min, max) = (usize::from(country.min_digits), usize::from(country.max_digits));
    if national.len() < min || national.len() > max {
        return Err(format!(
            "expected {min}-{max} national digits for {}, got {}",
            country.code,
            national.len()
        ));
    }

    Ok(())
}
