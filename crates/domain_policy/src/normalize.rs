//! Provider input normalization
//!
//! The underwriting provider wants full region names, digit-only phone
//! numbers with a country code, and US-style date strings.

use chrono::{DateTime, NaiveDate, Utc};

/// Country calling code prefixed to ten-digit numbers
pub const DEFAULT_COUNTRY_CODE: &str = "1";

const PROVIDER_DATETIME_FORMAT: &str = "%m/%d/%Y %H:%M:%S";
const PROVIDER_DATE_FORMAT: &str = "%m/%d/%Y";

const REGIONS: [(&str, &str); 51] = [
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("DC", "District of Columbia"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
];

/// Expands a two-letter region code to its full name
///
/// Unknown codes and values that are already full names pass through
/// trimmed.
pub fn region_name(value: &str) -> String {
    let trimmed = value.trim();
    REGIONS
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(trimmed))
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

/// Reduces a phone number to digits and prefixes the country code
///
/// Ten-digit numbers get [`DEFAULT_COUNTRY_CODE`]; longer numbers are
/// assumed to carry one already.
pub fn phone_digits(value: &str) -> String {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 10 {
        format!("{}{}", DEFAULT_COUNTRY_CODE, digits)
    } else {
        digits
    }
}

/// Formats a trip timestamp the way the provider expects
pub fn provider_datetime(value: DateTime<Utc>) -> String {
    value.format(PROVIDER_DATETIME_FORMAT).to_string()
}

/// Formats a date of birth the way the provider expects
pub fn provider_date(value: NaiveDate) -> String {
    value.format(PROVIDER_DATE_FORMAT).to_string()
}
