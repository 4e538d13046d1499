//! Location code format
//!
//! Codes look like `ADM-AB3-N2-4821F0C9`: building, `A` + shelf, `N` + level,
//! then a disambiguator made of the last four digits of the Unix-millisecond
//! clock and four random hex characters. Uniqueness is checked against the
//! store by the backend.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::Location;

/// Candidates tried before giving up on a unique code
pub const MAX_ATTEMPTS: u32 = 5;

/// `{building}-A{shelf}-N{level}`
pub fn location_prefix(location: &Location) -> String {
    format!("{}-A{}-N{}", location.building, location.shelf, location.level)
}

/// Four random upper-case hex characters
pub fn random_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..4].to_uppercase()
}

/// Last four digits of the millisecond clock followed by `random`
pub fn disambiguator(now: DateTime<Utc>, random: &str) -> String {
    format!("{:04}{}", now.timestamp_millis().rem_euclid(10_000), random)
}

/// Build a full code from its parts
pub fn format_location_code(location: &Location, now: DateTime<Utc>, random: &str) -> String {
    format!("{}-{}", location_prefix(location), disambiguator(now, random))
}

/// Build a candidate code with a fresh random component
pub fn candidate(location: &Location, now: DateTime<Utc>) -> String {
    format_location_code(location, now, &random_suffix())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Building;
    use chrono::TimeZone;

    #[test]
    fn test_format_location_code() {
        let location = Location::new(Building::Ti, "B3", 2);
        let now = Utc.timestamp_millis_opt(1_700_000_004_821).unwrap();
        assert_eq!(format_location_code(&location, now, "F0C9"), "TI-AB3-N2-4821F0C9");
    }

    #[test]
    fn test_timestamp_component_is_zero_padded() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_007).unwrap();
        assert_eq!(disambiguator(now, "AAAA"), "0007AAAA");
    }

    #[test]
    fn test_random_suffix_shape() {
        let suffix = random_suffix();
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn test_candidate_keeps_prefix() {
        let location = Location::new(Building::Adm, "A", 1);
        let code = candidate(&location, Utc::now());
        assert!(code.starts_with("ADM-AA-N1-"));
        assert_eq!(code.len(), "ADM-AA-N1-".len() + 8);
    }
}
