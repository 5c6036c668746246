//! Field bounds shared by product and category candidates.
//!
//! Requiredness and presentation-level rules belong to the boundary layer;
//! this module only rejects values that would break stored invariants.

use chrono::{DateTime, Utc};

use catalog_core::{CatalogError, CatalogResult};

pub const NAME_MAX_LEN: usize = 120;
pub const SKU_MAX_LEN: usize = 64;
pub const DESCRIPTION_MAX_LEN: usize = 1000;
pub const IMAGE_URL_MAX_LEN: usize = 1024;

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// `None` for absent or blank input, the value unchanged otherwise.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !is_blank(v))
}

pub fn require_name(field: &str, value: &str) -> CatalogResult<()> {
    if is_blank(value) {
        return Err(CatalogError::validation(format!("{field} cannot be empty")));
    }
    max_len(field, value, NAME_MAX_LEN)
}

pub fn max_len(field: &str, value: &str, max: usize) -> CatalogResult<()> {
    if value.chars().count() > max {
        return Err(CatalogError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

pub fn optional_max_len(field: &str, value: Option<&str>, max: usize) -> CatalogResult<()> {
    match value {
        Some(v) => max_len(field, v, max),
        None => Ok(()),
    }
}

/// ISO-4217 shaped code: exactly three ASCII letters.
pub fn currency_code(value: &str) -> CatalogResult<()> {
    if value.len() == 3 && value.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(())
    } else {
        Err(CatalogError::validation(format!(
            "currency must be a 3-letter code (got '{value}')"
        )))
    }
}

/// Caller-supplied timestamps must fit in signed 64-bit nanoseconds
/// (roughly 1677 to 2262).
pub fn storable_timestamp(field: &str, value: Option<DateTime<Utc>>) -> CatalogResult<()> {
    match value {
        Some(at) if at.timestamp_nanos_opt().is_none() => Err(CatalogError::validation(format!(
            "{field} is outside the supported range: {at}"
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn blank_values_are_normalized_away() {
        assert_eq!(non_blank(Some("  ".to_string())), None);
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some(" a ".to_string())), Some(" a ".to_string()));
    }

    #[test]
    fn length_is_counted_in_characters() {
        let name: String = "é".repeat(NAME_MAX_LEN);
        assert!(require_name("name", &name).is_ok());

        let too_long = format!("{name}e");
        assert!(matches!(
            require_name("name", &too_long),
            Err(CatalogError::Validation(_))
        ));
    }

    #[test]
    fn currency_must_be_three_letters() {
        assert!(currency_code("USD").is_ok());
        assert!(currency_code("eur").is_ok());
        assert!(currency_code("US").is_err());
        assert!(currency_code("US1").is_err());
        assert!(currency_code("USDT").is_err());
    }

    #[test]
    fn timestamps_must_fit_in_nanoseconds() {
        let recent = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        assert!(storable_timestamp("createdAt", Some(recent)).is_ok());
        assert!(storable_timestamp("createdAt", None).is_ok());

        let far_future = Utc.with_ymd_and_hms(2300, 1, 1, 0, 0, 0).unwrap();
        assert!(matches!(
            storable_timestamp("createdAt", Some(far_future)),
            Err(CatalogError::Validation(_))
        ));
        let far_past = Utc.with_ymd_and_hms(1600, 1, 1, 0, 0, 0).unwrap();
        assert!(storable_timestamp("createdAt", Some(far_past)).is_err());
    }
}
