//! Field rules for vehicle input. Every function is pure: it returns the normalized value
//! or an `AppError::Validation` naming the violated constraint.
//!
//! Categorical fields (condition, drivetrain, ...) are parsed via `FromStr` on their enums
//! in `vehicle::models`.

use chrono::{Datelike, Utc};

use crate::errors::AppError;

pub const VIN_LENGTH: usize = 17;
pub const MIN_YEAR: i32 = 1900;

/// The calendar year used for the upper bound of `validate_year` and for new drafts.
pub fn current_year() -> i32 {
    Utc::now().year()
}

/// Newest model year accepted: next year's models go on sale early.
pub fn max_year() -> i32 {
    current_year() + 1
}

pub fn validate_vin(vin: &str) -> Result<String, AppError> {
    let vin = vin.trim();
    if vin.chars().count() != VIN_LENGTH {
        return Err(AppError::Validation(format!(
            "VIN must be exactly {VIN_LENGTH} characters"
        )));
    }
    Ok(vin.to_string())
}

pub fn validate_year(year: i32) -> Result<u16, AppError> {
    let max = max_year();
    if !(MIN_YEAR..=max).contains(&year) {
        return Err(AppError::Validation(format!(
            "Year must be between {MIN_YEAR} and {max}"
        )));
    }
    // Range check above keeps this within u16.
    Ok(year as u16)
}

pub fn validate_make(make: &str) -> Result<String, AppError> {
    non_empty(make, "Make")
}

pub fn validate_model(model: &str) -> Result<String, AppError> {
    non_empty(model, "Model")
}

pub fn validate_miles(miles: i64) -> Result<u32, AppError> {
    u32::try_from(miles)
        .map_err(|_| AppError::Validation("Mileage must be a non-negative number".to_string()))
}

pub fn validate_price(price: f64) -> Result<f64, AppError> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::Validation(
            "Price must be a non-negative number".to_string(),
        ));
    }
    Ok(price)
}

fn non_empty(value: &str, field: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vin_exact_length() {
        assert_eq!(validate_vin("1HGCM82633A004352").unwrap(), "1HGCM82633A004352");
        assert_eq!(
            validate_vin("  1HGCM82633A004352 ").unwrap(),
            "1HGCM82633A004352"
        );
    }

    #[test]
    fn test_vin_wrong_length() {
        assert!(validate_vin("").is_err());
        assert!(validate_vin("1HGCM82633A00435").is_err());
        assert!(validate_vin("1HGCM82633A0043521").is_err());
    }

    #[test]
    fn test_year_bounds() {
        assert_eq!(validate_year(1900).unwrap(), 1900);
        assert_eq!(validate_year(max_year()).unwrap() as i32, max_year());
        assert!(validate_year(1899).is_err());
        assert!(validate_year(max_year() + 1).is_err());
        assert!(validate_year(-5).is_err());
    }

    #[test]
    fn test_make_and_model_required() {
        assert_eq!(validate_make(" Toyota ").unwrap(), "Toyota");
        assert!(validate_make("").is_err());
        assert!(validate_model("   ").is_err());
        match validate_model("") {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "Model is required"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_miles_non_negative() {
        assert_eq!(validate_miles(0).unwrap(), 0);
        assert_eq!(validate_miles(45_000).unwrap(), 45_000);
        assert!(validate_miles(-1).is_err());
    }

    #[test]
    fn test_price_non_negative_and_finite() {
        assert_eq!(validate_price(0.0).unwrap(), 0.0);
        assert_eq!(validate_price(12_500.5).unwrap(), 12_500.5);
        assert!(validate_price(-0.01).is_err());
        assert!(validate_price(f64::NAN).is_err());
        assert!(validate_price(f64::INFINITY).is_err());
    }
}
