//! External lookups behind the form: make and model option lists, VIN decoding and
//! description generation.
//!
//! Every operation validates its inputs before touching the network and maps failures onto
//! the `AppError` taxonomy with a message fit for display next to the affected control.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::ChatCompletion;
use crate::vehicle::models::{Condition, DescriptionMode, Drivetrain, Transmission, VehicleRecord};
use crate::vehicle::prompts::render_description_prompt;
use crate::vehicle::registry::{RegistryError, VehicleRegistry};
use crate::vehicle::schemas;

/// Manufacturers offered for every model year. The registry is not consulted for makes.
pub const COMMON_MAKES: [&str; 31] = [
    "Acura",
    "Audi",
    "BMW",
    "Buick",
    "Cadillac",
    "Chevrolet",
    "Chrysler",
    "Dodge",
    "Ford",
    "GMC",
    "Honda",
    "Hyundai",
    "Infiniti",
    "Jaguar",
    "Jeep",
    "Kia",
    "Land Rover",
    "Lexus",
    "Lincoln",
    "Mazda",
    "Mercedes-Benz",
    "MINI",
    "Mitsubishi",
    "Nissan",
    "Porsche",
    "Ram",
    "Subaru",
    "Tesla",
    "Toyota",
    "Volkswagen",
    "Volvo",
];

pub const EXTERIOR_COLORS: [&str; 16] = [
    "Black", "White", "Silver", "Gray", "Red", "Blue", "Green", "Brown", "Gold", "Beige",
    "Yellow", "Orange", "Purple", "Bronze", "Burgundy", "Navy",
];

pub const INTERIOR_COLORS: [&str; 9] = [
    "Black", "Gray", "Beige", "Brown", "Tan", "White", "Red", "Blue", "Cream",
];

pub const MISSING_API_KEY: &str =
    "OpenAI API key not configured. Please add your API key to the .env file.";
/// Returned as the description when the service answers without any text.
pub const EMPTY_COMPLETION_FALLBACK: &str = "Failed to generate description";

#[derive(Debug, Clone, Serialize)]
pub struct CommonColors {
    pub exterior: Vec<&'static str>,
    pub interior: Vec<&'static str>,
}

/// Entry point for every external lookup the form performs.
///
/// The generation backend is optional: `None` means no credential was configured and
/// `generate_description` fails with a configuration error before doing anything else.
#[derive(Clone)]
pub struct VehicleLookup {
    registry: Arc<dyn VehicleRegistry>,
    generator: Option<Arc<dyn ChatCompletion>>,
}

impl VehicleLookup {
    pub fn new(
        registry: Arc<dyn VehicleRegistry>,
        generator: Option<Arc<dyn ChatCompletion>>,
    ) -> Self {
        Self {
            registry,
            generator,
        }
    }

    pub fn generation_enabled(&self) -> bool {
        self.generator.is_some()
    }

    pub async fn list_makes_for_year(&self, year: i32) -> Result<Vec<String>, AppError> {
        schemas::validate_year(year)
            .map_err(|_| AppError::Validation("Invalid year selected".to_string()))?;
        Ok(COMMON_MAKES.iter().map(|m| m.to_string()).collect())
    }

    /// Distinct model names for `make` in `year`, sorted ascending.
    pub async fn list_models_for_make_year(
        &self,
        make: &str,
        year: i32,
    ) -> Result<Vec<String>, AppError> {
        let invalid = |_| AppError::Validation("Invalid make or year selected".to_string());
        let year = schemas::validate_year(year).map_err(invalid)?;
        let make = schemas::validate_make(make).map_err(invalid)?;

        let response = self
            .registry
            .models_for_make_year(&make, year)
            .await
            .map_err(|e| match e {
                RegistryError::Status { reason, .. } => {
                    AppError::Lookup(format!("Failed to fetch models: {reason}"))
                }
                other => {
                    warn!("Model lookup for {make} {year} failed: {other}");
                    AppError::Lookup("Failed to fetch models".to_string())
                }
            })?;

        if response.results.is_empty() {
            return Err(AppError::Lookup(
                "No models found for the selected make and year".to_string(),
            ));
        }

        let models: BTreeSet<String> = response
            .results
            .into_iter()
            .map(|entry| entry.model_name)
            .collect();

        Ok(models.into_iter().collect())
    }

    /// Decodes a VIN into identity attributes. A non-zero registry error code discards
    /// the whole result.
    pub async fn decode_vin(&self, vin: &str) -> Result<VehicleRecord, AppError> {
        let vin = schemas::validate_vin(vin).map_err(|_| {
            AppError::Validation("Invalid VIN format. Please enter a 17-character VIN.".to_string())
        })?;

        let response = self.registry.decode_vin(&vin).await.map_err(|e| {
            warn!("VIN decode for {vin} failed: {e}");
            AppError::Lookup("Failed to decode VIN".to_string())
        })?;

        let result = response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Lookup("Failed to decode VIN".to_string()))?;

        if result.error_code.trim() != "0" {
            let message = non_empty(result.error_text)
                .unwrap_or_else(|| "Invalid VIN".to_string());
            return Err(AppError::Lookup(message));
        }

        let year = result
            .model_year
            .trim()
            .parse::<i32>()
            .ok()
            .and_then(|y| schemas::validate_year(y).ok())
            .ok_or_else(|| {
                AppError::Lookup(format!(
                    "VIN decoded without a usable model year ('{}')",
                    result.model_year
                ))
            })?;

        let record = VehicleRecord {
            year,
            make: result.make.trim().to_string(),
            model: result.model.trim().to_string(),
            trim: non_empty(result.trim),
            engine_size: non_empty(result.displacement_l),
            transmission: Transmission::from_decoded(&result.transmission_style),
            drivetrain: Drivetrain::from_decoded(&result.drive_type),
            ..Default::default()
        };

        info!(
            "Decoded VIN {vin}: {} {} {}",
            record.year, record.make, record.model
        );
        Ok(record)
    }

    pub async fn generate_description(
        &self,
        record: &VehicleRecord,
        miles: i64,
        condition: &str,
        additional_details: &str,
        mode: DescriptionMode,
    ) -> Result<String, AppError> {
        let generator = self
            .generator
            .as_ref()
            .ok_or_else(|| AppError::Configuration(MISSING_API_KEY.to_string()))?;

        let invalid =
            |_| AppError::Validation("Invalid input data. Please check your entries.".to_string());
        let miles = schemas::validate_miles(miles).map_err(invalid)?;
        let condition = condition.parse::<Condition>().map_err(invalid)?;

        let prompt = render_description_prompt(record, miles, condition, additional_details, mode);

        let text = generator.complete(&prompt).await.map_err(|e| {
            AppError::Generation(format!("Failed to generate description: {e}"))
        })?;

        Ok(text.unwrap_or_else(|| EMPTY_COMPLETION_FALLBACK.to_string()))
    }

    pub fn common_colors(&self) -> CommonColors {
        CommonColors {
            exterior: EXTERIOR_COLORS.to_vec(),
            interior: INTERIOR_COLORS.to_vec(),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::vehicle::registry::DecodedVin;

    fn lookup(registry: FakeRegistry) -> (VehicleLookup, Arc<FakeRegistry>) {
        let registry = Arc::new(registry);
        (VehicleLookup::new(registry.clone(), None), registry)
    }

    #[tokio::test]
    async fn test_makes_invalid_years_rejected() {
        let (lookup, _) = lookup(FakeRegistry::default());
        for year in [0, 1899, schemas::max_year() + 1, 3000] {
            match lookup.list_makes_for_year(year).await {
                Err(AppError::Validation(msg)) => assert_eq!(msg, "Invalid year selected"),
                other => panic!("year {year}: unexpected {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_makes_same_list_for_every_valid_year() {
        let (lookup, registry) = lookup(FakeRegistry::default());
        let first = lookup.list_makes_for_year(1900).await.unwrap();
        let latest = lookup
            .list_makes_for_year(schemas::max_year())
            .await
            .unwrap();
        assert_eq!(first, latest);
        assert_eq!(first.len(), 31);
        assert_eq!(first.first().map(String::as_str), Some("Acura"));
        assert!(first.contains(&"Toyota".to_string()));
        assert_eq!(registry.call_count(), 0);
    }

    #[tokio::test]
    async fn test_models_deduplicated_and_sorted() {
        let (lookup, _) = lookup(FakeRegistry::default().with_models(
            "Toyota",
            2020,
            &["RAV4", "Corolla", "Camry", "Corolla"],
        ));
        let models = lookup.list_models_for_make_year("Toyota", 2020).await.unwrap();
        assert_eq!(models, vec!["Camry", "Corolla", "RAV4"]);
    }

    #[tokio::test]
    async fn test_models_dedup_is_case_sensitive() {
        let (lookup, _) = lookup(FakeRegistry::default().with_models(
            "Ford",
            2015,
            &["F-150", "f-150", "F-150"],
        ));
        let models = lookup.list_models_for_make_year("Ford", 2015).await.unwrap();
        assert_eq!(models, vec!["F-150", "f-150"]);
    }

    #[tokio::test]
    async fn test_models_empty_result_is_lookup_error() {
        let (lookup, _) = lookup(FakeRegistry::default());
        match lookup.list_models_for_make_year("Toyota", 2020).await {
            Err(AppError::Lookup(msg)) => {
                assert_eq!(msg, "No models found for the selected make and year")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_models_http_failure_carries_status_text() {
        let (lookup, _) =
            lookup(FakeRegistry::default().failing(503, "Service Unavailable"));
        match lookup.list_models_for_make_year("Toyota", 2020).await {
            Err(AppError::Lookup(msg)) => {
                assert_eq!(msg, "Failed to fetch models: Service Unavailable")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_models_invalid_input_skips_network() {
        let (lookup, registry) = lookup(FakeRegistry::default());
        for (make, year) in [("", 2020), ("Toyota", 1800)] {
            match lookup.list_models_for_make_year(make, year).await {
                Err(AppError::Validation(msg)) => assert_eq!(msg, "Invalid make or year selected"),
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(registry.call_count(), 0);
    }

    #[tokio::test]
    async fn test_decode_vin_wrong_length_skips_network() {
        let (lookup, registry) = lookup(FakeRegistry::default());
        for vin in ["", "1HGCM82633A00435", "1HGCM82633A0043521"] {
            match lookup.decode_vin(vin).await {
                Err(AppError::Validation(msg)) => {
                    assert_eq!(msg, "Invalid VIN format. Please enter a 17-character VIN.")
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(registry.call_count(), 0);
    }

    #[tokio::test]
    async fn test_decode_vin_maps_fields() {
        let (lookup, _) = lookup(FakeRegistry::default().with_decode(ACCORD_VIN, accord_decode()));
        let record = lookup.decode_vin(ACCORD_VIN).await.unwrap();
        assert_eq!(record.year, 2003);
        assert_eq!(record.make, "HONDA");
        assert_eq!(record.model, "Accord");
        assert_eq!(record.trim.as_deref(), Some("EX"));
        assert_eq!(record.engine_size.as_deref(), Some("2.4"));
        assert_eq!(record.transmission, Some(Transmission::Automatic));
        assert_eq!(record.drivetrain, Some(Drivetrain::TwoWheel));
        assert_eq!(record.price, None);
    }

    #[tokio::test]
    async fn test_decode_vin_minimal_response() {
        let decoded = DecodedVin {
            error_code: "0".to_string(),
            model_year: "2003".to_string(),
            make: "HONDA".to_string(),
            model: "Accord".to_string(),
            ..Default::default()
        };
        let (lookup, _) = lookup(FakeRegistry::default().with_decode(ACCORD_VIN, decoded));
        let record = lookup.decode_vin(ACCORD_VIN).await.unwrap();
        assert_eq!(
            (record.year, record.make.as_str(), record.model.as_str()),
            (2003, "HONDA", "Accord")
        );
        assert_eq!(record.trim, None);
        assert_eq!(record.transmission, None);
        assert_eq!(record.drivetrain, None);
    }

    #[tokio::test]
    async fn test_decode_vin_error_code_uses_service_message() {
        let (lookup, _) = lookup(FakeRegistry::default());
        match lookup.decode_vin(ACCORD_VIN).await {
            Err(AppError::Lookup(msg)) => assert!(msg.contains("Check Digit")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_decode_vin_error_code_without_text() {
        let decoded = DecodedVin {
            error_code: "11".to_string(),
            ..accord_decode()
        };
        let (lookup, _) = lookup(FakeRegistry::default().with_decode(ACCORD_VIN, decoded));
        match lookup.decode_vin(ACCORD_VIN).await {
            Err(AppError::Lookup(msg)) => assert_eq!(msg, "Invalid VIN"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_decode_vin_transport_failure() {
        let (lookup, _) = lookup(FakeRegistry::default().failing(500, "Internal Server Error"));
        match lookup.decode_vin(ACCORD_VIN).await {
            Err(AppError::Lookup(msg)) => assert_eq!(msg, "Failed to decode VIN"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_decode_vin_unusable_year() {
        let decoded = DecodedVin {
            model_year: "".to_string(),
            ..accord_decode()
        };
        let (lookup, _) = lookup(FakeRegistry::default().with_decode(ACCORD_VIN, decoded));
        assert!(matches!(
            lookup.decode_vin(ACCORD_VIN).await,
            Err(AppError::Lookup(_))
        ));
    }

    fn record() -> VehicleRecord {
        VehicleRecord {
            year: 2020,
            make: "Toyota".to_string(),
            model: "Camry".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_generate_without_credential() {
        let (lookup, _) = lookup(FakeRegistry::default());
        assert!(!lookup.generation_enabled());
        match lookup
            .generate_description(&record(), 1000, "Good", "", DescriptionMode::Full)
            .await
        {
            Err(AppError::Configuration(msg)) => assert!(msg.contains("API key")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_validates_miles_and_condition() {
        let completion = Arc::new(FakeCompletion::replying("Great car"));
        let lookup =
            VehicleLookup::new(Arc::new(FakeRegistry::default()), Some(completion.clone()));

        for (miles, condition) in [(-1, "Good"), (10, "Mint")] {
            match lookup
                .generate_description(&record(), miles, condition, "", DescriptionMode::Full)
                .await
            {
                Err(AppError::Validation(msg)) => {
                    assert_eq!(msg, "Invalid input data. Please check your entries.")
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        assert!(completion.last_prompt().is_none());
    }

    #[tokio::test]
    async fn test_generate_returns_completion_text() {
        let completion = Arc::new(FakeCompletion::replying("A reliable sedan."));
        let lookup =
            VehicleLookup::new(Arc::new(FakeRegistry::default()), Some(completion.clone()));

        let text = lookup
            .generate_description(
                &record(),
                30_000,
                "Excellent",
                "One owner",
                DescriptionMode::Short,
            )
            .await
            .unwrap();
        assert_eq!(text, "A reliable sedan.");

        let prompt = completion.last_prompt().unwrap();
        assert!(prompt.contains("Facebook Marketplace"));
        assert!(prompt.contains("30,000 miles"));
        assert!(prompt.contains("Contact for price"));
    }

    #[tokio::test]
    async fn test_generate_empty_completion_falls_back() {
        let completion = Arc::new(FakeCompletion::default());
        let lookup = VehicleLookup::new(Arc::new(FakeRegistry::default()), Some(completion));
        let text = lookup
            .generate_description(&record(), 0, "Good", "", DescriptionMode::Full)
            .await
            .unwrap();
        assert_eq!(text, EMPTY_COMPLETION_FALLBACK);
    }

    #[tokio::test]
    async fn test_generate_service_failure() {
        let completion = Arc::new(FakeCompletion {
            fail: true,
            ..Default::default()
        });
        let lookup = VehicleLookup::new(Arc::new(FakeRegistry::default()), Some(completion));
        match lookup
            .generate_description(&record(), 0, "Good", "", DescriptionMode::Full)
            .await
        {
            Err(AppError::Generation(msg)) => {
                assert!(msg.starts_with("Failed to generate description"))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_common_colors() {
        let (lookup, _) = lookup(FakeRegistry::default());
        let colors = lookup.common_colors();
        assert_eq!(colors.exterior.len(), 16);
        assert_eq!(colors.interior.len(), 9);
        assert!(colors.interior.contains(&"Tan"));
    }
}
