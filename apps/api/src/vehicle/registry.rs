//! Client for the NHTSA vPIC vehicle registry (VIN decoding and model listings).
//!
//! Only transport and wire-format concerns live here. Interpreting the payload
//! (error codes, dedup, field mapping) belongs to `vehicle::lookup`.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{reason} (status {status})")]
    Status { status: u16, reason: String },

    #[error("Invalid registry URL: {0}")]
    InvalidUrl(String),
}

/// `GET /DecodeVinValues/{vin}` payload. Only the fields the listing needs are read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DecodeVinResponse {
    #[serde(rename = "Results", default)]
    pub results: Vec<DecodedVin>,
}

/// One flat decode result. The registry reports unknown attributes as empty strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DecodedVin {
    #[serde(rename = "ErrorCode", default)]
    pub error_code: String,
    #[serde(rename = "ErrorText", default)]
    pub error_text: String,
    #[serde(rename = "ModelYear", default)]
    pub model_year: String,
    #[serde(rename = "Make", default)]
    pub make: String,
    #[serde(rename = "Model", default)]
    pub model: String,
    #[serde(rename = "Trim", default)]
    pub trim: String,
    #[serde(rename = "DisplacementL", default)]
    pub displacement_l: String,
    #[serde(rename = "TransmissionStyle", default)]
    pub transmission_style: String,
    #[serde(rename = "DriveType", default)]
    pub drive_type: String,
}

/// `GET /GetModelsForMakeYear/...` payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelsResponse {
    #[serde(rename = "Results", default)]
    pub results: Vec<ModelEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelEntry {
    #[serde(rename = "Model_Name", default)]
    pub model_name: String,
}

/// The registry operations the lookup layer depends on.
#[async_trait]
pub trait VehicleRegistry: Send + Sync {
    async fn decode_vin(&self, vin: &str) -> Result<DecodeVinResponse, RegistryError>;

    async fn models_for_make_year(
        &self,
        make: &str,
        year: u16,
    ) -> Result<ModelsResponse, RegistryError>;
}

#[derive(Clone)]
pub struct NhtsaClient {
    client: Client,
    base_url: String,
}

impl NhtsaClient {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    /// Appends path segments (percent-encoded) and `?format=json` to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, RegistryError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| RegistryError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| RegistryError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut().append_pair("format", "json");
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, RegistryError> {
        debug!("GET {url}");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::Status {
                status: status.as_u16(),
                reason: status
                    .canonical_reason()
                    .unwrap_or("Unknown status")
                    .to_string(),
            });
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl VehicleRegistry for NhtsaClient {
    async fn decode_vin(&self, vin: &str) -> Result<DecodeVinResponse, RegistryError> {
        let url = self.endpoint(&["DecodeVinValues", vin])?;
        self.get_json(url).await
    }

    async fn models_for_make_year(
        &self,
        make: &str,
        year: u16,
    ) -> Result<ModelsResponse, RegistryError> {
        let year = year.to_string();
        let url = self.endpoint(&["GetModelsForMakeYear", "make", make, "modelyear", &year])?;
        self.get_json(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> NhtsaClient {
        NhtsaClient::new(Client::new(), base.to_string())
    }

    #[test]
    fn test_decode_endpoint() {
        let url = client("https://vpic.nhtsa.dot.gov/api/vehicles")
            .endpoint(&["DecodeVinValues", "1HGCM82633A004352"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://vpic.nhtsa.dot.gov/api/vehicles/DecodeVinValues/1HGCM82633A004352?format=json"
        );
    }

    #[test]
    fn test_models_endpoint_encodes_make() {
        let url = client("https://vpic.nhtsa.dot.gov/api/vehicles/")
            .endpoint(&["GetModelsForMakeYear", "make", "Land Rover", "modelyear", "2020"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://vpic.nhtsa.dot.gov/api/vehicles/GetModelsForMakeYear/make/Land%20Rover/modelyear/2020?format=json"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            client("not a url").endpoint(&["DecodeVinValues"]),
            Err(RegistryError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_decode_payload_defaults_missing_fields() {
        let response: DecodeVinResponse = serde_json::from_str(
            r#"{"Count":1,"Results":[{"ErrorCode":"0","ModelYear":"2003","Make":"HONDA","Model":"Accord"}]}"#,
        )
        .unwrap();
        let result = &response.results[0];
        assert_eq!(result.error_code, "0");
        assert_eq!(result.make, "HONDA");
        assert_eq!(result.trim, "");
        assert_eq!(result.drive_type, "");
    }

    #[test]
    fn test_models_payload() {
        let response: ModelsResponse = serde_json::from_str(
            r#"{"Count":2,"Results":[{"Make_ID":448,"Make_Name":"TOYOTA","Model_ID":2469,"Model_Name":"Camry"},{"Model_Name":"RAV4"}]}"#,
        )
        .unwrap();
        let names: Vec<&str> = response
            .results
            .iter()
            .map(|m| m.model_name.as_str())
            .collect();
        assert_eq!(names, vec!["Camry", "RAV4"]);
    }
}
