use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

// ────────────────────────────────────────────────────────────────────────────
// Categorical attributes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    Excellent,
    #[default]
    Good,
    Fair,
    Poor,
}

impl Condition {
    pub const ALL: [Condition; 4] = [
        Condition::Excellent,
        Condition::Good,
        Condition::Fair,
        Condition::Poor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Condition::Excellent => "Excellent",
            Condition::Good => "Good",
            Condition::Fair => "Fair",
            Condition::Poor => "Poor",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Drivetrain {
    #[default]
    #[serde(rename = "2WD")]
    TwoWheel,
    #[serde(rename = "4WD")]
    FourWheel,
    #[serde(rename = "AWD")]
    AllWheel,
}

impl Drivetrain {
    pub const ALL: [Drivetrain; 3] = [
        Drivetrain::TwoWheel,
        Drivetrain::FourWheel,
        Drivetrain::AllWheel,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Drivetrain::TwoWheel => "2WD",
            Drivetrain::FourWheel => "4WD",
            Drivetrain::AllWheel => "AWD",
        }
    }

    /// Maps the registry's free-text `DriveType` ("FWD/Front-Wheel Drive", "4x4", ...)
    /// onto the three listing categories. Unrecognized text yields `None`.
    pub fn from_decoded(raw: &str) -> Option<Self> {
        let text = raw.trim().to_lowercase();
        if text.is_empty() {
            return None;
        }
        if text.contains("awd") || text.contains("all-wheel") || text.contains("all wheel") {
            Some(Drivetrain::AllWheel)
        } else if text.contains("4wd")
            || text.contains("4x4")
            || text.contains("4-wheel")
            || text.contains("four-wheel")
        {
            Some(Drivetrain::FourWheel)
        } else if text.contains("fwd")
            || text.contains("rwd")
            || text.contains("2wd")
            || text.contains("4x2")
            || text.contains("front-wheel")
            || text.contains("rear-wheel")
        {
            Some(Drivetrain::TwoWheel)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transmission {
    #[default]
    Automatic,
    Manual,
}

impl Transmission {
    pub const ALL: [Transmission; 2] = [Transmission::Automatic, Transmission::Manual];

    pub fn as_str(self) -> &'static str {
        match self {
            Transmission::Automatic => "Automatic",
            Transmission::Manual => "Manual",
        }
    }

    /// Maps the registry's `TransmissionStyle` onto Automatic / Manual.
    /// CVT, dual-clutch and automated-manual boxes count as automatic.
    pub fn from_decoded(raw: &str) -> Option<Self> {
        let text = raw.trim().to_lowercase();
        if text.is_empty() {
            return None;
        }
        if text.contains("automatic")
            || text.contains("automated")
            || text.contains("cvt")
            || text.contains("continuously variable")
            || text.contains("dual-clutch")
            || text.contains("dct")
        {
            Some(Transmission::Automatic)
        } else if text.contains("manual") || text.contains("standard") {
            Some(Transmission::Manual)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteriorType {
    #[default]
    Cloth,
    Leather,
}

impl InteriorType {
    pub const ALL: [InteriorType; 2] = [InteriorType::Cloth, InteriorType::Leather];

    pub fn as_str(self) -> &'static str {
        match self {
            InteriorType::Cloth => "Cloth",
            InteriorType::Leather => "Leather",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TitleStatus {
    #[default]
    Clean,
    Salvage,
}

impl TitleStatus {
    pub const ALL: [TitleStatus; 2] = [TitleStatus::Clean, TitleStatus::Salvage];

    pub fn as_str(self) -> &'static str {
        match self {
            TitleStatus::Clean => "Clean",
            TitleStatus::Salvage => "Salvage",
        }
    }
}

/// Parses `raw` against the canonical spellings of an enumerated field.
fn parse_choice<T: Copy>(
    raw: &str,
    all: &[T],
    as_str: fn(T) -> &'static str,
    field: &str,
) -> Result<T, AppError> {
    let raw = raw.trim();
    all.iter()
        .copied()
        .find(|v| as_str(*v) == raw)
        .ok_or_else(|| {
            let allowed: Vec<&str> = all.iter().map(|v| as_str(*v)).collect();
            AppError::Validation(format!(
                "Invalid {field} '{raw}'. Expected one of: {}",
                allowed.join(", ")
            ))
        })
}

impl FromStr for Condition {
    type Err = AppError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_choice(s, &Self::ALL, Self::as_str, "condition")
    }
}

impl FromStr for Drivetrain {
    type Err = AppError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_choice(s, &Self::ALL, Self::as_str, "drivetrain")
    }
}

impl FromStr for Transmission {
    type Err = AppError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_choice(s, &Self::ALL, Self::as_str, "transmission")
    }
}

impl FromStr for InteriorType {
    type Err = AppError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_choice(s, &Self::ALL, Self::as_str, "interior type")
    }
}

impl FromStr for TitleStatus {
    type Err = AppError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_choice(s, &Self::ALL, Self::as_str, "title status")
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Drivetrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Transmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for InteriorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TitleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Form-level selections
// ────────────────────────────────────────────────────────────────────────────

/// How the user supplies the vehicle's identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryMethod {
    #[default]
    Vin,
    Manual,
}

/// Which prompt template drives generation.
/// `Full` is a detailed professional listing, `Short` a marketplace post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptionMode {
    #[default]
    Full,
    Short,
}

// ────────────────────────────────────────────────────────────────────────────
// Records
// ────────────────────────────────────────────────────────────────────────────

/// A vehicle as sent to description generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    pub year: u16,
    pub make: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transmission: Option<Transmission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drivetrain: Option<Drivetrain>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exterior_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interior_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interior_type: Option<InteriorType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_status: Option<TitleStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

/// The always-user-supplied attributes merged onto a decoded record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingDetails {
    pub price: Option<f64>,
    pub exterior_color: Option<String>,
    pub interior_color: Option<String>,
    pub interior_type: Option<InteriorType>,
    pub title_status: Option<TitleStatus>,
}

impl VehicleRecord {
    /// Overlays listing details without touching identity fields
    /// (year, make, model, trim, engine size, transmission, drivetrain).
    pub fn with_listing_details(mut self, details: ListingDetails) -> Self {
        self.price = details.price;
        self.exterior_color = details.exterior_color;
        self.interior_color = details.interior_color;
        self.interior_type = details.interior_type;
        self.title_status = details.title_status;
        self
    }
}

/// Output of a successful submit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedDescription {
    pub text: String,
    pub mode: DescriptionMode,
}
