use super::types::{lenient_date, lenient_timestamp};
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::HashMap, fmt, time::Duration};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub village_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            village_name: None,
            district: None,
            state: None,
        }
    }

    pub fn with_district(mut self, district: impl Into<String>, state: impl Into<String>) -> Self {
        self.district = Some(district.into());
        self.state = Some(state.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(Error::validation(format!(
                "latitude {} is outside [-90, 90]",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(Error::validation(format!(
                "longitude {} is outside [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherData {
    #[serde(deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub wind_direction: String,
    pub precipitation: f64,
    pub precipitation_probability: f64,
    pub weather_condition: String,
    pub weather_description: String,
    pub visibility: f64,
    pub uv_index: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherForecast {
    pub location: Location,
    #[serde(default)]
    pub current_weather: WeatherData,
    #[serde(default)]
    pub hourly_forecast: Vec<WeatherData>,
    #[serde(default)]
    pub daily_forecast: Vec<WeatherData>,
    #[serde(default)]
    pub farming_advisory: Vec<String>,
    #[serde(default)]
    pub alerts: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrigationRequest {
    pub location: Location,
    pub crop_type: String,
    pub crop_stage: String,
    pub planting_date: DateTime<Utc>,
    /// Acres.
    pub field_size: f64,
    pub soil_type: String,
    pub irrigation_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_irrigation_date: Option<DateTime<Utc>>,
}

impl IrrigationRequest {
    pub fn new(
        location: Location,
        crop_type: impl Into<String>,
        crop_stage: impl Into<String>,
        planting_date: DateTime<Utc>,
        field_size: f64,
        soil_type: impl Into<String>,
    ) -> Self {
        Self {
            location,
            crop_type: crop_type.into(),
            crop_stage: crop_stage.into(),
            planting_date,
            field_size,
            soil_type: soil_type.into(),
            irrigation_method: "drip".to_string(),
            last_irrigation_date: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.location.validate()?;
        if self.crop_type.trim().is_empty() {
            return Err(Error::validation("crop_type must not be empty"));
        }
        if !(self.field_size.is_finite() && self.field_size > 0.0) {
            return Err(Error::validation(format!(
                "field_size must be positive, got {}",
                self.field_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IrrigationSchedule {
    pub crop_type: String,
    pub crop_stage: String,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub next_irrigation_date: Option<DateTime<Utc>>,
    /// Minutes.
    pub irrigation_duration: i64,
    /// Litres.
    pub water_requirement: f64,
    pub irrigation_method: String,
    pub soil_moisture_level: f64,
    pub recommendations: Vec<String>,
    pub water_conservation_tips: Vec<String>,
}

impl IrrigationSchedule {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.irrigation_duration.max(0) as u64 * 60)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropPriceQuery {
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variety: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl CropPriceQuery {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            crop_name: None,
            variety: None,
            limit: None,
        }
    }

    pub fn crop(mut self, crop_name: impl Into<String>) -> Self {
        self.crop_name = Some(crop_name.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FertilizerPriceQuery {
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fertilizer_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl FertilizerPriceQuery {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            fertilizer_type: None,
            brand: None,
            limit: None,
        }
    }

    pub fn fertilizer_type(mut self, fertilizer_type: impl Into<String>) -> Self {
        self.fertilizer_type = Some(fertilizer_type.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropPrice {
    pub crop_name: String,
    pub variety: String,
    pub price_per_quintal: f64,
    pub market_name: String,
    pub location: String,
    pub grade: String,
    pub moisture_content: f64,
    pub arrival_quantity: f64,
    pub price_trend: String,
    pub min_price: f64,
    pub max_price: f64,
    pub modal_price: f64,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FertilizerPrice {
    pub fertilizer_name: String,
    pub fertilizer_type: String,
    pub price_per_kg: f64,
    pub brand: String,
    pub composition: String,
    pub location: String,
    pub dealer_name: String,
    pub dealer_contact: Option<String>,
    /// `in_stock`, `limited` or `out_of_stock`.
    pub availability: String,
    pub subsidized_price: Option<f64>,
    pub market_price: f64,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl FertilizerPrice {
    /// What the farmer saves per kg when a subsidised price applies.
    pub fn subsidy_per_kg(&self) -> Option<f64> {
        self.subsidized_price
            .map(|subsidized| (self.market_price - subsidized).max(0.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemeCategory {
    Subsidy,
    Loan,
    Insurance,
    Training,
    Equipment,
    Seed,
    Fertilizer,
    Irrigation,
    CropSupport,
    #[serde(other)]
    Other,
}

impl SchemeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subsidy => "subsidy",
            Self::Loan => "loan",
            Self::Insurance => "insurance",
            Self::Training => "training",
            Self::Equipment => "equipment",
            Self::Seed => "seed",
            Self::Fertilizer => "fertilizer",
            Self::Irrigation => "irrigation",
            Self::CropSupport => "crop_support",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for SchemeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemeQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<SchemeCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub active_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl Default for SchemeQuery {
    fn default() -> Self {
        Self {
            category: None,
            state: None,
            location: None,
            active_only: true,
            limit: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernmentScheme {
    pub scheme_id: String,
    pub scheme_name: String,
    #[serde(default)]
    pub scheme_name_local: Option<String>,
    pub category: SchemeCategory,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub description_local: Option<String>,
    #[serde(default)]
    pub ministry: String,
    /// `None` for central schemes.
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub benefit_amount: Option<f64>,
    #[serde(default)]
    pub benefit_type: String,
    #[serde(default)]
    pub eligibility_criteria: Vec<String>,
    #[serde(default)]
    pub required_documents: Vec<String>,
    #[serde(default)]
    pub application_process: String,
    #[serde(default, deserialize_with = "lenient_date")]
    pub application_deadline: Option<NaiveDate>,
    #[serde(default)]
    pub scheme_duration: Option<String>,
    #[serde(default)]
    pub official_website: Option<String>,
    #[serde(default)]
    pub contact_information: HashMap<String, String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl GovernmentScheme {
    pub fn is_central(&self) -> bool {
        self.state.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmerProfile {
    pub farmer_id: String,
    pub name: String,
    pub age: u32,
    pub gender: String,
    /// general, obc, sc or st.
    pub category: String,
    /// Acres.
    pub land_holding: f64,
    pub annual_income: f64,
    pub location: String,
    pub state: String,
    pub district: String,
    pub village: String,
    pub education_level: String,
    pub farming_experience: u32,
    pub primary_crops: Vec<String>,
    #[serde(default)]
    pub has_kisan_card: bool,
    #[serde(default = "default_true")]
    pub has_aadhaar: bool,
    #[serde(default = "default_true")]
    pub has_bank_account: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_marginal_farmer: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_small_farmer: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandHolding {
    /// Up to 2.5 acres.
    Marginal,
    /// Up to 5 acres.
    Small,
    Other,
}

impl FarmerProfile {
    pub fn land_holding_class(&self) -> LandHolding {
        if self.land_holding <= 2.5 {
            LandHolding::Marginal
        } else if self.land_holding <= 5.0 {
            LandHolding::Small
        } else {
            LandHolding::Other
        }
    }

    /// Fills the marginal/small flags from the holding size.
    pub fn with_holding_flags(mut self) -> Self {
        let class = self.land_holding_class();
        self.is_marginal_farmer = Some(class == LandHolding::Marginal);
        self.is_small_farmer = Some(class == LandHolding::Small);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.farmer_id.trim().is_empty() {
            return Err(Error::validation("farmer_id must not be empty"));
        }
        if !(self.land_holding.is_finite() && self.land_holding >= 0.0) {
            return Err(Error::validation(format!(
                "land_holding must not be negative, got {}",
                self.land_holding
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct EligibilityRequest<'a> {
    pub farmer_profile: &'a FarmerProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme_ids: Option<&'a [String]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityStatus {
    Eligible,
    NotEligible,
    PartiallyEligible,
    PendingVerification,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityCheck {
    pub scheme_id: String,
    pub scheme_name: String,
    pub eligibility_status: EligibilityStatus,
    /// In `[0, 1]`.
    pub eligibility_score: f64,
    #[serde(default)]
    pub eligible_benefits: Vec<String>,
    #[serde(default)]
    pub missing_criteria: Vec<String>,
    #[serde(default)]
    pub required_documents: Vec<String>,
    #[serde(default)]
    pub estimated_benefit: Option<f64>,
    #[serde(default)]
    pub application_steps: Vec<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl EligibilityCheck {
    pub fn is_valid_score(&self) -> bool {
        self.eligibility_score.is_finite() && (0.0..=1.0).contains(&self.eligibility_score)
    }
}

fn default_true() -> bool {
    true
}
