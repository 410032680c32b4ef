//! Farm data endpoints under `/api/v1`: weather, irrigation, market prices and
//! government schemes.

use super::{AdvisorClient, farm_types::*, types::HealthResponse};
use crate::{Error, Result};
use async_trait::async_trait;
use tracing::debug;

pub const WEATHER_PATH: &str = "/api/v1/weather/current";
pub const IRRIGATION_PATH: &str = "/api/v1/irrigation/schedule";
pub const CROP_PRICES_PATH: &str = "/api/v1/prices/crops";
pub const FERTILIZER_PRICES_PATH: &str = "/api/v1/prices/fertilizers";
pub const SCHEMES_PATH: &str = "/api/v1/schemes";
pub const ELIGIBILITY_PATH: &str = "/api/v1/schemes/eligibility";
pub const READY_PATH: &str = "/api/v1/health/ready";
pub const LIVE_PATH: &str = "/api/v1/health/live";

#[async_trait]
pub trait FarmDataApi: Send + Sync {
    async fn current_weather(&self, location: &Location) -> Result<WeatherForecast>;

    async fn irrigation_schedule(&self, request: &IrrigationRequest) -> Result<IrrigationSchedule>;

    async fn crop_prices(&self, query: &CropPriceQuery) -> Result<Vec<CropPrice>>;

    async fn fertilizer_prices(&self, query: &FertilizerPriceQuery) -> Result<Vec<FertilizerPrice>>;

    async fn government_schemes(&self, query: &SchemeQuery) -> Result<Vec<GovernmentScheme>>;

    /// Checks `profile` against `scheme_ids`, or against every scheme when `None`.
    async fn check_eligibility(
        &self,
        profile: &FarmerProfile,
        scheme_ids: Option<&[String]>,
    ) -> Result<Vec<EligibilityCheck>>;

    async fn readiness(&self) -> Result<HealthResponse>;

    async fn liveness(&self) -> Result<HealthResponse>;
}

impl AdvisorClient {
    fn api_endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }

    async fn fetch_status(&self, path: &str, operation: &str) -> Result<HealthResponse> {
        let request = self.http.get(self.api_endpoint(path));
        let response = self.execute(request, operation).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::from_transport(e, self.timeout_secs))?;
        Ok(HealthResponse::from_body(&body))
    }
}

fn require_location(location: &str) -> Result<()> {
    if location.trim().is_empty() {
        return Err(Error::validation("location must not be empty"));
    }
    Ok(())
}

#[async_trait]
impl FarmDataApi for AdvisorClient {
    async fn current_weather(&self, location: &Location) -> Result<WeatherForecast> {
        location.validate()?;
        debug!(
            "Fetching weather for ({}, {})",
            location.latitude, location.longitude
        );

        let builder = self.http.post(self.api_endpoint(WEATHER_PATH)).json(location);
        let response = self.execute(builder, "weather").await?;
        self.decode_json(response).await
    }

    async fn irrigation_schedule(&self, request: &IrrigationRequest) -> Result<IrrigationSchedule> {
        request.validate()?;
        debug!(
            "Requesting irrigation schedule for {} at stage {}",
            request.crop_type, request.crop_stage
        );

        let builder = self.http.post(self.api_endpoint(IRRIGATION_PATH)).json(request);
        let response = self.execute(builder, "irrigation schedule").await?;
        self.decode_json(response).await
    }

    async fn crop_prices(&self, query: &CropPriceQuery) -> Result<Vec<CropPrice>> {
        require_location(&query.location)?;
        debug!("Fetching crop prices for {}", query.location);

        let builder = self.http.get(self.api_endpoint(CROP_PRICES_PATH)).query(query);
        let response = self.execute(builder, "crop prices").await?;
        self.decode_json(response).await
    }

    async fn fertilizer_prices(&self, query: &FertilizerPriceQuery) -> Result<Vec<FertilizerPrice>> {
        require_location(&query.location)?;
        debug!("Fetching fertilizer prices for {}", query.location);

        let builder = self
            .http
            .get(self.api_endpoint(FERTILIZER_PRICES_PATH))
            .query(query);
        let response = self.execute(builder, "fertilizer prices").await?;
        self.decode_json(response).await
    }

    async fn government_schemes(&self, query: &SchemeQuery) -> Result<Vec<GovernmentScheme>> {
        debug!("Fetching government schemes");

        let builder = self.http.get(self.api_endpoint(SCHEMES_PATH)).query(query);
        let response = self.execute(builder, "government schemes").await?;
        self.decode_json(response).await
    }

    async fn check_eligibility(
        &self,
        profile: &FarmerProfile,
        scheme_ids: Option<&[String]>,
    ) -> Result<Vec<EligibilityCheck>> {
        profile.validate()?;
        debug!("Checking scheme eligibility for farmer {}", profile.farmer_id);

        let body = EligibilityRequest {
            farmer_profile: profile,
            scheme_ids,
        };
        let builder = self.http.post(self.api_endpoint(ELIGIBILITY_PATH)).json(&body);
        let response = self.execute(builder, "eligibility check").await?;
        let checks: Vec<EligibilityCheck> = self.decode_json(response).await?;

        if let Some(bad) = checks.iter().find(|c| !c.is_valid_score()) {
            return Err(Error::invalid_response(format!(
                "eligibility score {} for {} is outside [0, 1]",
                bad.eligibility_score, bad.scheme_id
            )));
        }

        Ok(checks)
    }

    async fn readiness(&self) -> Result<HealthResponse> {
        self.fetch_status(READY_PATH, "readiness check").await
    }

    async fn liveness(&self) -> Result<HealthResponse> {
        self.fetch_status(LIVE_PATH, "liveness check").await
    }
}
