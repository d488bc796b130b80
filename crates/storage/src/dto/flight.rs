use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::common::lenient_f64;
use crate::models::{
    CaptureOutcome, Disqualifications, FlightData, FlightRecord, TechnicalPenalties,
};
use crate::services::scoring::ScoreBreakdown;

pub const MAX_CLEAN_RETRIEVAL_BONUS: f64 = 4.0;
pub const MAX_DIVE_AESTHETICS_PENALTY: f64 = 5.0;

/// Request payload for recording or editing a flight.
///
/// Numeric fields never fail validation: unusable values read as zero.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(default)]
pub struct FlightRequest {
    #[validate(length(max = 255, message = "Falconer name must be at most 255 characters"))]
    pub falconer_name: String,

    #[validate(length(max = 255, message = "Falcon name must be at most 255 characters"))]
    pub falcon_name: String,

    #[serde(deserialize_with = "lenient_f64")]
    pub flight_duration_secs: f64,

    #[serde(deserialize_with = "lenient_f64")]
    pub courtesy_time_secs: f64,

    #[serde(deserialize_with = "lenient_f64")]
    pub manual_duration_secs: f64,

    #[serde(deserialize_with = "lenient_f64")]
    pub dive_speed_kmh: f64,

    #[serde(deserialize_with = "lenient_f64")]
    pub service_height_m: f64,

    #[serde(deserialize_with = "lenient_f64")]
    pub service_distance_m: f64,

    pub capture: Option<CaptureOutcome>,

    /// Whole points between 0 and 4
    #[serde(deserialize_with = "lenient_f64")]
    pub clean_retrieval_bonus: f64,

    /// 0 to 5 in half point steps
    #[serde(deserialize_with = "lenient_f64")]
    pub dive_aesthetics_penalty: f64,

    pub penalties: TechnicalPenalties,

    pub disqualifications: Disqualifications,
}

impl FlightRequest {
    /// Bring the manual marks onto their scales and trim names
    pub fn into_flight_data(self) -> FlightData {
        FlightData {
            falconer_name: self.falconer_name.trim().to_string(),
            falcon_name: self.falcon_name.trim().to_string(),
            flight_duration_secs: self.flight_duration_secs,
            courtesy_time_secs: self.courtesy_time_secs,
            manual_duration_secs: self.manual_duration_secs,
            dive_speed_kmh: self.dive_speed_kmh,
            service_height_m: self.service_height_m,
            service_distance_m: self.service_distance_m,
            capture: self.capture,
            clean_retrieval_bonus: self
                .clean_retrieval_bonus
                .round()
                .clamp(0.0, MAX_CLEAN_RETRIEVAL_BONUS) as u8,
            dive_aesthetics_penalty: ((self.dive_aesthetics_penalty * 2.0).round() / 2.0)
                .clamp(0.0, MAX_DIVE_AESTHETICS_PENALTY),
            penalties: self.penalties,
            disqualifications: self.disqualifications,
        }
    }
}

/// A flight together with how its total was reached
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FlightResponse {
    pub flight: FlightRecord,
    pub breakdown: ScoreBreakdown,
}

impl From<FlightRecord> for FlightResponse {
    fn from(flight: FlightRecord) -> Self {
        let breakdown = flight.breakdown();
        Self { flight, breakdown }
    }
}
