use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::services::scoring::{self, ScoreBreakdown};

/// How the falcon finished the flight, as recorded by the judges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CaptureOutcome {
    Clean,
    Pinning,
    ShortPursuit,
    LongPursuit,
    Slashing,
    Touch,
    Yields,
    NoCapture,
}

impl CaptureOutcome {
    /// Human readable label used by the printable export
    pub fn label(&self) -> &'static str {
        match self {
            Self::Clean => "Clean capture",
            Self::Pinning => "Pinning",
            Self::ShortPursuit => "Short pursuit",
            Self::LongPursuit => "Long pursuit",
            Self::Slashing => "Slashing",
            Self::Touch => "Touch",
            Self::Yields => "Yields",
            Self::NoCapture => "No capture",
        }
    }
}

/// Technical penalties, each subtracting a fixed amount
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct TechnicalPenalties {
    pub incarnate_lure: bool,
    pub show_lure: bool,
    pub forced_release: bool,
}

/// Direct disqualifications. Any one of them zeroes the flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Disqualifications {
    pub no_show: bool,
    pub falcon_lost: bool,
    pub unsportsmanlike_conduct: bool,
    pub outside_flight_zone: bool,
}

impl Disqualifications {
    pub fn any(&self) -> bool {
        self.no_show || self.falcon_lost || self.unsportsmanlike_conduct || self.outside_flight_zone
    }
}

/// Everything a judge records about a flight. Durations are in seconds,
/// speed in km/h, height and distance in meters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct FlightData {
    pub falconer_name: String,
    pub falcon_name: String,
    pub flight_duration_secs: f64,
    pub courtesy_time_secs: f64,
    /// Informational only, never scored
    pub manual_duration_secs: f64,
    pub dive_speed_kmh: f64,
    pub service_height_m: f64,
    pub service_distance_m: f64,
    pub capture: Option<CaptureOutcome>,
    pub clean_retrieval_bonus: u8,
    pub dive_aesthetics_penalty: f64,
    pub penalties: TechnicalPenalties,
    pub disqualifications: Disqualifications,
}

/// A scored flight.
///
/// The total is private and only ever produced by the scoring engine. Records
/// read back from storage go through [`StoredFlight`], which drops whatever
/// total was persisted and scores the measurements again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(from = "StoredFlight")]
pub struct FlightRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub data: FlightData,
    total_points: f64,
}

#[derive(Deserialize)]
struct StoredFlight {
    id: Uuid,
    #[serde(flatten)]
    data: FlightData,
}

impl From<StoredFlight> for FlightRecord {
    fn from(stored: StoredFlight) -> Self {
        Self::new(stored.id, stored.data)
    }
}

impl FlightRecord {
    pub fn new(id: Uuid, data: FlightData) -> Self {
        let total_points = scoring::total_points(&data);
        Self {
            id,
            data,
            total_points,
        }
    }

    pub fn total_points(&self) -> f64 {
        self.total_points
    }

    pub fn is_disqualified(&self) -> bool {
        self.data.disqualifications.any()
    }

    /// Replace the measurements and rescore
    pub fn update(&mut self, data: FlightData) {
        self.total_points = scoring::total_points(&data);
        self.data = data;
    }

    pub fn breakdown(&self) -> ScoreBreakdown {
        scoring::score_flight(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_data() -> FlightData {
        FlightData {
            falconer_name: "Ana".to_string(),
            falcon_name: "Brisa".to_string(),
            flight_duration_secs: 400.0,
            dive_speed_kmh: 180.0,
            service_height_m: 300.0,
            service_distance_m: 25.0,
            capture: Some(CaptureOutcome::Clean),
            clean_retrieval_bonus: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_total_is_computed_on_creation() {
        let record = FlightRecord::new(Uuid::new_v4(), sample_data());
        assert_eq!(record.total_points(), scoring::total_points(&sample_data()));
        assert!(record.total_points() > 0.0);
    }

    #[test]
    fn test_update_rescores() {
        let mut record = FlightRecord::new(Uuid::new_v4(), sample_data());
        let mut data = sample_data();
        data.disqualifications.falcon_lost = true;
        record.update(data);
        assert_eq!(record.total_points(), 0.0);
        assert!(record.is_disqualified());
    }

    #[test]
    fn test_round_trip_keeps_total() {
        let record = FlightRecord::new(Uuid::new_v4(), sample_data());
        let json = serde_json::to_string(&record).unwrap();
        let reloaded: FlightRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, record);
        assert_eq!(reloaded.total_points(), record.total_points());
    }

    #[test]
    fn test_stored_total_is_ignored() {
        let record = FlightRecord::new(Uuid::new_v4(), sample_data());
        let mut value = serde_json::to_value(&record).unwrap();
        value["total_points"] = serde_json::json!(999.0);

        let reloaded: FlightRecord = serde_json::from_value(value).unwrap();
        assert_eq!(reloaded.total_points(), record.total_points());
    }

    #[test]
    fn test_capture_outcome_wire_names() {
        let json = serde_json::to_string(&CaptureOutcome::ShortPursuit).unwrap();
        assert_eq!(json, "\"short_pursuit\"");
        let parsed: CaptureOutcome = serde_json::from_str("\"no_capture\"").unwrap();
        assert_eq!(parsed, CaptureOutcome::NoCapture);
    }

    #[test]
    fn test_missing_fields_default() {
        let reloaded: FlightRecord =
            serde_json::from_str(&format!(r#"{{"id":"{}"}}"#, Uuid::new_v4())).unwrap();
        assert_eq!(reloaded.total_points(), 0.0);
        assert_eq!(reloaded.data.capture, None);
    }
}
