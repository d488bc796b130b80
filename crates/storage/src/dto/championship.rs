use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::Championship;

/// Request payload for creating a new championship
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateChampionshipRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1 and 255 characters"
    ))]
    pub name: String,

    pub event_date: Option<NaiveDate>,

    #[validate(length(max = 255))]
    pub location: Option<String>,
}

/// Request payload for editing a championship. Absent fields stay as they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateChampionshipRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    pub event_date: Option<NaiveDate>,

    #[validate(length(max = 255))]
    pub location: Option<String>,
}

impl CreateChampionshipRequest {
    pub fn into_championship(self) -> Championship {
        Championship::new(
            self.name.trim(),
            self.event_date,
            self.location.map(|l| l.trim().to_string()).filter(|l| !l.is_empty()),
        )
    }
}

impl UpdateChampionshipRequest {
    pub fn apply(&self, championship: &mut Championship) {
        if let Some(ref name) = self.name {
            championship.name = name.trim().to_string();
        }
        if let Some(date) = self.event_date {
            championship.event_date = Some(date);
        }
        if let Some(ref location) = self.location {
            let location = location.trim();
            championship.location = (!location.is_empty()).then(|| location.to_string());
        }
    }
}

/// Championship header without its flights
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChampionshipSummary {
    pub championship_id: Uuid,
    pub name: String,
    pub event_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub is_public: bool,
    pub flight_count: usize,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl From<&Championship> for ChampionshipSummary {
    fn from(championship: &Championship) -> Self {
        Self {
            championship_id: championship.championship_id,
            name: championship.name.clone(),
            event_date: championship.event_date,
            location: championship.location.clone(),
            is_public: championship.is_public,
            flight_count: championship.flights.len(),
            created_at: championship.created_at,
            published_at: championship.published_at,
        }
    }
}
