use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::flight::{FlightData, FlightRecord};
use crate::error::{Result, StorageError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Championship {
    pub championship_id: Uuid,
    pub name: String,
    pub event_date: Option<NaiveDate>,
    pub location: Option<String>,
    /// Flights in the order they were recorded
    pub flights: Vec<FlightRecord>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl Championship {
    /// A fresh, unpublished championship without flights
    pub fn new(
        name: impl Into<String>,
        event_date: Option<NaiveDate>,
        location: Option<String>,
    ) -> Self {
        Self {
            championship_id: Uuid::new_v4(),
            name: name.into(),
            event_date,
            location,
            flights: Vec::new(),
            is_public: false,
            created_at: now(),
            published_at: None,
        }
    }

    pub fn find_flight(&self, flight_id: Uuid) -> Result<&FlightRecord> {
        self.flights
            .iter()
            .find(|f| f.id == flight_id)
            .ok_or(StorageError::NotFound)
    }

    /// Append a flight, scoring it on the way in
    pub fn add_flight(&mut self, data: FlightData) -> &FlightRecord {
        let index = self.flights.len();
        self.flights.push(FlightRecord::new(Uuid::new_v4(), data));
        &self.flights[index]
    }

    pub fn update_flight(&mut self, flight_id: Uuid, data: FlightData) -> Result<&FlightRecord> {
        let flight = self
            .flights
            .iter_mut()
            .find(|f| f.id == flight_id)
            .ok_or(StorageError::NotFound)?;
        flight.update(data);
        Ok(flight)
    }

    pub fn remove_flight(&mut self, flight_id: Uuid) -> Result<FlightRecord> {
        let index = self
            .flights
            .iter()
            .position(|f| f.id == flight_id)
            .ok_or(StorageError::NotFound)?;
        Ok(self.flights.remove(index))
    }
}

/// Current time at the precision Postgres keeps, so records compare equal
/// after a round trip through the database.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
