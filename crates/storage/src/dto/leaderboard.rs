use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::championship::ChampionshipSummary;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub flight_id: Uuid,
    pub falconer_name: String,
    pub falcon_name: String,
    pub total_points: f64,
    pub disqualified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeaderboardResponse {
    pub championship: ChampionshipSummary,
    pub entries: Vec<LeaderboardEntry>,
}
