use std::cmp::Ordering;

use crate::dto::championship::ChampionshipSummary;
use crate::dto::leaderboard::{LeaderboardEntry, LeaderboardResponse};
use crate::models::{Championship, FlightRecord};

/// A flight with its position in the standings
#[derive(Debug, Clone, Copy)]
pub struct RankedFlight<'a> {
    pub rank: u32,
    pub flight: &'a FlightRecord,
}

/// Order flights by total, best first.
///
/// Equal totals share a rank and keep the order they were flown in; the next
/// distinct total skips the shared places (1, 2, 2, 4).
pub fn rank_flights(flights: &[FlightRecord]) -> Vec<RankedFlight<'_>> {
    let mut ordered: Vec<&FlightRecord> = flights.iter().collect();
    ordered.sort_by(|a, b| {
        b.total_points()
            .partial_cmp(&a.total_points())
            .unwrap_or(Ordering::Equal)
    });

    let mut ranked = Vec::with_capacity(ordered.len());
    let mut previous: Option<(f64, u32)> = None;

    for (position, flight) in ordered.into_iter().enumerate() {
        let rank = match previous {
            Some((total, rank)) if total == flight.total_points() => rank,
            _ => position as u32 + 1,
        };
        previous = Some((flight.total_points(), rank));
        ranked.push(RankedFlight { rank, flight });
    }

    ranked
}

pub fn build_leaderboard(championship: &Championship) -> LeaderboardResponse {
    let entries = rank_flights(&championship.flights)
        .into_iter()
        .map(|ranked| LeaderboardEntry {
            rank: ranked.rank,
            flight_id: ranked.flight.id,
            falconer_name: ranked.flight.data.falconer_name.clone(),
            falcon_name: ranked.flight.data.falcon_name.clone(),
            total_points: ranked.flight.total_points(),
            disqualified: ranked.flight.is_disqualified(),
        })
        .collect();

    LeaderboardResponse {
        championship: ChampionshipSummary::from(championship),
        entries,
    }
}
