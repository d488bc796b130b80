//! Printable results sheet.
//!
//! Produces a standalone HTML page with a print stylesheet; browsers turn it
//! into a PDF with "Print to file". Only the totals already stored on each
//! flight are shown, nothing is scored here.

use askama::Template;
use chrono::{DateTime, Utc};
use storage::models::Championship;
use storage::services::leaderboard::rank_flights;

use crate::error::Result;

struct SheetRow {
    rank: u32,
    falconer: String,
    falcon: String,
    capture: &'static str,
    duration: String,
    height: String,
    speed: String,
    total: String,
    disqualified: bool,
}

#[derive(Template)]
#[template(path = "standings.html")]
struct StandingsSheet<'a> {
    title: &'a str,
    meta: Vec<String>,
    rows: Vec<SheetRow>,
    generated: String,
}

/// Render a championship's standings as a printable HTML document
pub fn render_printable(
    championship: &Championship,
    generated_at: DateTime<Utc>,
) -> Result<String> {
    let mut meta = Vec::new();
    if let Some(date) = championship.event_date {
        meta.push(date.format("%d/%m/%Y").to_string());
    }
    if let Some(ref location) = championship.location {
        meta.push(location.clone());
    }
    meta.push(format!("{} flights", championship.flights.len()));

    let rows = rank_flights(&championship.flights)
        .into_iter()
        .map(|ranked| {
            let flight = ranked.flight;
            let data = &flight.data;
            let disqualified = flight.is_disqualified();
            SheetRow {
                rank: ranked.rank,
                falconer: data.falconer_name.clone(),
                falcon: data.falcon_name.clone(),
                capture: data.capture.map(|c| c.label()).unwrap_or("-"),
                duration: format!("{:.0}", data.flight_duration_secs),
                height: format!("{:.1}", data.service_height_m),
                speed: format!("{:.0}", data.dive_speed_kmh),
                total: if disqualified {
                    "DQ".to_string()
                } else {
                    format!("{:.2}", flight.total_points())
                },
                disqualified,
            }
        })
        .collect();

    let sheet = StandingsSheet {
        title: &championship.name,
        meta,
        rows,
        generated: generated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
    };
    Ok(sheet.render()?)
}

/// File name for a championship's sheet, e.g. `spring-cup-2025-10-12.html`.
/// Only ASCII letters and digits survive, everything else separates words.
pub fn suggested_filename(championship: &Championship) -> String {
    let slug = championship
        .name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<&str>>()
        .join("-");

    let slug = if slug.is_empty() {
        "championship".to_string()
    } else {
        slug
    };

    match championship.event_date {
        Some(date) => format!("{}-{}.html", slug, date.format("%Y-%m-%d")),
        None => format!("{}.html", slug),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use storage::models::{CaptureOutcome, FlightData};

    fn championship() -> Championship {
        let mut championship = Championship::new(
            "Copa de Otoño",
            NaiveDate::from_ymd_opt(2025, 10, 12),
            Some("Talavera".to_string()),
        );
        championship.add_flight(FlightData {
            falconer_name: "Second".to_string(),
            falcon_name: "Niebla".to_string(),
            service_height_m: 100.0,
            service_distance_m: 500.0,
            ..Default::default()
        });
        championship.add_flight(FlightData {
            falconer_name: "First".to_string(),
            falcon_name: "Viento".to_string(),
            service_height_m: 300.0,
            service_distance_m: 500.0,
            capture: Some(CaptureOutcome::Slashing),
            ..Default::default()
        });
        championship
    }

    #[test]
    fn test_rows_follow_ranking() {
        let html = render_printable(&championship(), Utc::now()).unwrap();
        let first = html.find("First").unwrap();
        let second = html.find("Second").unwrap();
        assert!(first < second);
        assert!(html.contains("Slashing"));
        // 30 height + 7.5 capture
        assert!(html.contains("37.50"));
    }

    #[test]
    fn test_disqualified_rows_are_marked() {
        let mut championship = championship();
        let mut data = championship.flights[0].data.clone();
        data.disqualifications.falcon_lost = true;
        let id = championship.flights[0].id;
        championship.update_flight(id, data).unwrap();

        let html = render_printable(&championship, Utc::now()).unwrap();
        assert!(html.contains("class=\"dq\""));
        assert!(html.contains(">DQ<"));
    }

    #[test]
    fn test_text_is_escaped() {
        let mut championship = Championship::new("<script>alert(1)</script>", None, None);
        championship.add_flight(FlightData {
            falconer_name: "Tom & Jerry".to_string(),
            ..Default::default()
        });

        let html = render_printable(&championship, Utc::now()).unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("Tom &amp; Jerry"));
    }

    #[test]
    fn test_empty_championship_has_placeholder_row() {
        let empty = Championship::new("Empty", None, None);
        let html = render_printable(&empty, Utc::now()).unwrap();
        assert!(html.contains("No flights recorded."));
    }

    #[test]
    fn test_suggested_filename() {
        assert_eq!(
            suggested_filename(&championship()),
            "copa-de-otoo-2025-10-12.html"
        );
        assert_eq!(
            suggested_filename(&Championship::new("Spring  Cup / 2025", None, None)),
            "spring-cup-2025.html"
        );
        assert_eq!(
            suggested_filename(&Championship::new("¡¡!!", None, None)),
            "championship.html"
        );
    }
}
