//! Flight scoring rules.
//!
//! Every function here is pure: the same measurements always produce the same
//! points. Totals are rounded to two decimals; individual components are not.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{CaptureOutcome, FlightData, TechnicalPenalties};

pub const HEIGHT_FACTOR: f64 = 0.1;

pub const SERVICE_FULL_POINTS: f64 = 15.0;
pub const SERVICE_FULL_DISTANCE_M: f64 = 30.0;
pub const SERVICE_NEAR_DISTANCE_M: f64 = 40.0;
pub const SERVICE_MAX_DISTANCE_M: f64 = 160.0;
const SERVICE_NEAR_SLOPE: f64 = 0.3;
const SERVICE_FAR_BASE: f64 = 12.0;
const SERVICE_FAR_SLOPE: f64 = 0.1;

pub const DIVE_MIN_SPEED_KMH: f64 = 100.0;
const DIVE_SPEED_STEP_KMH: f64 = 10.0;

pub const CLIMB_RATE_THRESHOLD: f64 = 20.0;
const CLIMB_RATE_SLOPE: f64 = 0.2;
const CLIMB_RATE_BASE: f64 = 2.0;

pub const INCARNATE_LURE_PENALTY: f64 = 4.0;
pub const SHOW_LURE_PENALTY: f64 = 6.0;
pub const FORCED_RELEASE_PENALTY: f64 = 10.0;

/// (upper bound in seconds, bonus) checked in order
const TIME_BONUS_STEPS: [(f64, f64); 3] = [(420.0, 6.0), (480.0, 4.0), (540.0, 2.0)];

/// Every scored component of a flight, kept for previews and exports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct ScoreBreakdown {
    pub height: f64,
    pub service: f64,
    pub dive: f64,
    /// Meters per minute
    pub climb_rate: f64,
    pub climb_rate_points: f64,
    pub capture: f64,
    pub time_bonus: f64,
    pub manual_bonus: f64,
    pub technical_penalties: f64,
    pub aesthetics_penalty: f64,
    pub disqualified: bool,
    pub total: f64,
}

pub fn height_points(height_m: f64) -> f64 {
    height_m * HEIGHT_FACTOR
}

/// Points for where the falcon waits on: full marks up to 30 m, then a steep
/// drop to 12 at 40 m and a gentle slope that reaches zero at 160 m.
pub fn service_points(distance_m: f64) -> f64 {
    if distance_m <= SERVICE_FULL_DISTANCE_M {
        SERVICE_FULL_POINTS
    } else if distance_m <= SERVICE_NEAR_DISTANCE_M {
        SERVICE_FULL_POINTS - SERVICE_NEAR_SLOPE * (distance_m - SERVICE_FULL_DISTANCE_M)
    } else if distance_m <= SERVICE_MAX_DISTANCE_M {
        (SERVICE_FAR_BASE - SERVICE_FAR_SLOPE * (distance_m - SERVICE_NEAR_DISTANCE_M)).max(0.0)
    } else {
        0.0
    }
}

pub fn dive_points(speed_kmh: f64) -> f64 {
    if speed_kmh < DIVE_MIN_SPEED_KMH {
        0.0
    } else {
        (speed_kmh - DIVE_MIN_SPEED_KMH) / DIVE_SPEED_STEP_KMH
    }
}

/// Climb rate in meters per minute. Zero when the duration is not positive.
pub fn climb_rate(height_m: f64, duration_secs: f64) -> f64 {
    if duration_secs <= 0.0 {
        return 0.0;
    }
    height_m / duration_secs * 60.0
}

pub fn climb_rate_points(rate_m_per_min: f64) -> f64 {
    if rate_m_per_min <= CLIMB_RATE_THRESHOLD {
        0.0
    } else {
        (rate_m_per_min - CLIMB_RATE_THRESHOLD) * CLIMB_RATE_SLOPE + CLIMB_RATE_BASE
    }
}

pub fn capture_points(outcome: Option<CaptureOutcome>, height_m: f64) -> f64 {
    let divisor = match outcome {
        Some(CaptureOutcome::Clean | CaptureOutcome::Pinning) => 12.0,
        Some(CaptureOutcome::ShortPursuit) => 15.0,
        Some(CaptureOutcome::LongPursuit) => 18.0,
        Some(CaptureOutcome::Slashing) => 40.0,
        Some(CaptureOutcome::Touch | CaptureOutcome::Yields) => 50.0,
        Some(CaptureOutcome::NoCapture) | None => return 0.0,
    };
    height_m / divisor
}

pub fn time_bonus(duration_secs: f64) -> f64 {
    if duration_secs <= 0.0 {
        return 0.0;
    }
    TIME_BONUS_STEPS
        .iter()
        .find(|(limit, _)| duration_secs <= *limit)
        .map(|(_, bonus)| *bonus)
        .unwrap_or(0.0)
}

pub fn technical_penalty_points(penalties: &TechnicalPenalties) -> f64 {
    [
        (penalties.incarnate_lure, INCARNATE_LURE_PENALTY),
        (penalties.show_lure, SHOW_LURE_PENALTY),
        (penalties.forced_release, FORCED_RELEASE_PENALTY),
    ]
    .iter()
    .filter(|(applied, _)| *applied)
    .map(|(_, points)| points)
    .sum()
}

/// Decimals kept before the final rounding, enough to drop binary float noise
const NOISE_DECIMALS: u32 = 9;

/// Round half away from zero to two decimals.
///
/// Works in decimal so that a sum like 10.005, stored as 10.00499999..., still
/// rounds up.
pub fn round2(value: f64) -> f64 {
    let Some(exact) = Decimal::from_f64_retain(value) else {
        return value;
    };
    exact
        .round_dp_with_strategy(NOISE_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(value)
}

pub fn score_flight(flight: &FlightData) -> ScoreBreakdown {
    let height = height_points(flight.service_height_m);
    let service = service_points(flight.service_distance_m);
    let dive = dive_points(flight.dive_speed_kmh);
    let rate = climb_rate(flight.service_height_m, flight.flight_duration_secs);
    let rate_points = climb_rate_points(rate);
    let capture = capture_points(flight.capture, flight.service_height_m);
    let bonus = time_bonus(flight.flight_duration_secs);
    let manual_bonus = f64::from(flight.clean_retrieval_bonus);
    let technical_penalties = technical_penalty_points(&flight.penalties);
    let aesthetics_penalty = flight.dive_aesthetics_penalty;
    let disqualified = flight.disqualifications.any();

    // No lower clamp unless disqualified: heavy penalties can push a total below zero.
    let total = if disqualified {
        0.0
    } else {
        round2(
            height + service + dive + rate_points + capture + bonus + manual_bonus
                - technical_penalties
                - aesthetics_penalty,
        )
    };

    ScoreBreakdown {
        height,
        service,
        dive,
        climb_rate: rate,
        climb_rate_points: rate_points,
        capture,
        time_bonus: bonus,
        manual_bonus,
        technical_penalties,
        aesthetics_penalty,
        disqualified,
        total,
    }
}

pub fn total_points(flight: &FlightData) -> f64 {
    score_flight(flight).total
}
