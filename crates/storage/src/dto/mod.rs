pub mod championship;
pub mod common;
pub mod flight;
pub mod leaderboard;
