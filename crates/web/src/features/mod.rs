pub mod assistant;
pub mod championships;
pub mod flights;
pub mod leaderboard;
pub mod scoring;
pub mod status;
