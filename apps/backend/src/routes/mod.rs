pub mod auth;
pub mod curriculum;
pub mod leaderboard;
pub mod progress;
pub mod review;
pub mod users;
