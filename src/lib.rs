pub mod compose;
pub mod config;
pub mod fetch;
pub mod parser;
pub mod schedule;
pub mod strava;
pub mod summary;
