pub mod aggregation;
pub mod auth;
pub mod matches;
pub mod roster;
pub mod stats;
