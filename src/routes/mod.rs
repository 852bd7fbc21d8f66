pub mod auth;
pub mod stats;
pub mod teams;
pub mod users;
