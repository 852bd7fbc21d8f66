pub mod auth_dtos;
pub mod stat_dtos;
pub mod team_dtos;
pub mod user_dtos;
