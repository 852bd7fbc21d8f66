pub mod stat;
pub mod team;
pub mod user;
pub mod vocabulary;
