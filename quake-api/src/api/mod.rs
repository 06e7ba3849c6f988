//! HTTP API handlers for quake-api

pub mod health;
pub mod history;
pub mod human_readable;
pub mod jma;
pub mod params;

pub use health::health_routes;
pub use history::{count_history, search_history};
pub use human_readable::human_readable;
pub use jma::{get_quake, get_tsunami, search_quake, search_tsunami};
