pub mod connection;
pub mod migrations;
pub mod repositories;
pub mod services;

pub use connection::{connect_with_settings, DbPool};
