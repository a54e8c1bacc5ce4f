pub mod error;
pub mod languages;
pub mod models;
pub mod ports;
