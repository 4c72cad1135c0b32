//! HTTP API for vrq-qa

pub mod health;
pub mod pages;
pub mod survey;

pub use health::health_routes;
pub use survey::survey_routes;
