//! HTTP API handlers for vrq-dr

pub mod auth;
pub mod health;
pub mod summary;
pub mod ui;

pub use auth::auth_middleware;
pub use health::health_routes;
pub use summary::{get_results, get_summary};
pub use ui::serve_index;
