//! UI serving routes
//!
//! The page is static; it loads `/api/summary` with the same credentials
//! the browser used for the page itself.

use axum::response::Html;

const INDEX_HTML: &str = include_str!("../ui/index.html");

/// GET /
pub async fn serve_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
