pub mod attributes;
pub mod recipes;
pub mod users;

use serde_json::json;
use warp::{http::StatusCode, reply::Response, Rejection};

use super::responses::json_response;

pub async fn health_check() -> Result<Response, Rejection> {
    Ok(json_response(&json!({ "status": "ok" }), StatusCode::OK))
}
