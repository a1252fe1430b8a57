use std::convert::Infallible;

use serde_json::json;
use warp::{
    body::BodyDeserializeError,
    http::StatusCode,
    reject::{
        InvalidHeader, InvalidQuery, LengthRequired, MethodNotAllowed, MissingHeader,
        PayloadTooLarge, UnsupportedMediaType,
    },
    reply::Response,
    Rejection,
};

use super::responses::{error_response, json_response};
use crate::error::ApiError;

fn detail(status: StatusCode, message: String) -> Response {
    json_response(&json!({ "detail": message }), status)
}

/// Turns any rejection into a JSON response.
pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    if let Some(e) = err.find::<ApiError>() {
        return Ok(error_response(e));
    }

    let response = if err.is_not_found() {
        error_response(&ApiError::NotFound)
    } else if let Some(e) = err.find::<BodyDeserializeError>() {
        detail(StatusCode::BAD_REQUEST, format!("JSON parse error - {e}"))
    } else if let Some(e) = err.find::<InvalidQuery>() {
        detail(StatusCode::BAD_REQUEST, e.to_string())
    } else if let Some(e) = err.find::<InvalidHeader>() {
        detail(StatusCode::BAD_REQUEST, e.to_string())
    } else if let Some(e) = err.find::<MissingHeader>() {
        detail(StatusCode::BAD_REQUEST, e.to_string())
    } else if err.find::<MethodNotAllowed>().is_some() {
        detail(
            StatusCode::METHOD_NOT_ALLOWED,
            String::from("Method not allowed."),
        )
    } else if err.find::<PayloadTooLarge>().is_some() {
        detail(
            StatusCode::PAYLOAD_TOO_LARGE,
            String::from("Request body is too large."),
        )
    } else if err.find::<LengthRequired>().is_some() {
        detail(
            StatusCode::LENGTH_REQUIRED,
            String::from("A content-length header is required."),
        )
    } else if err.find::<UnsupportedMediaType>().is_some() {
        detail(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            String::from("Unsupported media type in request."),
        )
    } else {
        error_response(&ApiError::Internal(format!("Unhandled rejection: {err:?}")))
    };

    Ok(response)
}
