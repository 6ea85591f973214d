pub mod events;
pub mod health;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;

use crate::core::errors::ApiError;

/// Maps a body-extraction failure onto the API error surface: oversized
/// bodies keep their 413, everything else collapses to a generic 400.
pub(crate) fn body_rejection(rejection: JsonRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::BadRequest("invalid request body".to_string())
    }
}
