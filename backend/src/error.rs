use thiserror::Error;
use tracing::{error, warn};
use warp::http::StatusCode;
use warp::{reject::Reject, Rejection, Reply};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Unrecognized completion envelope: {0}")]
    InvalidCompletion(#[source] serde_json::Error),

    #[error("Completion contained no choices")]
    EmptyCompletion,

    #[error("Completion request cancelled")]
    Cancelled,

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Persistence error: {0}")]
    PersistenceError(String),
}

impl Reject for ApiError {}

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Maps rejections to plain-text replies. Internal failures share one generic
/// body; details only reach the server log.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Rejection> {
    let (code, message) = if let Some(api_err) = err.find::<ApiError>() {
        match api_err {
            ApiError::BadRequest(reason) => {
                warn!("Rejected request body: {}", reason);
                (StatusCode::BAD_REQUEST, "Invalid request body")
            }
            ApiError::PayloadTooLarge(limit) => {
                warn!("Rejected request body over {} bytes", limit);
                (StatusCode::PAYLOAD_TOO_LARGE, "Payload too large")
            }
            other => {
                error!("Request failed: {}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
            }
        }
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    } else {
        return Err(err);
    };

    Ok(warp::reply::with_status(message, code))
}
