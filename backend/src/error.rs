use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::api::recaptcha::VerificationFailure;

pub const VERIFICATION_FAILED_MESSAGE: &str = "reCAPTCHA verification failed";
pub const CONFIGURATION_MESSAGE: &str = "Server configuration error";
pub const DELIVERY_MESSAGE: &str = "Failed to send your message. Please try again later.";
pub const INTERNAL_MESSAGE: &str = "Internal server error";
pub const INVALID_BODY_MESSAGE: &str = "Invalid request body";

/// Every way a contact submission can fail. All of them end the request.
#[derive(Error, Debug)]
pub enum ContactError {
    /// A required field was missing. The message is shown to the user as is.
    #[error("{0}")]
    Validation(String),
    #[error("Bot verification rejected: {0}")]
    Verification(VerificationFailure),
    #[error("Missing configuration: {0}")]
    Configuration(String),
    /// The assessment call itself failed (transport, status, body).
    #[error("Assessment request failed: {0}")]
    Assessment(String),
    #[error("Email delivery failed: {0}")]
    Delivery(String),
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
    #[error("Internal error")]
    Internal,
}

impl ContactError {
    pub fn status(&self) -> StatusCode {
        match self {
            ContactError::Validation(_)
            | ContactError::Verification(_)
            | ContactError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ContactError::Configuration(_)
            | ContactError::Assessment(_)
            | ContactError::Delivery(_)
            | ContactError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The text sent back to the caller. Only validation errors carry their
    /// own message; everything else stays generic so scoring and vendor
    /// details never reach the client.
    pub fn public_message(&self) -> String {
        match self {
            ContactError::Validation(message) => message.clone(),
            ContactError::Verification(_) => VERIFICATION_FAILED_MESSAGE.to_string(),
            ContactError::Configuration(_) => CONFIGURATION_MESSAGE.to_string(),
            ContactError::Delivery(_) => DELIVERY_MESSAGE.to_string(),
            ContactError::InvalidBody(_) => INVALID_BODY_MESSAGE.to_string(),
            ContactError::Assessment(_) | ContactError::Internal => INTERNAL_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for ContactError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.public_message() }))).into_response()
    }
}
