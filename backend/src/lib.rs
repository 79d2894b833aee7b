use std::sync::Arc;

use axum::{
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;

pub mod config;
pub mod error;
pub mod handlers {
    pub mod contact_dtos;
    pub mod contact_handlers;
}
pub mod api {
    pub mod recaptcha;
    pub mod resend_email;
}
pub mod models {
    pub mod contact_models;
}
pub mod utils {
    pub mod form_utils;
    pub mod notification_utils;
}

use api::recaptcha::{RecaptchaClient, RiskAssessor};
use api::resend_email::ResendMailer;
use config::{EmailConfig, RecaptchaConfig};
use handlers::contact_handlers;
use utils::notification_utils::ContactNotifier;

/// Shared, read-only state. A `None` means the matching settings were
/// missing at startup and the contact endpoint answers with a config error.
pub struct AppState {
    pub risk_assessor: Option<Arc<dyn RiskAssessor>>,
    pub notifier: Option<ContactNotifier>,
}

impl AppState {
    pub fn from_env() -> Self {
        let risk_assessor = match RecaptchaConfig::from_env() {
            Ok(config) => match RecaptchaClient::new(&config) {
                Ok(client) => Some(Arc::new(client) as Arc<dyn RiskAssessor>),
                Err(e) => {
                    tracing::error!("Failed to build reCAPTCHA client: {}", e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("reCAPTCHA disabled, contact form will fail: {}", e);
                None
            }
        };

        let notifier = match EmailConfig::from_env() {
            Ok(config) => Some(ContactNotifier::new(
                Arc::new(ResendMailer::new(&config.api_key)),
                &config,
            )),
            Err(e) => {
                tracing::warn!("Email delivery disabled, contact form will fail: {}", e);
                None
            }
        };

        Self {
            risk_assessor,
            notifier,
        }
    }
}

/// Turns a handler panic into the same JSON 500 every other failure uses.
pub fn handle_panic(_err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    tracing::error!("Handler panicked while serving a request");
    error::ContactError::Internal.into_response()
}

pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(contact_handlers::health_check))
        .route("/api/contact", post(contact_handlers::submit_contact))
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
}
