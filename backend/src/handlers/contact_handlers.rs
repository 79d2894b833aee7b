use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::api::recaptcha::{CONTACT_FORM_ACTION, MIN_HUMAN_SCORE};
use crate::error::ContactError;
use crate::handlers::contact_dtos::{ContactRequest, ContactResponse};
use crate::models::contact_models::ContactSubmission;
use crate::AppState;

pub const SUCCESS_MESSAGE: &str = "Thank you for your message! We will get back to you soon.";

pub async fn health_check() -> &'static str {
    "OK"
}

/// `POST /api/contact`: validate, verify the bot token, send both emails.
pub async fn submit_contact(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<Json<ContactResponse>, ContactError> {
    let Json(request) = payload.map_err(|e| {
        tracing::warn!("Rejected contact body: {}", e);
        ContactError::InvalidBody(e.body_text())
    })?;

    let submission = ContactSubmission::from_request(request).map_err(|e| {
        tracing::info!("Contact submission failed validation: {}", e);
        e
    })?;

    let (Some(assessor), Some(notifier)) = (state.risk_assessor.as_ref(), state.notifier.as_ref())
    else {
        tracing::error!(
            "Contact form is not configured (assessor: {}, notifier: {})",
            state.risk_assessor.is_some(),
            state.notifier.is_some()
        );
        return Err(ContactError::Configuration(
            "reCAPTCHA or email settings missing".to_string(),
        ));
    };

    let assessment = assessor
        .create_assessment(&submission.verification_token, CONTACT_FORM_ACTION)
        .await
        .map_err(|e| {
            tracing::error!("reCAPTCHA assessment failed: {}", e);
            e
        })?;

    if let Err(failure) = assessment.evaluate(CONTACT_FORM_ACTION, MIN_HUMAN_SCORE) {
        tracing::warn!(
            score = assessment.score,
            reasons = ?assessment.reasons,
            "Contact submission rejected by bot check: {}",
            failure
        );
        return Err(ContactError::Verification(failure));
    }
    tracing::debug!("Bot check passed with score {}", assessment.score);

    if let Err(e) = notifier.dispatch(&submission).await {
        tracing::error!("Failed to deliver contact emails: {}", e);
        sentry::capture_message(
            &format!("Contact form delivery failed: {}", e),
            sentry::Level::Error,
        );
        return Err(e);
    }

    tracing::info!("Contact submission handled");
    Ok(Json(ContactResponse {
        success: true,
        message: SUCCESS_MESSAGE.to_string(),
    }))
}
