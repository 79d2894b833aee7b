use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::config::RecaptchaConfig;
use crate::error::ContactError;

pub const CONTACT_FORM_ACTION: &str = "contact_form_submit";
/// Scores run from 0.0 (very likely a bot) to 1.0 (very likely human).
pub const MIN_HUMAN_SCORE: f64 = 0.5;

const RECAPTCHA_API_BASE: &str = "https://recaptchaenterprise.googleapis.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerificationFailure {
    #[error("token invalid ({})", .0.as_deref().unwrap_or("no reason given"))]
    InvalidToken(Option<String>),
    #[error("action mismatch: expected {expected}, got {actual}")]
    ActionMismatch { expected: String, actual: String },
    #[error("risk score {0} below threshold")]
    LowScore(f64),
}

/// The parts of an assessment the contact flow acts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub valid: bool,
    pub action: String,
    pub score: f64,
    pub invalid_reason: Option<String>,
    pub reasons: Vec<String>,
}

impl Assessment {
    /// Accepts only a valid token minted for `expected_action` whose score
    /// is at least `min_score`.
    pub fn evaluate(&self, expected_action: &str, min_score: f64) -> Result<(), VerificationFailure> {
        if !self.valid {
            return Err(VerificationFailure::InvalidToken(self.invalid_reason.clone()));
        }
        if self.action != expected_action {
            return Err(VerificationFailure::ActionMismatch {
                expected: expected_action.to_string(),
                actual: self.action.clone(),
            });
        }
        if self.score.is_nan() || self.score < min_score {
            return Err(VerificationFailure::LowScore(self.score));
        }
        Ok(())
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct TokenProperties {
    valid: bool,
    action: String,
    invalid_reason: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RiskAnalysis {
    score: Option<f64>,
    reasons: Vec<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct AssessmentResponse {
    token_properties: TokenProperties,
    risk_analysis: RiskAnalysis,
}

impl From<AssessmentResponse> for Assessment {
    fn from(raw: AssessmentResponse) -> Self {
        Assessment {
            valid: raw.token_properties.valid,
            action: raw.token_properties.action,
            score: raw.risk_analysis.score.unwrap_or(0.0),
            // the API reports INVALID_REASON_UNSPECIFIED for valid tokens
            invalid_reason: raw
                .token_properties
                .invalid_reason
                .filter(|r| r != "INVALID_REASON_UNSPECIFIED"),
            reasons: raw.risk_analysis.reasons,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RiskAssessor: Send + Sync {
    /// Redeems `token` once and returns the raw assessment.
    async fn create_assessment(
        &self,
        token: &str,
        expected_action: &str,
    ) -> Result<Assessment, ContactError>;
}

/// Client for the reCAPTCHA Enterprise `projects.assessments.create` call.
pub struct RecaptchaClient {
    client: Client,
    base_url: String,
    project_id: String,
    site_key: String,
    api_key: String,
}

impl RecaptchaClient {
    pub fn new(config: &RecaptchaConfig) -> Result<Self, ContactError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ContactError::Configuration(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: RECAPTCHA_API_BASE.to_string(),
            project_id: config.project_id.clone(),
            site_key: config.site_key.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn assessment_url(&self) -> String {
        format!(
            "{}/projects/{}/assessments",
            self.base_url.trim_end_matches('/'),
            self.project_id
        )
    }
}

#[async_trait]
impl RiskAssessor for RecaptchaClient {
    async fn create_assessment(
        &self,
        token: &str,
        expected_action: &str,
    ) -> Result<Assessment, ContactError> {
        let body = json!({
            "event": {
                "token": token,
                "siteKey": self.site_key,
                "expectedAction": expected_action,
            }
        });

        let response = self
            .client
            .post(self.assessment_url())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| ContactError::Assessment(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ContactError::Assessment(format!(
                "reCAPTCHA API error {}: {}",
                status, error_text
            )));
        }

        let raw: AssessmentResponse = response
            .json()
            .await
            .map_err(|e| ContactError::Assessment(format!("unreadable response: {}", e)))?;

        Ok(raw.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::RawQuery,
        http::{header, StatusCode},
        routing::post,
        Json, Router,
    };
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    fn parse(value: serde_json::Value) -> Assessment {
        serde_json::from_value::<AssessmentResponse>(value).unwrap().into()
    }

    fn passing() -> Assessment {
        Assessment {
            valid: true,
            action: CONTACT_FORM_ACTION.to_string(),
            score: 0.9,
            invalid_reason: None,
            reasons: vec![],
        }
    }

    #[test]
    fn parses_full_response() {
        let assessment = parse(json!({
            "name": "projects/123/assessments/abc",
            "tokenProperties": {
                "valid": true,
                "invalidReason": "INVALID_REASON_UNSPECIFIED",
                "action": "contact_form_submit",
                "hostname": "virturatech.com"
            },
            "riskAnalysis": { "score": 0.7, "reasons": [] }
        }));
        assert!(assessment.valid);
        assert_eq!(assessment.action, "contact_form_submit");
        assert_eq!(assessment.score, 0.7);
        assert_eq!(assessment.invalid_reason, None);
    }

    #[test]
    fn missing_score_counts_as_zero() {
        let assessment = parse(json!({
            "tokenProperties": { "valid": false, "invalidReason": "EXPIRED" }
        }));
        assert_eq!(assessment.score, 0.0);
        assert_eq!(assessment.invalid_reason.as_deref(), Some("EXPIRED"));
        assert_eq!(
            assessment.evaluate(CONTACT_FORM_ACTION, MIN_HUMAN_SCORE),
            Err(VerificationFailure::InvalidToken(Some("EXPIRED".to_string())))
        );
    }

    #[test]
    fn accepts_valid_matching_human() {
        assert_eq!(passing().evaluate(CONTACT_FORM_ACTION, MIN_HUMAN_SCORE), Ok(()));
        let at_threshold = Assessment { score: 0.5, ..passing() };
        assert_eq!(at_threshold.evaluate(CONTACT_FORM_ACTION, MIN_HUMAN_SCORE), Ok(()));
    }

    #[test]
    fn rejects_mismatched_action() {
        let assessment = Assessment { action: "login".to_string(), ..passing() };
        assert!(matches!(
            assessment.evaluate(CONTACT_FORM_ACTION, MIN_HUMAN_SCORE),
            Err(VerificationFailure::ActionMismatch { .. })
        ));
    }

    #[test]
    fn rejects_low_and_nan_scores() {
        for score in [0.0, 0.1, 0.49, f64::NAN] {
            let assessment = Assessment { score, ..passing() };
            assert!(matches!(
                assessment.evaluate(CONTACT_FORM_ACTION, MIN_HUMAN_SCORE),
                Err(VerificationFailure::LowScore(_))
            ));
        }
    }

    #[test]
    fn assessment_url_includes_project() {
        let client = RecaptchaClient::new(&RecaptchaConfig {
            project_id: "virturatech-site".to_string(),
            site_key: "site".to_string(),
            api_key: "key".to_string(),
        })
        .unwrap()
        .with_base_url("http://localhost:9000/v1/");
        assert_eq!(
            client.assessment_url(),
            "http://localhost:9000/v1/projects/virturatech-site/assessments"
        );
    }

    type Captured = Arc<Mutex<Vec<(Option<String>, serde_json::Value)>>>;

    /// Local stand-in for the assessments endpoint answering every call with
    /// `status` and `body`. Returns its base url and the requests it saw.
    async fn spawn_assessment_api(status: StatusCode, body: &'static str) -> (String, Captured) {
        let captured: Captured = Arc::default();
        let seen = captured.clone();
        let app = Router::new().route(
            "/v1/projects/{project}/assessments",
            post(move |RawQuery(query): RawQuery, Json(payload): Json<serde_json::Value>| {
                let seen = seen.clone();
                async move {
                    seen.lock().unwrap().push((query, payload));
                    (status, [(header::CONTENT_TYPE, "application/json")], body)
                }
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/v1", addr), captured)
    }

    fn client_for(base_url: String) -> RecaptchaClient {
        RecaptchaClient::new(&RecaptchaConfig {
            project_id: "virturatech-site".to_string(),
            site_key: "sk".to_string(),
            api_key: "k".to_string(),
        })
        .unwrap()
        .with_base_url(base_url)
    }

    #[tokio::test]
    async fn client_posts_event_and_parses_assessment() {
        let (base_url, captured) = spawn_assessment_api(
            StatusCode::OK,
            r#"{"tokenProperties":{"valid":true,"action":"contact_form_submit"},"riskAnalysis":{"score":0.8,"reasons":[]}}"#,
        )
        .await;

        let assessment = client_for(base_url)
            .create_assessment("tok", CONTACT_FORM_ACTION)
            .await
            .unwrap();
        assert!(assessment.valid);
        assert_eq!(assessment.action, CONTACT_FORM_ACTION);
        assert_eq!(assessment.score, 0.8);

        let requests = captured.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0.as_deref(), Some("key=k"));
        assert_eq!(
            requests[0].1,
            json!({
                "event": {
                    "token": "tok",
                    "siteKey": "sk",
                    "expectedAction": "contact_form_submit"
                }
            })
        );
    }

    #[tokio::test]
    async fn client_maps_error_status_to_assessment_error() {
        let (base_url, _) = spawn_assessment_api(StatusCode::FORBIDDEN, "nope").await;
        match client_for(base_url).create_assessment("tok", CONTACT_FORM_ACTION).await {
            Err(ContactError::Assessment(message)) => {
                assert!(message.contains("403"), "{}", message);
                assert!(message.contains("nope"), "{}", message);
            }
            other => panic!("expected assessment error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn client_maps_unreadable_body_to_assessment_error() {
        let (base_url, _) = spawn_assessment_api(StatusCode::OK, "<html>not json</html>").await;
        match client_for(base_url).create_assessment("tok", CONTACT_FORM_ACTION).await {
            Err(ContactError::Assessment(message)) => {
                assert!(message.contains("unreadable response"), "{}", message)
            }
            other => panic!("expected assessment error, got {:?}", other),
        }
    }
}
