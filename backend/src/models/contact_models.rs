use crate::error::ContactError;
use crate::handlers::contact_dtos::ContactRequest;
use crate::utils::form_utils::{format_phone_number, InterestSelection, MAX_INTERESTS};

/// A contact form submission that passed validation. It only lives for the
/// request that carried it.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactSubmission {
    pub first_name: String,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub budget: Option<String>,
    pub interests: Vec<String>,
    pub goal: String,
    pub verification_token: String,
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ContactSubmission {
    /// Checks that firstName, email, goal and the verification token are
    /// present, then normalises the optional fields.
    pub fn from_request(request: ContactRequest) -> Result<Self, ContactError> {
        let first_name = present(request.first_name);
        let email = present(request.email);
        let goal = present(request.goal);
        let verification_token = present(request.recaptcha_token);

        let missing: Vec<&str> = [
            ("firstName", first_name.is_none()),
            ("email", email.is_none()),
            ("goal", goal.is_none()),
            ("recaptchaToken", verification_token.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, is_missing)| is_missing.then_some(name))
        .collect();

        match (first_name, email, goal, verification_token) {
            (Some(_), Some(_), Some(_), Some(_)) if request.interests.len() > MAX_INTERESTS => {
                Err(ContactError::Validation(format!(
                    "Too many interests selected (at most {})",
                    MAX_INTERESTS
                )))
            }
            (Some(first_name), Some(email), Some(goal), Some(verification_token)) => Ok(Self {
                first_name,
                last_name: present(request.last_name),
                company: present(request.company),
                email,
                phone: present(request.phone)
                    .map(|p| format_phone_number(&p))
                    .filter(|p| !p.is_empty()),
                budget: present(request.budget),
                interests: request.interests.iter().collect::<InterestSelection>().into_vec(),
                goal,
                verification_token,
            }),
            _ => Err(ContactError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            ))),
        }
    }

    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }
}
