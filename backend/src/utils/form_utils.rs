use std::collections::HashSet;

use crate::handlers::contact_dtos::ContactRequest;

pub const BUDGET_OPTIONS: [&str; 3] = ["$1,200-2,500", "$2,500-5,000", "$5,000+"];

pub const INTEREST_OPTIONS: [&str; 5] = [
    "Web Development",
    "SEO Optimization",
    "E-commerce",
    "Landing Pages",
    "Full Redesign",
];

const PHONE_DIGITS: usize = 10;

/// Upper bound on interests accepted in one submission.
pub const MAX_INTERESTS: usize = 20;

/// Formats whatever was typed into the phone field as `(XXX) XXX-XXXX`.
///
/// Non-digits are dropped and input past ten digits is ignored. The result
/// grows as digits arrive, so a partially typed number renders as `(55`,
/// `(555) 12`, `(555) 123-4` and so on.
pub fn format_phone_number(value: &str) -> String {
    let digits: String = value
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(PHONE_DIGITS)
        .collect();

    match digits.len() {
        0 => String::new(),
        1..=3 => format!("({}", digits),
        4..=6 => format!("({}) {}", &digits[..3], &digits[3..]),
        _ => format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..]),
    }
}

/// Interests picked on the form, in the order they were picked.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InterestSelection {
    selected: Vec<String>,
}

impl InterestSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes the interest if it is selected, appends it otherwise.
    pub fn toggle(&mut self, interest: &str) {
        if let Some(pos) = self.selected.iter().position(|i| i == interest) {
            self.selected.remove(pos);
        } else {
            self.selected.push(interest.to_string());
        }
    }

    pub fn contains(&self, interest: &str) -> bool {
        self.selected.iter().any(|i| i == interest)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.selected
    }

    pub fn into_vec(self) -> Vec<String> {
        self.selected
    }
}

// Collapses duplicates, first occurrence wins.
impl<S: AsRef<str>> FromIterator<S> for InterestSelection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut seen = HashSet::new();
        let mut selection = InterestSelection::new();
        for interest in iter {
            let interest = interest.as_ref().trim();
            if !interest.is_empty() && seen.insert(interest.to_string()) {
                selection.selected.push(interest.to_string());
            }
        }
        selection
    }
}

/// State of the contact form before it is submitted.
#[derive(Clone, Debug, Default)]
pub struct ContactFormDraft {
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub email: String,
    phone: String,
    budget: Option<String>,
    interests: InterestSelection,
    pub goal: String,
}

impl ContactFormDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_phone(&mut self, value: &str) {
        self.phone = format_phone_number(value);
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    /// Selects one of the budget buckets. Unknown labels are ignored.
    pub fn select_budget(&mut self, budget: &str) -> bool {
        if BUDGET_OPTIONS.contains(&budget) {
            self.budget = Some(budget.to_string());
            true
        } else {
            false
        }
    }

    pub fn budget(&self) -> Option<&str> {
        self.budget.as_deref()
    }

    pub fn toggle_interest(&mut self, interest: &str) {
        self.interests.toggle(interest);
    }

    pub fn interests(&self) -> &InterestSelection {
        &self.interests
    }

    /// The message to show for the first blank required field, if any.
    pub fn first_problem(&self) -> Option<&'static str> {
        if self.first_name.trim().is_empty() {
            Some("Please enter your first name.")
        } else if self.last_name.trim().is_empty() {
            Some("Please enter your last name.")
        } else if self.email.trim().is_empty() {
            Some("Please enter your email address.")
        } else if self.goal.trim().is_empty() {
            Some("Please describe your goal.")
        } else {
            None
        }
    }

    /// Whether the submit button should be enabled.
    pub fn is_complete(&self) -> bool {
        self.first_problem().is_none()
    }

    /// Builds the JSON body posted to `/api/contact`.
    pub fn to_request(&self, recaptcha_token: &str) -> ContactRequest {
        ContactRequest {
            first_name: Some(self.first_name.clone()),
            last_name: Some(self.last_name.clone()),
            company: Some(self.company.clone()),
            email: Some(self.email.clone()),
            phone: Some(self.phone.clone()),
            budget: Some(self.budget.clone().unwrap_or_default()),
            interests: self.interests.as_slice().to_vec(),
            goal: Some(self.goal.clone()),
            recaptcha_token: Some(recaptcha_token.to_string()),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
