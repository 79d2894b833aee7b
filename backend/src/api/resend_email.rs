use async_trait::async_trait;
use resend_rs::types::CreateEmailBaseOptions;
use resend_rs::Resend;

use crate::error::ContactError;

/// One transactional email, ready to hand to the vendor.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), ContactError>;
}

pub struct ResendMailer {
    client: Resend,
}

impl ResendMailer {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: Resend::new(api_key),
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), ContactError> {
        let mut options = CreateEmailBaseOptions::new(
            email.from.as_str(),
            [email.to.as_str()],
            email.subject.as_str(),
        )
        .with_html(&email.html)
        .with_text(&email.text);
        if let Some(reply_to) = &email.reply_to {
            options = options.with_reply(reply_to);
        }

        let sent = self
            .client
            .emails
            .send(options)
            .await
            .map_err(|e| ContactError::Delivery(format!("Resend rejected email to {}: {}", email.to, e)))?;

        tracing::debug!("Resend accepted email {:?} ({})", sent.id, email.subject);
        Ok(())
    }
}
