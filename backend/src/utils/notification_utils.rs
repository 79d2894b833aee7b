use std::sync::Arc;

use crate::api::resend_email::{Mailer, OutgoingEmail};
use crate::config::EmailConfig;
use crate::error::ContactError;
use crate::models::contact_models::ContactSubmission;

/// Sends the two emails every accepted contact submission produces.
pub struct ContactNotifier {
    mailer: Arc<dyn Mailer>,
    from_address: String,
    agency_inbox: String,
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

impl ContactNotifier {
    pub fn new(mailer: Arc<dyn Mailer>, config: &EmailConfig) -> Self {
        Self {
            mailer,
            from_address: config.from_address.clone(),
            agency_inbox: config.agency_inbox.clone(),
        }
    }

    /// Notification for the agency inbox. Replies go straight to the
    /// submitter.
    pub fn inbox_notification(&self, submission: &ContactSubmission) -> OutgoingEmail {
        let interests = if submission.interests.is_empty() {
            "-".to_string()
        } else {
            submission.interests.join(", ")
        };
        let rows = [
            ("Name", submission.full_name()),
            ("Company", or_dash(submission.company.as_deref()).to_string()),
            ("Email", submission.email.clone()),
            ("Phone", or_dash(submission.phone.as_deref()).to_string()),
            ("Budget", or_dash(submission.budget.as_deref()).to_string()),
            ("Interests", interests),
        ];

        let text = format!(
            "New contact form submission\r\n\r\n{}\r\n\r\nGoal:\r\n{}\r\n",
            rows.iter()
                .map(|(label, value)| format!("{}: {}", label, value))
                .collect::<Vec<_>>()
                .join("\r\n"),
            submission.goal
        );
        let html = format!(
            "<h2>New contact form submission</h2>\
             <table>{}</table>\
             <h3>Goal</h3><p style=\"white-space: pre-wrap\">{}</p>\
             <p style=\"color: #888\">Received {}</p>",
            rows.iter()
                .map(|(label, value)| format!(
                    "<tr><td><strong>{}</strong></td><td>{}</td></tr>",
                    label,
                    escape_html(value)
                ))
                .collect::<String>(),
            escape_html(&submission.goal),
            chrono::Utc::now().format("%Y-%m-%d %H:%M UTC")
        );

        OutgoingEmail {
            from: self.from_address.clone(),
            to: self.agency_inbox.clone(),
            reply_to: Some(submission.email.clone()),
            subject: format!("New project inquiry from {}", submission.full_name()),
            html,
            text,
        }
    }

    pub fn confirmation(&self, submission: &ContactSubmission) -> OutgoingEmail {
        let text = format!(
            "Hi {},\r\n\r\n\
             Thanks for reaching out to VirturaTech. We received your message and \
             will get back to you soon.\r\n\r\n\
             Your goal:\r\n{}\r\n\r\n\
             The VirturaTech team\r\n",
            submission.first_name, submission.goal
        );
        let html = format!(
            "<p>Hi {},</p>\
             <p>Thanks for reaching out to VirturaTech. We received your message and \
             will get back to you soon.</p>\
             <blockquote style=\"white-space: pre-wrap\">{}</blockquote>\
             <p>The VirturaTech team</p>",
            escape_html(&submission.first_name),
            escape_html(&submission.goal)
        );

        OutgoingEmail {
            from: self.from_address.clone(),
            to: submission.email.clone(),
            reply_to: Some(self.agency_inbox.clone()),
            subject: "Thanks for contacting VirturaTech".to_string(),
            html,
            text,
        }
    }

    /// Sends the inbox notification, then the confirmation. Each send is
    /// attempted once; a failure of the first skips the second.
    pub async fn dispatch(&self, submission: &ContactSubmission) -> Result<(), ContactError> {
        self.mailer.send(self.inbox_notification(submission)).await?;
        tracing::info!("Contact notification sent to agency inbox");

        self.mailer.send(self.confirmation(submission)).await?;
        tracing::info!("Confirmation email sent to submitter");
        Ok(())
    }
}
