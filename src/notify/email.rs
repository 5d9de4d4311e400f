//! SMTP escalation notifier — outbound email via lettre.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::info;

use crate::error::NotificationError;
use crate::extraction::NoticeExtract;
use crate::notify::Notifier;
use crate::pipeline::state::EmailAddress;

// ── Configuration ───────────────────────────────────────────────────

/// SMTP configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

impl SmtpConfig {
    /// Build config from environment variables.
    /// Returns `None` if `NOTICE_SMTP_HOST` is not set (notifier disabled).
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("NOTICE_SMTP_HOST").ok()?;

        let port: u16 = std::env::var("NOTICE_SMTP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(587);

        let username = std::env::var("NOTICE_SMTP_USERNAME").unwrap_or_default();
        let password = std::env::var("NOTICE_SMTP_PASSWORD").unwrap_or_default();
        let from_address =
            std::env::var("NOTICE_SMTP_FROM").unwrap_or_else(|_| username.clone());

        Some(Self { host, port, username, password, from_address })
    }
}

// ── Notifier ────────────────────────────────────────────────────────

/// Sends escalation notifications over SMTP.
pub struct SmtpNotifier {
    config: SmtpConfig,
}

impl SmtpNotifier {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(
        &self,
        extract: &NoticeExtract,
        recipients: &[EmailAddress],
    ) -> Result<(), NotificationError> {
        if recipients.is_empty() {
            return Err(NotificationError::NoRecipients);
        }

        let from: Mailbox = self.config.from_address.parse().map_err(|e| {
            NotificationError::Build {
                reason: format!("Invalid from address: {e}"),
            }
        })?;

        let mut builder = Message::builder()
            .from(from)
            .subject(escalation_subject(extract));
        for recipient in recipients {
            builder = builder.to(Mailbox::new(None, recipient.address().clone()));
        }
        let email = builder.body(escalation_body(extract)).map_err(|e| {
            NotificationError::Build {
                reason: format!("Failed to build email: {e}"),
            }
        })?;

        let creds = Credentials::new(
            self.config.username.clone(),
            self.config.password.clone(),
        );

        let transport = SmtpTransport::relay(&self.config.host)
            .map_err(|e| NotificationError::Send {
                reason: format!("SMTP relay error: {e}"),
            })?
            .port(self.config.port)
            .credentials(creds)
            .build();

        transport.send(&email).map_err(|e| NotificationError::Send {
            reason: format!("SMTP send error: {e}"),
        })?;

        info!(count = recipients.len(), "Escalation notification sent");
        Ok(())
    }
}

// ── Message formatting ──────────────────────────────────────────────

fn escalation_subject(extract: &NoticeExtract) -> String {
    match extract.violation_type.as_deref() {
        Some(category) => format!("Escalation required: {category}"),
        None => "Escalation required: regulatory notice".to_string(),
    }
}

fn escalation_body(extract: &NoticeExtract) -> String {
    let mut body = String::from("A regulatory notice met the escalation criteria.\n\n");

    push_field(&mut body, "Entity", extract.entity_name.as_deref());
    push_field(&mut body, "Project", extract.project_id.as_deref());
    push_field(&mut body, "Site", extract.site_location.as_deref());
    push_field(&mut body, "Violation", extract.violation_type.as_deref());
    push_field(
        &mut body,
        "Notice date",
        extract.date_of_notice.map(|d| d.to_string()).as_deref(),
    );
    push_field(
        &mut body,
        "Compliance deadline",
        extract.compliance_deadline.map(|d| d.to_string()).as_deref(),
    );
    push_field(
        &mut body,
        "Max potential fine",
        extract
            .max_potential_fine
            .map(|f| format!("${f}"))
            .as_deref(),
    );
    push_field(
        &mut body,
        "Required changes",
        extract.required_changes.as_deref(),
    );

    body
}

fn push_field(body: &mut String, label: &str, value: Option<&str>) {
    if let Some(value) = value {
        body.push_str(label);
        body.push_str(": ");
        body.push_str(value);
        body.push('\n');
    }
}
