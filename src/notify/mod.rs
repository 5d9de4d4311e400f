//! Escalation notification — the outbound collaborator boundary.

pub mod email;

pub use email::{SmtpConfig, SmtpNotifier};

use async_trait::async_trait;
use tracing::info;

use crate::error::NotificationError;
use crate::extraction::NoticeExtract;
use crate::pipeline::state::EmailAddress;

/// Notification collaborator. Only invoked when a run decides escalation is
/// required; a failure here never corrupts already-computed state fields.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        extract: &NoticeExtract,
        recipients: &[EmailAddress],
    ) -> Result<(), NotificationError>;
}

/// Logs the notification instead of sending it. Used by the demo binary
/// when SMTP is not configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        extract: &NoticeExtract,
        recipients: &[EmailAddress],
    ) -> Result<(), NotificationError> {
        if recipients.is_empty() {
            return Err(NotificationError::NoRecipients);
        }
        let to: Vec<String> = recipients.iter().map(ToString::to_string).collect();
        info!(
            recipients = %to.join(", "),
            violation = extract.violation_type.as_deref().unwrap_or("unknown"),
            "Escalation notification (dry run)"
        );
        Ok(())
    }
}
