//! The state record threaded through one triage run.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use lettre::Address;
use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::extraction::NoticeExtract;

// ── Email address ───────────────────────────────────────────────────

/// A validated email address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(Address);

impl EmailAddress {
    pub fn address(&self) -> &Address {
        &self.0
    }
}

impl FromStr for EmailAddress {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Address>()
            .map(Self)
            .map_err(|e| ValidationError::InvalidEmail {
                address: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ── State record ────────────────────────────────────────────────────

/// State record for one notice-triage run.
///
/// Created once per invocation, threaded by `&mut` through every step, and
/// handed back (or surfaced inside a run failure) when the run stops.
/// Concurrent runs use independent instances.
///
/// Steps only ever add information: initial fields are never rewritten,
/// `notice_extract` is set exactly once by the extract step,
/// `requires_escalation` is written once by the decision step, and
/// `follow_ups` keys are added, never removed.
#[derive(Debug, Clone, PartialEq)]
pub struct NoticeState {
    /// Raw notice text, immutable after creation.
    pub notice_message: String,
    /// Structured extract, set exactly once by the extract step.
    pub notice_extract: Option<NoticeExtract>,
    /// Qualitative escalation criteria, supplied per invocation.
    pub escalation_text_criteria: String,
    /// Monetary escalation threshold, supplied per invocation.
    pub escalation_dollar_criteria: Decimal,
    /// Decision output; defaults to false until the decision step runs.
    pub requires_escalation: bool,
    /// Recipients for escalation notifications, validated at creation.
    pub escalation_emails: Vec<EmailAddress>,
    /// Follow-up ledger for later stages.
    pub follow_ups: Option<BTreeMap<String, bool>>,
    /// Transient pointer into `follow_ups`.
    pub current_follow_up: Option<String>,
}

impl NoticeState {
    /// Build an initial state, validating every recipient address up front —
    /// before any external call is made.
    pub fn new<I>(
        notice_message: impl Into<String>,
        escalation_text_criteria: impl Into<String>,
        escalation_dollar_criteria: Decimal,
        escalation_emails: I,
    ) -> Result<Self, ValidationError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let escalation_emails = escalation_emails
            .into_iter()
            .map(|raw| raw.as_ref().parse())
            .collect::<Result<Vec<EmailAddress>, ValidationError>>()?;

        Ok(Self {
            notice_message: notice_message.into(),
            notice_extract: None,
            escalation_text_criteria: escalation_text_criteria.into(),
            escalation_dollar_criteria,
            requires_escalation: false,
            escalation_emails,
            follow_ups: None,
            current_follow_up: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn valid_addresses_accepted() {
        let state = NoticeState::new(
            "notice body",
            "safety criteria",
            dec!(100_000),
            ["brog@abc.com", "bigceo@company.com"],
        )
        .unwrap();

        assert_eq!(state.escalation_emails.len(), 2);
        assert_eq!(state.escalation_emails[0].to_string(), "brog@abc.com");
    }

    #[test]
    fn invalid_address_rejected_before_any_work() {
        let result = NoticeState::new(
            "notice body",
            "safety criteria",
            dec!(100_000),
            ["brog@abc.com", "not-an-email"],
        );

        match result {
            Err(ValidationError::InvalidEmail { address, .. }) => {
                assert_eq!(address, "not-an-email");
            }
            other => panic!("Expected InvalidEmail, got {:?}", other),
        }
    }

    #[test]
    fn fresh_state_defaults() {
        let state = NoticeState::new("body", "criteria", dec!(1), ["a@x.com"]).unwrap();
        assert!(!state.requires_escalation);
        assert!(state.notice_extract.is_none());
        assert!(state.follow_ups.is_none());
        assert!(state.current_follow_up.is_none());
    }

    #[test]
    fn email_address_parses_via_fromstr() {
        let parsed: EmailAddress = "a@x.com".parse().unwrap();
        assert_eq!(parsed.to_string(), "a@x.com");
        assert!("@nope".parse::<EmailAddress>().is_err());
    }

    #[test]
    fn empty_recipient_list_is_allowed_at_creation() {
        // Whether empty recipients are acceptable is the notifier's call;
        // validation here only rejects malformed addresses.
        let state = NoticeState::new("body", "criteria", dec!(1), Vec::<String>::new());
        assert!(state.is_ok());
    }
}
