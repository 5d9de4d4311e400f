//! Escalation decision policy.
//!
//! Pure: reads the extract and the caller-supplied criteria, performs no
//! collaborator call. Missing fields fail safe toward NOT escalating — an
//! unextractable criterion is "not met", never a crash.

use std::str::FromStr;

use regex::Regex;
use rust_decimal::Decimal;

use crate::error::ConfigError;
use crate::extraction::NoticeExtract;

/// Minimum shared prefix for two tokens to count as the same word stem
/// ("violation" / "violating").
const STEM_PREFIX_LEN: usize = 4;

/// How the text and dollar criteria combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CriteriaMode {
    /// Escalate when either criterion is met.
    #[default]
    Any,
    /// Escalate only when both criteria are met.
    All,
}

impl FromStr for CriteriaMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "any" | "or" => Ok(Self::Any),
            "all" | "and" => Ok(Self::All),
            other => Err(ConfigError::InvalidValue {
                key: "criteria_mode".to_string(),
                message: format!("unknown mode '{other}' (expected any/all)"),
            }),
        }
    }
}

/// Decides whether an extracted notice requires escalation.
#[derive(Debug, Clone)]
pub struct EscalationPolicy {
    mode: CriteriaMode,
    word: Regex,
}

impl EscalationPolicy {
    pub fn new(mode: CriteriaMode) -> Self {
        Self {
            mode,
            word: Regex::new(r"[a-z0-9]+").unwrap(),
        }
    }

    /// Apply the policy. Criteria travel with the invocation, so one policy
    /// instance serves differently-configured runs.
    ///
    /// - Dollar criterion: extracted fine meets or exceeds the threshold.
    /// - Text criterion: the extracted violation category lexically matches
    ///   the qualitative criteria.
    /// - A criterion whose input was not extracted is not met.
    pub fn requires_escalation(
        &self,
        extract: Option<&NoticeExtract>,
        text_criteria: &str,
        dollar_criteria: Decimal,
    ) -> bool {
        let Some(extract) = extract else {
            return false;
        };

        let dollar_met = extract
            .max_potential_fine
            .is_some_and(|fine| fine >= dollar_criteria);

        let text_met = extract
            .violation_type
            .as_deref()
            .is_some_and(|category| self.category_matches(text_criteria, category));

        match self.mode {
            CriteriaMode::Any => text_met || dollar_met,
            CriteriaMode::All => text_met && dollar_met,
        }
    }

    /// Lexical match between a category and free-text criteria: every
    /// category token must share a stem with some criteria token, so
    /// "safety_violation" matches "Workers explicitly violating safety
    /// protocols" while "late_shipment" does not.
    fn category_matches(&self, criteria: &str, category: &str) -> bool {
        let category_tokens = self.tokens(category);
        if category_tokens.is_empty() {
            return false;
        }
        let criteria_tokens = self.tokens(criteria);
        category_tokens.iter().all(|token| {
            criteria_tokens
                .iter()
                .any(|candidate| stems_match(token, candidate))
        })
    }

    fn tokens(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.word
            .find_iter(&lowered)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self::new(CriteriaMode::default())
    }
}

/// Tokens share a stem when equal, or when their common prefix reaches
/// [`STEM_PREFIX_LEN`]. Tokens are ASCII by construction.
fn stems_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let shared = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    shared >= STEM_PREFIX_LEN
}
