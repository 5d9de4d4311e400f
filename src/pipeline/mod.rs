//! The notice-triage pipeline.
//!
//! One run flows through:
//! 1. `NoticeState::new()` — input validation, before any external call
//! 2. `extract` — LLM-backed structured extraction
//! 3. `check_escalation` — pure decision against caller criteria
//! 4. `escalate` — notification, only when the decision requires it

pub mod escalation;
pub mod notice_graph;
pub mod state;

pub use escalation::{CriteriaMode, EscalationPolicy};
pub use notice_graph::{
    CHECK_ESCALATION_STEP, ESCALATE_STEP, EXTRACT_STEP, EscalationBranch, NoticeGraphDeps,
    build_notice_graph,
};
pub use state::{EmailAddress, NoticeState};
