//! The notice-triage workflow: extract → decide → (escalate | done).

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{Error, GraphError, NotificationError};
use crate::extraction::Extractor;
use crate::graph::{CompiledGraph, END, Node, START, StateGraph};
use crate::notify::Notifier;
use crate::pipeline::escalation::EscalationPolicy;
use crate::pipeline::state::NoticeState;

pub const EXTRACT_STEP: &str = "extract";
pub const CHECK_ESCALATION_STEP: &str = "check_escalation";
pub const ESCALATE_STEP: &str = "escalate";

/// Branch label for the escalation decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationBranch {
    Escalate,
    Done,
}

/// Collaborators injected into the workflow at build time.
pub struct NoticeGraphDeps {
    pub extractor: Arc<dyn Extractor>,
    pub notifier: Arc<dyn Notifier>,
    pub policy: EscalationPolicy,
}

/// Runs the extraction collaborator and records the structured extract.
struct ExtractNode {
    extractor: Arc<dyn Extractor>,
}

#[async_trait]
impl Node<NoticeState> for ExtractNode {
    async fn run(&self, state: &mut NoticeState) -> Result<(), Error> {
        let extract = self.extractor.extract(&state.notice_message).await?;
        debug!(
            violation = extract.violation_type.as_deref().unwrap_or("none"),
            fine = %extract
                .max_potential_fine
                .map(|f| f.to_string())
                .unwrap_or_else(|| "none".to_string()),
            "Notice extracted"
        );
        state.notice_extract = Some(extract);
        Ok(())
    }
}

/// Applies the escalation policy to the extract. Pure, no collaborator.
struct CheckEscalationNode {
    policy: EscalationPolicy,
}

#[async_trait]
impl Node<NoticeState> for CheckEscalationNode {
    async fn run(&self, state: &mut NoticeState) -> Result<(), Error> {
        state.requires_escalation = self.policy.requires_escalation(
            state.notice_extract.as_ref(),
            &state.escalation_text_criteria,
            state.escalation_dollar_criteria,
        );
        info!(
            requires_escalation = state.requires_escalation,
            "Escalation decision"
        );
        Ok(())
    }
}

/// Notifies the configured recipients. Only reached when the decision step
/// set `requires_escalation`.
struct EscalateNode {
    notifier: Arc<dyn Notifier>,
}

#[async_trait]
impl Node<NoticeState> for EscalateNode {
    async fn run(&self, state: &mut NoticeState) -> Result<(), Error> {
        let extract = state.notice_extract.as_ref().ok_or_else(|| {
            NotificationError::Build {
                reason: "escalation reached without an extract".to_string(),
            }
        })?;
        self.notifier
            .notify(extract, &state.escalation_emails)
            .await?;
        Ok(())
    }
}

/// Wire the notice-triage graph:
/// `START → extract → check_escalation → [escalate → END | END]`.
///
/// The compiled graph is immutable and reusable across runs; per-run
/// configuration (criteria, recipients) travels in the state record.
pub fn build_notice_graph(
    deps: NoticeGraphDeps,
) -> Result<CompiledGraph<NoticeState>, GraphError> {
    StateGraph::new()
        .add_node(EXTRACT_STEP, ExtractNode { extractor: deps.extractor })
        .add_node(
            CHECK_ESCALATION_STEP,
            CheckEscalationNode { policy: deps.policy },
        )
        .add_node(ESCALATE_STEP, EscalateNode { notifier: deps.notifier })
        .add_edge(START, EXTRACT_STEP)
        .add_edge(EXTRACT_STEP, CHECK_ESCALATION_STEP)
        .add_conditional_edge(
            CHECK_ESCALATION_STEP,
            |state: &NoticeState| {
                if state.requires_escalation {
                    EscalationBranch::Escalate
                } else {
                    EscalationBranch::Done
                }
            },
            vec![
                (EscalationBranch::Escalate, ESCALATE_STEP),
                (EscalationBranch::Done, END),
            ],
        )
        .add_edge(ESCALATE_STEP, END)
        .compile()
}
