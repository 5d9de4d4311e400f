//! End-to-end runs of the notice-triage workflow with stub collaborators.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rust_decimal_macros::dec;

use notice_triage::error::{Error, ExtractionError, NotificationError};
use notice_triage::extraction::{Extractor, NoticeExtract};
use notice_triage::graph::CompiledGraph;
use notice_triage::notify::Notifier;
use notice_triage::pipeline::{
    CriteriaMode, ESCALATE_STEP, EXTRACT_STEP, EmailAddress, EscalationPolicy, NoticeGraphDeps,
    NoticeState, build_notice_graph,
};

// ── Stub collaborators ──────────────────────────────────────────────

struct StubExtractor {
    extract: Option<NoticeExtract>,
}

#[async_trait]
impl Extractor for StubExtractor {
    async fn extract(&self, _notice: &str) -> Result<NoticeExtract, ExtractionError> {
        self.extract.clone().ok_or(ExtractionError::Schema {
            reason: "stub cannot parse this notice".to_string(),
        })
    }
}

struct CountingNotifier {
    calls: AtomicUsize,
    fail: bool,
}

impl CountingNotifier {
    fn new() -> Arc<Self> {
        Arc::new(Self { calls: AtomicUsize::new(0), fail: false })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self { calls: AtomicUsize::new(0), fail: true })
    }

    fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for CountingNotifier {
    async fn notify(
        &self,
        _extract: &NoticeExtract,
        _recipients: &[EmailAddress],
    ) -> Result<(), NotificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(NotificationError::Send { reason: "stub smtp down".to_string() })
        } else {
            Ok(())
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn extract(category: Option<&str>, fine: Option<rust_decimal::Decimal>) -> NoticeExtract {
    NoticeExtract {
        violation_type: category.map(String::from),
        max_potential_fine: fine,
        ..Default::default()
    }
}

fn graph(
    extract: Option<NoticeExtract>,
    notifier: Arc<CountingNotifier>,
    mode: CriteriaMode,
) -> CompiledGraph<NoticeState> {
    build_notice_graph(NoticeGraphDeps {
        extractor: Arc::new(StubExtractor { extract }),
        notifier,
        policy: EscalationPolicy::new(mode),
    })
    .unwrap()
}

fn initial_state() -> NoticeState {
    NoticeState::new(
        "Worker removed guard rail, safety violation",
        "Workers explicitly violating safety protocols",
        dec!(100_000),
        ["a@x.com"],
    )
    .unwrap()
}

// ── Scenarios ───────────────────────────────────────────────────────

#[tokio::test]
async fn safety_violation_escalates_and_notifies_once() {
    let notifier = CountingNotifier::new();
    let graph = graph(
        Some(extract(Some("safety_violation"), None)),
        notifier.clone(),
        CriteriaMode::Any,
    );

    let final_state = graph.invoke(initial_state()).await.unwrap();

    assert!(final_state.requires_escalation);
    assert_eq!(notifier.count(), 1);
}

#[tokio::test]
async fn low_severity_notice_does_not_escalate() {
    let notifier = CountingNotifier::new();
    let graph = graph(
        Some(extract(Some("late_shipment"), Some(dec!(500)))),
        notifier.clone(),
        CriteriaMode::Any,
    );

    let final_state = graph.invoke(initial_state()).await.unwrap();

    assert!(!final_state.requires_escalation);
    assert_eq!(notifier.count(), 0);
}

#[tokio::test]
async fn extraction_failure_aborts_run() {
    let notifier = CountingNotifier::new();
    let graph = graph(None, notifier.clone(), CriteriaMode::Any);

    let failure = graph.invoke(initial_state()).await.unwrap_err();

    assert_eq!(failure.step, EXTRACT_STEP);
    assert!(matches!(failure.source, Error::Extraction(_)));
    assert!(failure.state.notice_extract.is_none());
    assert_eq!(notifier.count(), 0);
}

#[tokio::test]
async fn fine_at_threshold_escalates_regardless_of_category() {
    let notifier = CountingNotifier::new();
    let graph = graph(
        Some(extract(Some("paperwork_error"), Some(dec!(100_000)))),
        notifier.clone(),
        CriteriaMode::Any,
    );

    let final_state = graph.invoke(initial_state()).await.unwrap();

    assert!(final_state.requires_escalation);
    assert_eq!(notifier.count(), 1);
}

#[tokio::test]
async fn notification_failure_preserves_decided_fields() {
    let notifier = CountingNotifier::failing();
    let graph = graph(
        Some(extract(Some("safety_violation"), Some(dec!(250_000)))),
        notifier.clone(),
        CriteriaMode::Any,
    );

    let failure = graph.invoke(initial_state()).await.unwrap_err();

    assert_eq!(failure.step, ESCALATE_STEP);
    assert!(matches!(failure.source, Error::Notification(_)));
    // The extracted and decided fields survive the notification failure.
    assert!(failure.state.requires_escalation);
    let kept = failure.state.notice_extract.unwrap();
    assert_eq!(kept.violation_type.as_deref(), Some("safety_violation"));
    assert_eq!(notifier.count(), 1);
}

#[tokio::test]
async fn identical_runs_produce_identical_final_states() {
    let notifier = CountingNotifier::new();
    let graph = graph(
        Some(extract(Some("safety_violation"), Some(dec!(50_000)))),
        notifier.clone(),
        CriteriaMode::Any,
    );

    let one = graph.invoke(initial_state()).await.unwrap();
    let two = graph.invoke(initial_state()).await.unwrap();

    assert_eq!(one, two);
    assert_eq!(notifier.count(), 2);
}

#[tokio::test]
async fn all_mode_demands_both_criteria() {
    let notifier = CountingNotifier::new();
    let graph = graph(
        Some(extract(Some("safety_violation"), None)),
        notifier.clone(),
        CriteriaMode::All,
    );

    let final_state = graph.invoke(initial_state()).await.unwrap();

    assert!(!final_state.requires_escalation);
    assert_eq!(notifier.count(), 0);
}

#[tokio::test]
async fn one_compiled_graph_serves_differently_configured_runs() {
    let notifier = CountingNotifier::new();
    let graph = graph(
        Some(extract(Some("safety_violation"), Some(dec!(5_000)))),
        notifier.clone(),
        CriteriaMode::Any,
    );

    // Same graph, stricter dollar threshold and unrelated text criteria.
    let strict = NoticeState::new(
        "Worker removed guard rail, safety violation",
        "Chemical spills into waterways",
        dec!(1_000_000),
        ["a@x.com"],
    )
    .unwrap();

    let relaxed = graph.invoke(initial_state()).await.unwrap();
    let unmoved = graph.invoke(strict).await.unwrap();

    assert!(relaxed.requires_escalation);
    assert!(!unmoved.requires_escalation);
    assert_eq!(notifier.count(), 1);
}
