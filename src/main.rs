use std::sync::Arc;

use rust_decimal_macros::dec;

use notice_triage::config::TriageConfig;
use notice_triage::extraction::LlmExtractor;
use notice_triage::llm::{LlmBackend, LlmConfig, create_provider};
use notice_triage::notify::{LogNotifier, Notifier, SmtpConfig, SmtpNotifier};
use notice_triage::pipeline::{
    EscalationPolicy, NoticeGraphDeps, NoticeState, build_notice_graph,
};

/// Sample notice processed by the demo run.
const SAMPLE_NOTICE: &str = "\
Date: October 15, 2024
From: Occupational Safety and Health Administration (OSHA)
To: Blue Ridge Construction, project 111232345

During a recent inspection of the construction site at 123 Main Street,
Dallas, TX, an inspector observed a worker remove a guard rail from the
second-floor scaffolding and continue working without fall protection.
This is a violation of safety regulations under 29 CFR 1926.451.

Required changes: reinstall guard rails on all scaffolding and retrain
site personnel on fall protection requirements by November 10, 2024.

Failure to comply may result in fines of up to $25,000 per violation.
Contact compliance@blueridge.example or (214) 555-0199 with questions.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // Read API key from environment
    let api_key = std::env::var("ANTHROPIC_API_KEY").unwrap_or_else(|_| {
        eprintln!("Error: ANTHROPIC_API_KEY not set");
        eprintln!("  export ANTHROPIC_API_KEY=sk-ant-...");
        std::process::exit(1);
    });

    let model = std::env::var("NOTICE_TRIAGE_MODEL")
        .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string());

    let config = TriageConfig::from_env()?;

    eprintln!("📨 notice-triage v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", model);
    eprintln!("   Criteria mode: {:?}", config.criteria_mode);

    // Create LLM provider and the extraction collaborator
    let llm = create_provider(&LlmConfig {
        backend: LlmBackend::Anthropic,
        api_key: secrecy::SecretString::from(api_key),
        model,
    })?;
    let extractor = Arc::new(
        LlmExtractor::new(llm)
            .with_limits(config.extract_max_tokens, config.extract_temperature),
    );

    // Conditionally use SMTP if a host is configured
    let notifier: Arc<dyn Notifier> = match SmtpConfig::from_env() {
        Some(smtp) => {
            eprintln!("   SMTP: {}:{}", smtp.host, smtp.port);
            Arc::new(SmtpNotifier::new(smtp))
        }
        None => {
            eprintln!("   SMTP: not configured (notifications are logged)\n");
            Arc::new(LogNotifier)
        }
    };

    let graph = build_notice_graph(NoticeGraphDeps {
        extractor,
        notifier,
        policy: EscalationPolicy::new(config.criteria_mode),
    })?;

    let state = NoticeState::new(
        SAMPLE_NOTICE,
        "Workers explicitly violating safety protocols",
        dec!(100_000),
        ["brog@abc.com", "bigceo@company.com"],
    )?;

    match graph.invoke(state).await {
        Ok(final_state) => {
            println!("{final_state:#?}");
            Ok(())
        }
        Err(failure) => {
            eprintln!("Run failed at step '{}': {}", failure.step, failure.source);
            eprintln!("State at failure:\n{:#?}", failure.state);
            std::process::exit(1);
        }
    }
}
