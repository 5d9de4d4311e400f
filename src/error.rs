//! Error types for notice triage.
//!
//! No step swallows another step's error: the workflow engine surfaces the
//! first failure to the caller of `invoke` and halts further execution.

/// Top-level error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Malformed-graph errors.
///
/// Raised at `compile` time where detectable, otherwise at the first
/// offending transition during a run. All of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Graph has no entry edge from START")]
    MissingEntry,

    #[error("Node '{0}' registered more than once")]
    DuplicateNode(String),

    #[error("Node '{0}' declares more than one outgoing edge")]
    DuplicateEdge(String),

    #[error("Edge declared from unknown node '{0}'")]
    UnknownNode(String),

    #[error("Edge from '{from}' targets unknown node '{to}'")]
    UnknownTarget { from: String, to: String },

    #[error("Node '{0}' has no outgoing edge")]
    DanglingNode(String),

    #[error("Node '{0}' is unreachable from START")]
    UnreachableNode(String),

    #[error("Cycle detected through node '{0}'")]
    CycleDetected(String),

    #[error("Conditional edge from '{step}' produced unmatched label {label}")]
    UnmatchedBranch { step: String, label: String },
}

/// Invocation-input validation errors, detected before any external call.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid email address '{address}': {reason}")]
    InvalidEmail { address: String, reason: String },
}

/// Extraction collaborator errors.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Extraction call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Extract did not match the expected schema: {reason}")]
    Schema { reason: String },

    #[error("Extractor returned empty content")]
    Empty,
}

/// Notification collaborator errors.
///
/// A notification failure never invalidates already-computed state fields;
/// the engine includes them in the error context.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("No escalation recipients configured")]
    NoRecipients,

    #[error("Failed to build notification: {reason}")]
    Build { reason: String },

    #[error("Failed to send notification: {reason}")]
    Send { reason: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
