//! Compiled workflow execution.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Error, GraphError};
use crate::graph::builder::Edge;
use crate::graph::node::Node;
use crate::graph::{END, START};

/// An immutable, validated workflow graph.
///
/// Safe to share across concurrent runs without locking; every run threads
/// its own state instance.
pub struct CompiledGraph<S> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    edges: HashMap<String, Edge<S>>,
}

/// A failed run: the step that failed, the underlying error, and the state
/// as of the failure.
///
/// Partial progress is observable, never discarded: a notification failure
/// still carries the extracted and decided fields, and an extraction failure
/// is never silently treated as a completed run.
#[derive(Debug)]
pub struct RunError<S> {
    pub step: String,
    pub source: Error,
    pub state: S,
}

impl<S> fmt::Display for RunError<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step '{}' failed: {}", self.step, self.source)
    }
}

impl<S: fmt::Debug> std::error::Error for RunError<S> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl<S> CompiledGraph<S> {
    pub(crate) fn new(
        nodes: HashMap<String, Arc<dyn Node<S>>>,
        edges: HashMap<String, Edge<S>>,
    ) -> Self {
        Self { nodes, edges }
    }

    /// Resolve the outgoing edge of `from`. Conditional predicates are
    /// evaluated exactly once per visit.
    fn next_step(&self, from: &str, state: &S) -> Result<String, GraphError> {
        match self.edges.get(from) {
            Some(Edge::Direct(target)) => Ok(target.clone()),
            Some(Edge::Conditional(router)) => router.route(from, state),
            None => Err(GraphError::DanglingNode(from.to_string())),
        }
    }
}

impl<S: Send> CompiledGraph<S> {
    /// Run one state record from START to END.
    ///
    /// Steps execute strictly sequentially; the first failure halts the run
    /// and is returned together with the state at that point.
    pub async fn invoke(&self, mut state: S) -> Result<S, RunError<S>> {
        let run_id = Uuid::new_v4();
        let mut steps = 0usize;

        let mut current = match self.next_step(START, &state) {
            Ok(step) => step,
            Err(e) => {
                return Err(RunError {
                    step: START.to_string(),
                    source: e.into(),
                    state,
                });
            }
        };

        while current != END {
            let node = match self.nodes.get(&current) {
                Some(node) => node,
                None => {
                    let source = GraphError::UnknownNode(current.clone()).into();
                    return Err(RunError { step: current, source, state });
                }
            };

            debug!(%run_id, step = %current, "Running step");
            if let Err(source) = node.run(&mut state).await {
                warn!(%run_id, step = %current, error = %source, "Step failed, halting run");
                return Err(RunError { step: current, source, state });
            }
            steps += 1;

            match self.next_step(&current, &state) {
                Ok(next) => current = next,
                Err(e) => {
                    warn!(%run_id, step = %current, error = %e, "Transition failed, halting run");
                    return Err(RunError {
                        step: current,
                        source: e.into(),
                        state,
                    });
                }
            }
        }

        debug!(%run_id, steps, "Run reached END");
        Ok(state)
    }
}
