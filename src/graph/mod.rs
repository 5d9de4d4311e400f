//! Deterministic state-machine workflow engine.
//!
//! A workflow is a directed graph of named steps over a single shared state
//! record. [`StateGraph`] declares nodes and edges; `compile()` validates the
//! shape and fails closed on misconfiguration. [`CompiledGraph::invoke`]
//! walks one state record from [`START`] to [`END`], strictly sequentially.
//!
//! Conditional edges dispatch on a typed label returned by a predicate that
//! runs exactly once per visit. For a fixed initial state and fixed
//! collaborator results, a run visits the same step sequence every time.
//!
//! The compiled graph is immutable and freely shared by concurrent runs,
//! each with its own state instance. The engine itself performs no I/O.

mod builder;
mod compiled;
mod node;

pub use builder::StateGraph;
pub use compiled::{CompiledGraph, RunError};
pub use node::{FnNode, Node};

/// Sentinel marking workflow entry. Not an ordinary step.
pub const START: &str = "__start__";

/// Sentinel marking workflow termination. Not an ordinary step.
pub const END: &str = "__end__";
