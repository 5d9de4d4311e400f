//! Graph builder: declare nodes and edges, then compile.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::GraphError;
use crate::graph::compiled::CompiledGraph;
use crate::graph::node::Node;
use crate::graph::{END, START};

/// Outgoing edge of a node (or of the START sentinel).
pub(crate) enum Edge<S> {
    /// Always fires.
    Direct(String),
    /// Evaluates a predicate and follows the matching branch.
    Conditional(Box<dyn Router<S> + Send + Sync>),
}

impl<S> Edge<S> {
    pub(crate) fn targets(&self) -> Vec<&str> {
        match self {
            Edge::Direct(target) => vec![target.as_str()],
            Edge::Conditional(router) => router.targets(),
        }
    }
}

/// Resolves a conditional edge to its successor step.
pub(crate) trait Router<S> {
    /// Evaluate the predicate (exactly once per visit) and pick the target.
    fn route(&self, step: &str, state: &S) -> Result<String, GraphError>;

    /// All possible targets, for compile-time validation.
    fn targets(&self) -> Vec<&str>;
}

/// Conditional edge backed by a typed branch table.
struct BranchRouter<S, L> {
    decide: Box<dyn Fn(&S) -> L + Send + Sync>,
    branches: Vec<(L, String)>,
}

impl<S, L> Router<S> for BranchRouter<S, L>
where
    L: PartialEq + fmt::Debug + Send + Sync,
{
    fn route(&self, step: &str, state: &S) -> Result<String, GraphError> {
        let label = (self.decide)(state);
        self.branches
            .iter()
            .find(|(candidate, _)| *candidate == label)
            .map(|(_, target)| target.clone())
            .ok_or_else(|| GraphError::UnmatchedBranch {
                step: step.to_string(),
                label: format!("{label:?}"),
            })
    }

    fn targets(&self) -> Vec<&str> {
        self.branches.iter().map(|(_, target)| target.as_str()).collect()
    }
}

/// Workflow graph under construction.
///
/// Declaration errors (duplicates, unknown names, cycles) are collected and
/// reported by `compile()`; nothing is validated while chaining.
pub struct StateGraph<S> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    edges: HashMap<String, Edge<S>>,
    duplicate_nodes: Vec<String>,
    duplicate_edges: Vec<String>,
}

impl<S> StateGraph<S> {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: HashMap::new(),
            duplicate_nodes: Vec::new(),
            duplicate_edges: Vec::new(),
        }
    }

    /// Register a named step.
    pub fn add_node(mut self, name: &str, node: impl Node<S> + 'static) -> Self {
        if self.nodes.insert(name.to_string(), Arc::new(node)).is_some() {
            self.duplicate_nodes.push(name.to_string());
        }
        self
    }

    /// Declare an unconditional edge. `from` may be [`START`]; `to` may be
    /// [`END`].
    pub fn add_edge(mut self, from: &str, to: &str) -> Self {
        self.insert_edge(from, Edge::Direct(to.to_string()));
        self
    }

    /// Declare a conditional edge: `decide` is evaluated once per visit and
    /// its label selects the successor from `branches`.
    pub fn add_conditional_edge<L>(
        mut self,
        from: &str,
        decide: impl Fn(&S) -> L + Send + Sync + 'static,
        branches: Vec<(L, &str)>,
    ) -> Self
    where
        L: PartialEq + fmt::Debug + Send + Sync + 'static,
        S: 'static,
    {
        let router = BranchRouter {
            decide: Box::new(decide),
            branches: branches
                .into_iter()
                .map(|(label, target)| (label, target.to_string()))
                .collect(),
        };
        self.insert_edge(from, Edge::Conditional(Box::new(router)));
        self
    }

    fn insert_edge(&mut self, from: &str, edge: Edge<S>) {
        if self.edges.insert(from.to_string(), edge).is_some() {
            self.duplicate_edges.push(from.to_string());
        }
    }

    /// Validate the graph shape and freeze it.
    ///
    /// Fails closed: missing entry, unknown endpoints, dangling or
    /// unreachable nodes, duplicates, and cycles are all rejected here.
    pub fn compile(self) -> Result<CompiledGraph<S>, GraphError> {
        if let Some(name) = self.duplicate_nodes.first() {
            return Err(GraphError::DuplicateNode(name.clone()));
        }
        if let Some(name) = self.duplicate_edges.first() {
            return Err(GraphError::DuplicateEdge(name.clone()));
        }
        if !self.edges.contains_key(START) {
            return Err(GraphError::MissingEntry);
        }

        for (from, edge) in &self.edges {
            if from != START && !self.nodes.contains_key(from) {
                return Err(GraphError::UnknownNode(from.clone()));
            }
            for target in edge.targets() {
                if target != END && !self.nodes.contains_key(target) {
                    return Err(GraphError::UnknownTarget {
                        from: from.clone(),
                        to: target.to_string(),
                    });
                }
            }
        }

        for name in self.nodes.keys() {
            if !self.edges.contains_key(name) {
                return Err(GraphError::DanglingNode(name.clone()));
            }
        }

        self.check_shape()?;

        Ok(CompiledGraph::new(self.nodes, self.edges))
    }

    /// Depth-first walk from START over every possible edge target:
    /// rejects cycles and collects reachability in one pass.
    fn check_shape(&self) -> Result<(), GraphError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Open,
            Done,
        }

        enum Frame {
            Enter(String),
            Exit(String),
        }

        let mut marks: HashMap<String, Mark> = HashMap::new();
        let mut stack = vec![Frame::Enter(START.to_string())];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(name) => {
                    if name == END {
                        continue;
                    }
                    match marks.get(&name) {
                        Some(Mark::Open) => return Err(GraphError::CycleDetected(name)),
                        Some(Mark::Done) => continue,
                        None => {}
                    }
                    marks.insert(name.clone(), Mark::Open);
                    stack.push(Frame::Exit(name.clone()));
                    if let Some(edge) = self.edges.get(&name) {
                        for target in edge.targets() {
                            stack.push(Frame::Enter(target.to_string()));
                        }
                    }
                }
                Frame::Exit(name) => {
                    marks.insert(name, Mark::Done);
                }
            }
        }

        for name in self.nodes.keys() {
            if !marks.contains_key(name) {
                return Err(GraphError::UnreachableNode(name.clone()));
            }
        }

        Ok(())
    }
}

impl<S> Default for StateGraph<S> {
    fn default() -> Self {
        Self::new()
    }
}
