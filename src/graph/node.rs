//! The unit of work executed at each step of a workflow.

use async_trait::async_trait;

use crate::error::Error;

/// A single named unit of work in a workflow graph.
///
/// A node reads and writes the state fields it declares and performs at most
/// one external-collaborator call. This is a documented contract, not a
/// runtime check — the engine trusts nodes to be well-behaved.
#[async_trait]
pub trait Node<S>: Send + Sync {
    async fn run(&self, state: &mut S) -> Result<(), Error>;
}

/// Adapter turning a plain synchronous transform into a [`Node`].
pub struct FnNode<F> {
    transform: F,
}

impl<F> FnNode<F> {
    pub fn new(transform: F) -> Self {
        Self { transform }
    }
}

#[async_trait]
impl<S, F> Node<S> for FnNode<F>
where
    S: Send,
    F: Fn(&mut S) -> Result<(), Error> + Send + Sync,
{
    async fn run(&self, state: &mut S) -> Result<(), Error> {
        (self.transform)(state)
    }
}
