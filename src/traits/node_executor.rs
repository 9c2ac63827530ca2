use async_trait::async_trait;
use std::fmt::Display;

use crate::engine::outcome::NodeInputs;
use crate::graph::NodeId;

/// The unit of work run for one node.
///
/// Implementations are the scheduler's only suspension point: they may be
/// arbitrarily slow, network-bound, and own their own timeout and retry
/// policy. The scheduler never interprets `Output` or `Error`.
///
/// `inputs` holds one entry per direct predecessor. A predecessor that
/// failed appears as [`UpstreamOutput::NoOutput`](crate::engine::outcome::UpstreamOutput::NoOutput);
/// deciding what that means for this node is up to the implementation.
///
/// Returning `Err` records a failed outcome for the node. A panic inside
/// `execute` is caught at the task boundary and recorded the same way; it
/// never takes down the run.
#[async_trait]
pub trait NodeExecutor: Send + Sync + 'static {
    type Output: Clone + Send + Sync + 'static;
    type Error: Display + Send + 'static;

    async fn execute(
        &self,
        node: &NodeId,
        inputs: NodeInputs<Self::Output>,
    ) -> Result<Self::Output, Self::Error>;
}
