//! Everything that touches `kubectl`: the read-only command gate, the
//! subprocess executor and cluster/context inspection.

mod cluster;
mod executor;
mod guard;

pub use cluster::{ClusterInspector, ClusterStatus, ContextList, NodeStatus};
pub use executor::{CommandOutput, Kubectl, KubectlExecutor, LineReport, truncate_output};
pub use guard::{CommandGuard, KubectlInvocation};
