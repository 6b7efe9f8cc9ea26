/// Programming errors detected by the `try_*` entry points.
///
/// The panicking counterparts (`call`, `clusterize`, ...) treat these as wiring
/// bugs and fail fast; the `try_*` variants hand them back instead, for callers
/// that prefer to report and carry on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Function has no target (never set, cleared, or moved from)")]
    EmptyFunction,

    #[error("Cluster index {index} is out of range for {clusters} clusters")]
    ClusterOutOfRange { index: usize, clusters: usize },

    #[error("Node is being triggered and cannot be modified")]
    NodeBusy,

    #[error("Node re-entered more than {limit} times; feedback loop does not terminate")]
    ReentrancyLimit { limit: u16 },
}
