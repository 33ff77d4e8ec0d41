use thiserror::Error;

/// Errors surfaced to callers of the contraction core (spec §7).
///
/// All are fatal to the contraction in progress; none are retried. Once a
/// pair merge has committed, the `Network` that produced the error should
/// be discarded rather than reused.
#[derive(Error, Debug)]
pub enum ContractError {
    #[error("dimension mismatch: {context} (left={left}, right={right})")]
    DimensionMismatch {
        context: &'static str,
        left: usize,
        right: usize,
    },

    #[error("network is disconnected: {components} connected components contain edges")]
    DisconnectedNetwork { components: usize },

    #[error("pair merge would need {needed} subscript labels, alphabet has {available}")]
    RankExceedsAlphabet { needed: usize, available: usize },

    #[error("copy node has an unsupported non-dangling edge count after preprocessing: {count}")]
    InvalidCopyNode { count: usize },

    #[error("backend einsum failed: {0}")]
    BackendError(String),

    #[error("optimizer returned an invalid path: {0}")]
    PathError(String),

    #[error("no algorithm registered under the name '{0}'")]
    UnknownAlgorithm(String),
}
