//! 错误类型
//! Error types

use thiserror::Error;

/// 下游输出端 (sink) 返回的错误
pub type SinkError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, SmootherError>;

/// 观测被拒绝的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidReason {
    #[error("non-finite coordinate or radius")]
    NonFinite,
    #[error("composite shape without children")]
    EmptyComposite,
}

#[derive(Debug, Error)]
pub enum SmootherError {
    /// 输入帧中的观测无效, 整帧被拒绝 (跟踪状态未被修改)
    #[error("invalid observation #{index}: {reason}")]
    InvalidObservation { index: usize, reason: InvalidReason },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// 下游输出端失败 (不重试, 直接上抛)
    #[error("obstacle sink #{index} failed: {source}")]
    Sink {
        index: usize,
        #[source]
        source: SinkError,
    },
}
