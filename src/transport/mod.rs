//! Coordinator-to-shard messaging.
//!
//! Every shard is addressed by its [`ShardCoord`]. Two implementations:
//!
//! | Transport        | Shards live in                    |
//! |------------------|-----------------------------------|
//! | `LocalTransport` | tokio tasks in this process       |
//! | `TcpTransport`   | `shardlife shard` processes       |
//!
//! Both carry the same [`ShardRequest`]/[`ShardResponse`] pairs, so the
//! coordinator is written once against [`ShardTransport`].

mod local;
mod retry;
mod tcp;
mod wire;

pub use local::LocalTransport;
pub use retry::RetryPolicy;
pub use tcp::{ShardServer, TcpTransport};
pub use wire::{ShardRequest, ShardResponse};

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::grid::Grid;
use crate::shard::{BorderSet, ShardCoord, ShardError, ShardSnapshot, StepOutcome};

/// Failure to get an answer from a shard.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("shard {coord} unreachable: {reason}")]
    Unreachable { coord: ShardCoord, reason: String },

    #[error("shard {0} did not answer within {1:?}")]
    Timeout(ShardCoord, Duration),

    #[error("shard {0} is gone")]
    Closed(ShardCoord),

    #[error("no shard registered at {0}")]
    UnknownShard(ShardCoord),

    #[error("shard {coord} sent a malformed reply: {reason}")]
    Protocol { coord: ShardCoord, reason: String },

    #[error("shard {coord} rejected the request: {source}")]
    Remote {
        coord: ShardCoord,
        #[source]
        source: ShardError,
    },
}

impl TransportError {
    /// Whether the same request may succeed if sent again.
    ///
    /// Only delivery failures qualify. A shard that answered with an error
    /// will answer the same way next time.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unreachable { .. } | Self::Timeout(..))
    }

    fn unexpected(coord: ShardCoord, response: ShardResponse) -> Self {
        match response {
            ShardResponse::Failed(source) => Self::Remote { coord, source },
            other => Self::Protocol {
                coord,
                reason: format!("unexpected `{}` reply", other.kind()),
            },
        }
    }
}

/// Request/response channel to every shard of one board.
///
/// Implementations only have to move a request to the shard and its reply
/// back; the typed helpers are built on [`ShardTransport::request`].
pub trait ShardTransport: Send + Sync + 'static {
    fn request(
        &self,
        coord: ShardCoord,
        request: ShardRequest,
    ) -> impl Future<Output = Result<ShardResponse, TransportError>> + Send;

    /// Stop talking to every shard. Further requests fail.
    fn close(&self) -> impl Future<Output = ()> + Send;

    fn provision(
        &self,
        coord: ShardCoord,
        grid: Grid,
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        async move {
            match self.request(coord, ShardRequest::Provision { coord, grid }).await? {
                ShardResponse::Provisioned => Ok(()),
                other => Err(TransportError::unexpected(coord, other)),
            }
        }
    }

    fn step(
        &self,
        coord: ShardCoord,
        generation: u64,
        borders: BorderSet,
    ) -> impl Future<Output = Result<StepOutcome, TransportError>> + Send {
        async move {
            let request = ShardRequest::Step {
                generation,
                borders,
            };
            match self.request(coord, request).await? {
                ShardResponse::Stepped(outcome) => Ok(outcome),
                other => Err(TransportError::unexpected(coord, other)),
            }
        }
    }

    fn rollback(
        &self,
        coord: ShardCoord,
        generation: u64,
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        async move {
            match self.request(coord, ShardRequest::Rollback { generation }).await? {
                ShardResponse::RolledBack => Ok(()),
                other => Err(TransportError::unexpected(coord, other)),
            }
        }
    }

    fn snapshot(
        &self,
        coord: ShardCoord,
    ) -> impl Future<Output = Result<ShardSnapshot, TransportError>> + Send {
        async move {
            match self.request(coord, ShardRequest::Snapshot).await? {
                ShardResponse::Snapshot(snapshot) => Ok(snapshot),
                other => Err(TransportError::unexpected(coord, other)),
            }
        }
    }

    fn release(&self, coord: ShardCoord) -> impl Future<Output = Result<(), TransportError>> + Send {
        async move {
            match self.request(coord, ShardRequest::Release).await? {
                ShardResponse::Released => Ok(()),
                other => Err(TransportError::unexpected(coord, other)),
            }
        }
    }
}

/// Transport chosen at runtime from configuration.
pub enum AnyTransport {
    Local(LocalTransport),
    Tcp(TcpTransport),
}

impl ShardTransport for AnyTransport {
    async fn request(
        &self,
        coord: ShardCoord,
        request: ShardRequest,
    ) -> Result<ShardResponse, TransportError> {
        match self {
            Self::Local(transport) => transport.request(coord, request).await,
            Self::Tcp(transport) => transport.request(coord, request).await,
        }
    }

    async fn close(&self) {
        match self {
            Self::Local(transport) => transport.close().await,
            Self::Tcp(transport) => transport.close().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_delivery_failures_retry() {
        let coord = ShardCoord::new(0, 1);
        assert!(
            TransportError::Unreachable {
                coord,
                reason: "refused".into()
            }
            .is_retryable()
        );
        assert!(TransportError::Timeout(coord, Duration::from_millis(5)).is_retryable());
        assert!(!TransportError::Closed(coord).is_retryable());
        assert!(
            !TransportError::Remote {
                coord,
                source: ShardError::NotProvisioned
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_unexpected_reply_mapping() {
        let coord = ShardCoord::new(2, 0);
        assert_eq!(
            TransportError::unexpected(coord, ShardResponse::Failed(ShardError::NotProvisioned)),
            TransportError::Remote {
                coord,
                source: ShardError::NotProvisioned
            }
        );
        assert!(matches!(
            TransportError::unexpected(coord, ShardResponse::Released),
            TransportError::Protocol { reason, .. } if reason.contains("released")
        ));
    }
}
