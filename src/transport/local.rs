//! In-process transport: one tokio task per shard.

use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::{ShardRequest, ShardResponse, ShardTransport, TransportError};
use crate::actor::{ShardActor, ShardMsg};
use crate::shard::{ShardCoord, ShardLayout};

/// Mailbox size per shard. A coordinator has at most one request in flight
/// per shard, so this only absorbs shutdown racing a request.
const CHANNEL_BUFFER: usize = 4;

/// How long `close` waits for shard tasks to finish.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

pub struct LocalTransport {
    shards: FxHashMap<ShardCoord, mpsc::Sender<ShardMsg>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    timeout: Duration,
}

impl LocalTransport {
    /// Spawn one shard actor per coordinate of `layout`. A request that is
    /// not answered within `timeout` fails as retryable.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(layout: &ShardLayout, timeout: Duration) -> Self {
        let mut shards = FxHashMap::default();
        let mut handles = Vec::with_capacity(layout.shard_count());

        for coord in layout.coords() {
            let (tx, rx) = mpsc::channel(CHANNEL_BUFFER);
            let actor = ShardActor::new(coord, rx);
            handles.push(tokio::spawn(actor.run()));
            shards.insert(coord, tx);
        }
        crate::debug!("shard"; "spawned {} local shards", shards.len());

        Self {
            shards,
            handles: Mutex::new(handles),
            timeout,
        }
    }
}

impl ShardTransport for LocalTransport {
    async fn request(
        &self,
        coord: ShardCoord,
        request: ShardRequest,
    ) -> Result<ShardResponse, TransportError> {
        let tx = self
            .shards
            .get(&coord)
            .ok_or(TransportError::UnknownShard(coord))?;

        let exchange = async {
            let (reply, response) = oneshot::channel();
            tx.send(ShardMsg::Request { request, reply })
                .await
                .map_err(|_| TransportError::Closed(coord))?;
            response.await.map_err(|_| TransportError::Closed(coord))
        };
        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| TransportError::Timeout(coord, self.timeout))?
    }

    async fn close(&self) {
        for tx in self.shards.values() {
            let _ = tx.send(ShardMsg::Shutdown).await;
        }
        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            if tokio::time::timeout(SHUTDOWN_GRACE, handle).await.is_err() {
                crate::debug!("shard"; "shard task did not stop in time");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use crate::shard::{BorderSet, ShardError};

    #[tokio::test]
    async fn test_round_trip_through_actor() {
        let layout = ShardLayout::new(6, 6, 2, 2).unwrap();
        let transport = LocalTransport::spawn(&layout, Duration::from_secs(5));
        let coord = ShardCoord::new(1, 0);

        transport
            .provision(coord, Grid::with_live_cells(3, 3, [(1, 0), (1, 1), (1, 2)]).unwrap())
            .await
            .unwrap();
        let outcome = transport.step(coord, 0, BorderSet::dead(3, 3)).await.unwrap();
        assert_eq!(outcome.generation, 1);

        let snapshot = transport.snapshot(coord).await.unwrap();
        assert_eq!(snapshot.coord, coord);
        assert_eq!(snapshot.grid.live_count(), 3);

        transport.close().await;
    }

    #[tokio::test]
    async fn test_shard_errors_surface_as_remote() {
        let layout = ShardLayout::new(6, 6, 2, 2).unwrap();
        let transport = LocalTransport::spawn(&layout, Duration::from_secs(5));

        let err = transport.snapshot(ShardCoord::new(0, 1)).await.unwrap_err();
        assert_eq!(
            err,
            TransportError::Remote {
                coord: ShardCoord::new(0, 1),
                source: ShardError::NotProvisioned
            }
        );
        transport.close().await;
    }

    #[tokio::test]
    async fn test_unanswered_request_times_out() {
        let coord = ShardCoord::new(0, 0);
        let timeout = Duration::from_millis(20);
        // The mailbox accepts the request but nothing ever reads it
        let (tx, _rx) = mpsc::channel(CHANNEL_BUFFER);
        let transport = LocalTransport {
            shards: [(coord, tx)].into_iter().collect(),
            handles: Mutex::new(Vec::new()),
            timeout,
        };

        let err = transport.snapshot(coord).await.unwrap_err();
        assert_eq!(err, TransportError::Timeout(coord, timeout));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_requests_after_close_fail() {
        let layout = ShardLayout::new(3, 3, 1, 1).unwrap();
        let transport = LocalTransport::spawn(&layout, Duration::from_secs(5));
        transport.close().await;

        let err = transport.snapshot(ShardCoord::new(0, 0)).await.unwrap_err();
        assert_eq!(err, TransportError::Closed(ShardCoord::new(0, 0)));
        assert!(matches!(
            transport.snapshot(ShardCoord::new(4, 4)).await,
            Err(TransportError::UnknownShard(_))
        ));
    }
}
