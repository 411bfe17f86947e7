//! Coordinator - drives every shard through lock-step rounds
//!
//! # Round protocol
//!
//! ```text
//!            inbound[i]                 outbound[i]
//! Coordinator ---------> shard i (xN) -------------> barrier --> route --> inbound'
//!                 concurrent                 wait for all N
//! ```
//!
//! A round commits only when every shard has answered. If any shard fails
//! after retries, the shards that did advance are rolled back and the board
//! stays at the previous generation.

use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinSet;

use crate::grid::Grid;
use crate::shard::{BorderSet, ShardCoord, ShardLayout, ShardSnapshot};
use crate::transport::{RetryPolicy, ShardTransport, TransportError};

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("shard {coord} failed in round {generation} after {attempts} attempt(s)")]
    ShardFailed {
        coord: ShardCoord,
        generation: u64,
        attempts: u32,
        #[source]
        source: TransportError,
    },

    #[error("shard task failed in round {generation}: {reason}")]
    TaskFailed { generation: u64, reason: String },

    #[error("failed to provision shard {coord}")]
    Provision {
        coord: ShardCoord,
        #[source]
        source: TransportError,
    },

    #[error("failed to read shard {coord}")]
    Snapshot {
        coord: ShardCoord,
        #[source]
        source: TransportError,
    },

    #[error("shard {coord} is at generation {actual}, board is at {expected}")]
    TornSnapshot {
        coord: ShardCoord,
        expected: u64,
        actual: u64,
    },

    #[error("board is {actual:?}, layout expects {expected:?}")]
    BoardSize {
        expected: (usize, usize),
        actual: (usize, usize),
    },
}

/// Drives the shards of one board through synchronized generations.
pub struct Coordinator<T: ShardTransport> {
    layout: ShardLayout,
    transport: Arc<T>,
    retry: RetryPolicy,
    generation: u64,
    /// Borders each shard consumes next round, row-major.
    inbound: Vec<BorderSet>,
}

impl<T: ShardTransport> Coordinator<T> {
    /// Split `board` over the shards of `layout` and provision them all.
    ///
    /// Generation 0 inbound borders are cut from `board` directly, so the
    /// first round already sees real neighbors.
    pub async fn start(
        layout: ShardLayout,
        transport: Arc<T>,
        retry: RetryPolicy,
        board: &Grid,
    ) -> Result<Self, CoordinatorError> {
        let expected = (layout.board_width(), layout.board_height());
        let actual = (board.width(), board.height());
        if expected != actual {
            return Err(CoordinatorError::BoardSize { expected, actual });
        }

        let mut tasks = JoinSet::new();
        for (coord, grid) in layout.coords().zip(layout.split(board)) {
            let transport = Arc::clone(&transport);
            tasks.spawn(async move {
                let result = retry
                    .run(|| transport.provision(coord, grid.clone()))
                    .await;
                (coord, result)
            });
        }

        let mut failure = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(()))) => {}
                Ok((coord, Err(exhausted))) => {
                    failure.get_or_insert(CoordinatorError::Provision {
                        coord,
                        source: exhausted.error,
                    });
                }
                Err(e) => {
                    failure.get_or_insert(CoordinatorError::TaskFailed {
                        generation: 0,
                        reason: e.to_string(),
                    });
                }
            }
        }
        if let Some(err) = failure {
            return Err(err);
        }

        crate::debug!(
            "coordinator";
            "provisioned {} shards ({}x{} each)",
            layout.shard_count(),
            layout.shard_width(),
            layout.shard_height()
        );

        Ok(Self {
            inbound: layout.seed_borders(board),
            layout,
            transport,
            retry,
            generation: 0,
        })
    }

    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub const fn layout(&self) -> &ShardLayout {
        &self.layout
    }

    /// Run one round. Returns the new generation.
    ///
    /// On error the board is left at the generation it started from.
    pub async fn round(&mut self) -> Result<u64, CoordinatorError> {
        let generation = self.generation;
        let mut tasks = JoinSet::new();

        for coord in self.layout.coords() {
            let transport = Arc::clone(&self.transport);
            let borders = self.inbound[self.layout.index(coord)].clone();
            let retry = self.retry;
            tasks.spawn(async move {
                let result = retry
                    .run(|| transport.step(coord, generation, borders.clone()))
                    .await;
                (coord, result)
            });
        }

        // Barrier: every dispatched step is awaited, even after a failure,
        // so no request is still in flight when we roll back.
        let mut pending = self.layout.shard_count();
        let mut outbound: Vec<Option<BorderSet>> = vec![None; pending];
        let mut failure = None;

        while pending > 0 {
            let Some(joined) = tasks.join_next().await else {
                break;
            };
            pending -= 1;

            match joined {
                Ok((coord, Ok(outcome))) => {
                    outbound[self.layout.index(coord)] = Some(outcome.outbound);
                }
                Ok((coord, Err(exhausted))) => {
                    crate::log!("round"; "shard {} failed: {}", coord, exhausted.error);
                    failure.get_or_insert(CoordinatorError::ShardFailed {
                        coord,
                        generation,
                        attempts: exhausted.attempts,
                        source: exhausted.error,
                    });
                }
                Err(e) => {
                    failure.get_or_insert(CoordinatorError::TaskFailed {
                        generation,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if let Some(err) = failure {
            self.rollback(generation).await;
            return Err(err);
        }

        let outbound: Vec<BorderSet> = outbound.into_iter().flatten().collect();
        self.inbound = self.layout.route(&outbound);
        self.generation += 1;
        crate::debug!("round"; "generation {} committed", self.generation);
        Ok(self.generation)
    }

    /// Return every shard to `generation` after an aborted round.
    ///
    /// Shards that never advanced treat this as a no-op. A shard that cannot
    /// be reached is only logged; the round error already reports the failure.
    async fn rollback(&self, generation: u64) {
        let mut tasks = JoinSet::new();
        for coord in self.layout.coords() {
            let transport = Arc::clone(&self.transport);
            let retry = self.retry;
            tasks.spawn(async move {
                let result = retry.run(|| transport.rollback(coord, generation)).await;
                (coord, result)
            });
        }
        while let Some(joined) = tasks.join_next().await {
            if let Ok((coord, Err(exhausted))) = joined {
                crate::log!("round"; "rollback of shard {} failed: {}", coord, exhausted.error);
            }
        }
        crate::debug!("round"; "rolled back to generation {}", generation);
    }

    /// Run up to `generations` rounds, checking `should_stop` before each.
    ///
    /// Returns the number of rounds completed. Stopping never interrupts a
    /// round in progress.
    pub async fn run(
        &mut self,
        generations: u64,
        should_stop: impl Fn() -> bool,
    ) -> Result<u64, CoordinatorError> {
        for completed in 0..generations {
            if should_stop() {
                crate::debug!("round"; "stop requested after {} rounds", completed);
                return Ok(completed);
            }
            self.round().await?;
        }
        Ok(generations)
    }

    /// Every shard's grid, all at the committed generation, row-major.
    pub async fn snapshots(&self) -> Result<Vec<ShardSnapshot>, CoordinatorError> {
        let mut tasks = JoinSet::new();
        for coord in self.layout.coords() {
            let transport = Arc::clone(&self.transport);
            let retry = self.retry;
            tasks.spawn(async move { (coord, retry.run(|| transport.snapshot(coord)).await) });
        }

        let mut snapshots: Vec<Option<ShardSnapshot>> = vec![None; self.layout.shard_count()];
        let mut failure = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((coord, Ok(snapshot))) => {
                    snapshots[self.layout.index(coord)] = Some(snapshot);
                }
                Ok((coord, Err(exhausted))) => {
                    failure.get_or_insert(CoordinatorError::Snapshot {
                        coord,
                        source: exhausted.error,
                    });
                }
                Err(e) => {
                    failure.get_or_insert(CoordinatorError::TaskFailed {
                        generation: self.generation,
                        reason: e.to_string(),
                    });
                }
            }
        }
        if let Some(err) = failure {
            return Err(err);
        }

        let snapshots: Vec<ShardSnapshot> = snapshots.into_iter().flatten().collect();
        for snapshot in &snapshots {
            if snapshot.generation != self.generation {
                return Err(CoordinatorError::TornSnapshot {
                    coord: snapshot.coord,
                    expected: self.generation,
                    actual: snapshot.generation,
                });
            }
        }
        Ok(snapshots)
    }

    /// Reassemble the full board at the committed generation.
    pub async fn board(&self) -> Result<Grid, CoordinatorError> {
        let snapshots = self.snapshots().await?;
        Ok(self
            .layout
            .assemble(snapshots.iter().map(|s| (s.coord, &s.grid))))
    }

    pub async fn shard(&self, coord: ShardCoord) -> Result<ShardSnapshot, CoordinatorError> {
        self.retry
            .run(|| self.transport.snapshot(coord))
            .await
            .map_err(|exhausted| CoordinatorError::Snapshot {
                coord,
                source: exhausted.error,
            })
    }

    /// Release every shard and close the transport.
    pub async fn shutdown(self) {
        for coord in self.layout.coords() {
            if let Err(e) = self.transport.release(coord).await {
                crate::debug!("coordinator"; "release of shard {} failed: {}", coord, e);
            }
        }
        self.transport.close().await;
    }
}
