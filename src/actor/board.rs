//! Board Actor - owns the running simulation
//!
//! HTTP worker threads talk to it through a [`BoardHandle`]. Every committed
//! state is published through an `ArcSwap`, so readers get the last whole
//! generation without waiting for a round in progress.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use super::messages::BoardMsg;
use super::simulation::{BoardSpec, ShardPlan, Simulation, SimulationError};
use crate::grid::Grid;
use crate::shard::{ShardCoord, ShardSnapshot};

const CHANNEL_BUFFER: usize = 32;

/// A committed generation of the whole board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardSnapshot {
    pub generation: u64,
    pub grid: Grid,
}

pub struct BoardActor {
    rx: mpsc::Receiver<BoardMsg>,
    plan: ShardPlan,
    simulation: Option<Simulation>,
    published: Arc<ArcSwapOption<BoardSnapshot>>,
}

/// Create a board actor and the handle used to drive it.
pub fn board_channel(plan: ShardPlan) -> (BoardActor, BoardHandle) {
    let (tx, rx) = mpsc::channel(CHANNEL_BUFFER);
    let published = Arc::new(ArcSwapOption::empty());
    let actor = BoardActor {
        rx,
        plan,
        simulation: None,
        published: Arc::clone(&published),
    };
    (actor, BoardHandle { tx, published })
}

impl BoardActor {
    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                BoardMsg::Bootstrap { spec, reply } => {
                    let _ = reply.send(self.bootstrap(spec).await);
                }
                BoardMsg::Step { count, reply } => {
                    let _ = reply.send(self.step(count).await);
                }
                BoardMsg::Shard { coord, reply } => {
                    let result = match &self.simulation {
                        Some(simulation) => simulation.shard(coord).await,
                        None => Err(SimulationError::NoBoard),
                    };
                    let _ = reply.send(result);
                }
                BoardMsg::Shutdown => break,
            }
        }

        if let Some(simulation) = self.simulation.take() {
            simulation.close().await;
        }
        crate::debug!("board"; "stopped");
    }

    async fn bootstrap(&mut self, spec: BoardSpec) -> Result<Arc<BoardSnapshot>, SimulationError> {
        // Reject bad input while the current board is still intact
        let layout = self.plan.layout(spec.width, spec.height)?;
        let grid = spec.seed.build(spec.width, spec.height)?;

        // Remote shards are reused, so the old board must let go first
        if let Some(old) = self.simulation.take() {
            old.close().await;
        }
        self.published.store(None);

        let simulation = Simulation::start(&self.plan, layout, grid).await?;
        let snapshot = Arc::new(simulation.snapshot().await?);
        self.simulation = Some(simulation);
        self.published.store(Some(Arc::clone(&snapshot)));

        crate::log!(
            "board";
            "{}x{} board ready{}",
            spec.width,
            spec.height,
            self.describe_layout()
        );
        Ok(snapshot)
    }

    async fn step(&mut self, count: u64) -> Result<Arc<BoardSnapshot>, SimulationError> {
        let simulation = self.simulation.as_mut().ok_or(SimulationError::NoBoard)?;
        let stepped = simulation.step(count, crate::core::is_shutdown).await;

        // Rounds committed before a failure are still published
        let snapshot = match simulation.snapshot().await {
            Ok(snapshot) => Arc::new(snapshot),
            Err(e) => return Err(step_failure(stepped, e)),
        };
        self.published.store(Some(Arc::clone(&snapshot)));

        let completed = stepped?;
        if completed < count {
            crate::log!("board"; "stopped after {} of {} generations", completed, count);
        }
        Ok(snapshot)
    }

    fn describe_layout(&self) -> String {
        match self.simulation.as_ref().and_then(Simulation::layout) {
            Some(layout) => format!(
                ", {}x{} shards of {}x{}",
                layout.columns(),
                layout.rows(),
                layout.shard_width(),
                layout.shard_height()
            ),
            None => String::new(),
        }
    }
}

/// Error reported when no snapshot could be taken after a step.
///
/// A failed round is the cause; the snapshot error is only logged.
fn step_failure(stepped: Result<u64, SimulationError>, snapshot: SimulationError) -> SimulationError {
    match stepped {
        Err(round) => {
            crate::log!("board"; "no snapshot after failed round: {}", snapshot);
            round
        }
        Ok(_) => snapshot,
    }
}

/// Blocking access to the board actor for non-async threads.
#[derive(Clone)]
pub struct BoardHandle {
    tx: mpsc::Sender<BoardMsg>,
    published: Arc<ArcSwapOption<BoardSnapshot>>,
}

impl BoardHandle {
    pub fn bootstrap(&self, spec: BoardSpec) -> Result<Arc<BoardSnapshot>, SimulationError> {
        self.call(|reply| BoardMsg::Bootstrap { spec, reply })
    }

    pub fn step(&self, count: u64) -> Result<Arc<BoardSnapshot>, SimulationError> {
        self.call(|reply| BoardMsg::Step { count, reply })
    }

    pub fn shard(&self, coord: ShardCoord) -> Result<ShardSnapshot, SimulationError> {
        self.call(|reply| BoardMsg::Shard { coord, reply })
    }

    /// Last committed board, without waiting on the actor.
    pub fn latest(&self) -> Option<Arc<BoardSnapshot>> {
        self.published.load_full()
    }

    /// Ask the actor to release its shards and stop.
    ///
    /// Messages already queued are handled first.
    pub fn shutdown(&self) {
        let _ = self.tx.blocking_send(BoardMsg::Shutdown);
    }

    fn call<R>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<R, SimulationError>>) -> BoardMsg,
    ) -> Result<R, SimulationError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .blocking_send(make(reply))
            .map_err(|_| SimulationError::ActorGone)?;
        response
            .blocking_recv()
            .map_err(|_| SimulationError::ActorGone)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Seed;
    use std::thread;

    fn spawn(plan: ShardPlan) -> (BoardHandle, thread::JoinHandle<()>) {
        let (actor, handle) = board_channel(plan);
        let thread = thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(actor.run());
        });
        (handle, thread)
    }

    fn blinker() -> BoardSpec {
        BoardSpec {
            width: 6,
            height: 6,
            seed: Seed::Cells(vec![(1, 0), (1, 1), (1, 2)]),
        }
    }

    #[test]
    fn test_round_error_wins_over_snapshot_error() {
        let err = step_failure(Err(SimulationError::NoBoard), SimulationError::ActorGone);
        assert!(matches!(err, SimulationError::NoBoard));

        let err = step_failure(Ok(2), SimulationError::ActorGone);
        assert!(matches!(err, SimulationError::ActorGone));
    }

    #[test]
    fn test_bootstrap_rejects_oversized_board() {
        let (handle, thread) = spawn(ShardPlan::default());
        handle.bootstrap(blinker()).unwrap();

        let huge = BoardSpec {
            width: usize::MAX,
            height: 2,
            ..blinker()
        };
        let err = handle.bootstrap(huge).unwrap_err();
        assert!(err.is_bad_request(), "{err}");
        assert_eq!(handle.latest().unwrap().generation, 0);

        handle.shutdown();
        thread.join().unwrap();
    }

    #[test]
    fn test_step_before_bootstrap() {
        let (handle, thread) = spawn(ShardPlan::default());
        assert!(handle.latest().is_none());
        assert!(matches!(handle.step(1), Err(SimulationError::NoBoard)));
        handle.shutdown();
        thread.join().unwrap();
    }

    #[test]
    fn test_bootstrap_step_publish() {
        let plan = ShardPlan {
            grid: Some((2, 2)),
            ..ShardPlan::default()
        };
        let (handle, thread) = spawn(plan);

        let seeded = handle.bootstrap(blinker()).unwrap();
        assert_eq!(seeded.generation, 0);
        assert_eq!(handle.latest().unwrap().generation, 0);

        let stepped = handle.step(3).unwrap();
        assert_eq!(stepped.generation, 3);
        assert_eq!(stepped.grid.live_cells().collect::<Vec<_>>(), vec![(0, 1), (1, 1), (2, 1)]);
        assert_eq!(handle.latest().unwrap(), stepped);

        let shard = handle.shard(ShardCoord::new(0, 0)).unwrap();
        assert_eq!(shard.generation, 3);

        handle.shutdown();
        thread.join().unwrap();
        assert!(matches!(handle.step(1), Err(SimulationError::ActorGone)));
    }

    #[test]
    fn test_bad_bootstrap_keeps_current_board() {
        let plan = ShardPlan {
            grid: Some((2, 2)),
            ..ShardPlan::default()
        };
        let (handle, thread) = spawn(plan);
        handle.bootstrap(blinker()).unwrap();
        handle.step(1).unwrap();

        let odd = BoardSpec {
            width: 7,
            ..blinker()
        };
        let err = handle.bootstrap(odd).unwrap_err();
        assert!(err.is_bad_request(), "{err}");
        assert_eq!(handle.latest().unwrap().generation, 1);
        assert_eq!(handle.step(1).unwrap().generation, 2);

        handle.shutdown();
        thread.join().unwrap();
    }
}
