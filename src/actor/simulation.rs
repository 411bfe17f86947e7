//! One board and whatever computes it: a single grid or a shard coordinator.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use super::board::BoardSnapshot;
use super::coordinator::{Coordinator, CoordinatorError};
use crate::config::LifeConfig;
use crate::grid::{Grid, GridError, Seed};
use crate::shard::{LayoutError, ShardCoord, ShardLayout, ShardSnapshot};
use crate::transport::{AnyTransport, LocalTransport, RetryPolicy, ShardTransport, TcpTransport};

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Grid(#[from] GridError),

    #[error("invalid shard layout: {0}")]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),

    #[error("no board has been bootstrapped")]
    NoBoard,

    #[error("board is not sharded")]
    NotSharded,

    #[error("no shard at {coord} in a {columns}x{rows} shard grid")]
    NoSuchShard {
        coord: ShardCoord,
        columns: usize,
        rows: usize,
    },

    #[error("board actor is not running")]
    ActorGone,
}

impl SimulationError {
    /// Errors caused by the request rather than by the shards.
    pub const fn is_bad_request(&self) -> bool {
        matches!(
            self,
            Self::Grid(_) | Self::Layout(_) | Self::NotSharded | Self::NoSuchShard { .. }
        )
    }
}

/// Size and initial contents of a board.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardSpec {
    pub width: usize,
    pub height: usize,
    pub seed: Seed,
}

/// How a board is split over shards and how they are reached.
#[derive(Debug, Clone, PartialEq)]
pub struct ShardPlan {
    /// Explicit `columns x rows` shard grid.
    pub grid: Option<(usize, usize)>,
    /// Square shard grid from a count.
    pub count: Option<usize>,
    /// Remote shard addresses, row-major. Empty means in-process shards.
    pub addresses: Vec<String>,
    pub retry: RetryPolicy,
    pub timeout: Duration,
}

impl Default for ShardPlan {
    fn default() -> Self {
        Self {
            grid: None,
            count: None,
            addresses: Vec::new(),
            retry: RetryPolicy::default(),
            timeout: Duration::from_secs(5),
        }
    }
}

impl ShardPlan {
    pub fn from_config(config: &LifeConfig) -> Self {
        let transport = &config.transport;
        Self {
            grid: config.shards.grid.map(|[columns, rows]| (columns, rows)),
            count: config.shards.count,
            addresses: config.shards.addresses.clone(),
            retry: RetryPolicy {
                max_attempts: transport.max_attempts,
                backoff: Duration::from_millis(transport.backoff_ms),
                max_backoff: Duration::from_millis(transport.max_backoff_ms),
            },
            timeout: Duration::from_millis(transport.timeout_ms),
        }
    }

    /// Layout for a `width x height` board, or `None` for an unsharded one.
    ///
    /// A bare list of addresses implies a square grid of that many shards.
    pub fn layout(&self, width: usize, height: usize) -> Result<Option<ShardLayout>, LayoutError> {
        let layout = match (self.grid, self.count) {
            (Some((columns, rows)), _) => ShardLayout::new(width, height, columns, rows)?,
            (None, Some(count)) => ShardLayout::square(width, height, count)?,
            (None, None) if !self.addresses.is_empty() => {
                ShardLayout::square(width, height, self.addresses.len())?
            }
            (None, None) => return Ok(None),
        };
        if !self.addresses.is_empty() {
            layout.expect_count(self.addresses.len())?;
        }
        Ok(Some(layout))
    }

    /// Transport for `layout`. Local shards are spawned on the current runtime.
    pub fn transport(&self, layout: &ShardLayout) -> Result<AnyTransport, LayoutError> {
        if self.addresses.is_empty() {
            Ok(AnyTransport::Local(LocalTransport::spawn(layout, self.timeout)))
        } else {
            let transport = TcpTransport::new(layout, &self.addresses, self.timeout)?;
            Ok(AnyTransport::Tcp(transport))
        }
    }
}

enum Engine {
    Single { grid: Grid, generation: u64 },
    Sharded(Coordinator<AnyTransport>),
}

pub struct Simulation {
    engine: Engine,
}

impl Simulation {
    /// Seed a board and distribute it according to `plan`.
    ///
    /// The layout is validated before any shard is contacted.
    pub async fn bootstrap(plan: &ShardPlan, spec: &BoardSpec) -> Result<Self, SimulationError> {
        let layout = plan.layout(spec.width, spec.height)?;
        let grid = spec.seed.build(spec.width, spec.height)?;
        Self::start(plan, layout, grid).await
    }

    /// Distribute an already seeded board over `layout`, or keep it whole
    /// when there is none.
    pub async fn start(
        plan: &ShardPlan,
        layout: Option<ShardLayout>,
        grid: Grid,
    ) -> Result<Self, SimulationError> {
        crate::debug_do! {
            let live = grid.live_count();
            crate::debug!("board"; "seeded {}x{} board, {} live", grid.width(), grid.height(), live);
        }

        let engine = match layout {
            None => Engine::Single { grid, generation: 0 },
            Some(layout) => {
                let transport = Arc::new(plan.transport(&layout)?);
                match Coordinator::start(layout, Arc::clone(&transport), plan.retry, &grid).await {
                    Ok(coordinator) => Engine::Sharded(coordinator),
                    Err(e) => {
                        transport.close().await;
                        return Err(e.into());
                    }
                }
            }
        };
        Ok(Self { engine })
    }

    pub const fn generation(&self) -> u64 {
        match &self.engine {
            Engine::Single { generation, .. } => *generation,
            Engine::Sharded(coordinator) => coordinator.generation(),
        }
    }

    pub const fn layout(&self) -> Option<&ShardLayout> {
        match &self.engine {
            Engine::Single { .. } => None,
            Engine::Sharded(coordinator) => Some(coordinator.layout()),
        }
    }

    /// Advance up to `count` generations. Returns how many were completed.
    pub async fn step(
        &mut self,
        count: u64,
        should_stop: impl Fn() -> bool,
    ) -> Result<u64, SimulationError> {
        match &mut self.engine {
            Engine::Single { grid, generation } => {
                for completed in 0..count {
                    if should_stop() {
                        return Ok(completed);
                    }
                    *grid = grid.step_toroidal();
                    *generation += 1;
                }
                Ok(count)
            }
            Engine::Sharded(coordinator) => Ok(coordinator.run(count, should_stop).await?),
        }
    }

    /// Full board at the last committed generation.
    pub async fn snapshot(&self) -> Result<BoardSnapshot, SimulationError> {
        match &self.engine {
            Engine::Single { grid, generation } => Ok(BoardSnapshot {
                generation: *generation,
                grid: grid.clone(),
            }),
            Engine::Sharded(coordinator) => Ok(BoardSnapshot {
                generation: coordinator.generation(),
                grid: coordinator.board().await?,
            }),
        }
    }

    pub async fn shard(&self, coord: ShardCoord) -> Result<ShardSnapshot, SimulationError> {
        let Engine::Sharded(coordinator) = &self.engine else {
            return Err(SimulationError::NotSharded);
        };
        let layout = coordinator.layout();
        if coord.row >= layout.rows() || coord.col >= layout.columns() {
            return Err(SimulationError::NoSuchShard {
                coord,
                columns: layout.columns(),
                rows: layout.rows(),
            });
        }
        Ok(coordinator.shard(coord).await?)
    }

    /// Release the shards, if any.
    pub async fn close(self) {
        if let Engine::Sharded(coordinator) = self.engine {
            coordinator.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(width: usize, height: usize, seed: Seed) -> BoardSpec {
        BoardSpec {
            width,
            height,
            seed,
        }
    }

    #[test]
    fn test_plan_layout() {
        let mut plan = ShardPlan::default();
        assert_eq!(plan.layout(10, 10), Ok(None));

        plan.grid = Some((2, 1));
        assert_eq!(plan.layout(10, 10).unwrap().unwrap().columns(), 2);

        plan.grid = None;
        plan.count = Some(3);
        assert_eq!(plan.layout(12, 12), Err(LayoutError::NotSquare(3)));

        plan.count = None;
        plan.addresses = vec!["a:1".into(), "b:1".into(), "c:1".into(), "d:1".into()];
        assert_eq!(plan.layout(12, 12).unwrap().unwrap().rows(), 2);

        plan.grid = Some((3, 1));
        assert!(matches!(
            plan.layout(12, 12),
            Err(LayoutError::CountMismatch { expected: 3, actual: 4, .. })
        ));
    }

    #[tokio::test]
    async fn test_single_and_sharded_agree() {
        let seed = Seed::Random {
            density: 0.3,
            seed: 99,
        };
        let mut single = Simulation::bootstrap(&ShardPlan::default(), &spec(12, 9, seed.clone()))
            .await
            .unwrap();
        let plan = ShardPlan {
            grid: Some((4, 3)),
            ..ShardPlan::default()
        };
        let mut sharded = Simulation::bootstrap(&plan, &spec(12, 9, seed)).await.unwrap();

        assert_eq!(single.step(7, || false).await.unwrap(), 7);
        assert_eq!(sharded.step(7, || false).await.unwrap(), 7);
        assert_eq!(
            single.snapshot().await.unwrap(),
            sharded.snapshot().await.unwrap()
        );
        sharded.close().await;
    }

    #[tokio::test]
    async fn test_invalid_layout_rejected_before_seeding() {
        let plan = ShardPlan {
            grid: Some((4, 4)),
            ..ShardPlan::default()
        };
        let err = Simulation::bootstrap(&plan, &spec(10, 10, Seed::Empty))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, SimulationError::Layout(_)));
        assert!(err.is_bad_request());
    }

    #[tokio::test]
    async fn test_oversized_board_is_bad_request() {
        let seed = Seed::Pattern {
            name: "glider".into(),
            row: usize::MAX,
            col: 0,
        };
        let err = Simulation::bootstrap(&ShardPlan::default(), &spec(1 << 20, 1 << 20, seed))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, SimulationError::Grid(GridError::TooLarge { .. })));
        assert!(err.is_bad_request());
    }

    #[tokio::test]
    async fn test_shard_lookup() {
        let single = Simulation::bootstrap(&ShardPlan::default(), &spec(6, 6, Seed::Empty))
            .await
            .unwrap();
        assert!(matches!(
            single.shard(ShardCoord::new(0, 0)).await,
            Err(SimulationError::NotSharded)
        ));

        let plan = ShardPlan {
            count: Some(4),
            ..ShardPlan::default()
        };
        let sharded = Simulation::bootstrap(&plan, &spec(6, 6, Seed::Empty)).await.unwrap();
        assert_eq!(sharded.shard(ShardCoord::new(1, 1)).await.unwrap().grid.width(), 3);
        assert!(matches!(
            sharded.shard(ShardCoord::new(2, 0)).await,
            Err(SimulationError::NoSuchShard { .. })
        ));
        sharded.close().await;
    }
}
