//! Shard worker: one partition of the board and its border buffers.

use serde::{Deserialize, Serialize};

use super::{BorderSet, ShardCoord, ShardError};
use crate::grid::{Bordered, Grid};

/// Result of one applied step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Generation the shard is at after the step.
    pub generation: u64,
    /// New edge rows, columns and corners for the neighbors.
    pub outbound: BorderSet,
}

/// End-of-round view of a shard for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardSnapshot {
    pub coord: ShardCoord,
    pub generation: u64,
    pub grid: Grid,
}

/// State kept from the last step so it can be replayed or undone.
#[derive(Debug, Clone)]
struct AppliedStep {
    prior: Grid,
    prior_borders: BorderSet,
    outcome: StepOutcome,
}

/// Owns one shard's grid exclusively. No state is shared with other shards.
#[derive(Debug)]
pub struct ShardWorker {
    coord: ShardCoord,
    grid: Grid,
    generation: u64,
    /// Borders folded into the most recent step (dead before the first).
    borders: BorderSet,
    last: Option<AppliedStep>,
}

impl ShardWorker {
    pub fn new(coord: ShardCoord, grid: Grid) -> Self {
        let borders = BorderSet::dead(grid.width(), grid.height());
        Self {
            coord,
            grid,
            generation: 0,
            borders,
            last: None,
        }
    }

    pub const fn coord(&self) -> ShardCoord {
        self.coord
    }

    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    pub const fn borders(&self) -> &BorderSet {
        &self.borders
    }

    /// Advance from `generation` to `generation + 1` using `inbound`.
    ///
    /// A repeated request for the step that was just applied returns the
    /// cached outcome instead of stepping twice, so a coordinator may retry
    /// after a lost reply. The grid is untouched on error.
    pub fn compute_step(
        &mut self,
        generation: u64,
        inbound: BorderSet,
    ) -> Result<StepOutcome, ShardError> {
        inbound.validate(self.grid.width(), self.grid.height())?;

        if let Some(last) = &self.last
            && self.generation.checked_sub(1) == Some(generation)
        {
            return Ok(last.outcome.clone());
        }
        if generation != self.generation {
            return Err(ShardError::GenerationMismatch {
                expected: generation,
                actual: self.generation,
            });
        }

        let next = self.grid.step(&Bordered(&inbound));
        let outcome = StepOutcome {
            generation: generation + 1,
            outbound: BorderSet::edges_of(&next),
        };

        let prior = std::mem::replace(&mut self.grid, next);
        let prior_borders = std::mem::replace(&mut self.borders, inbound);
        self.generation += 1;
        self.last = Some(AppliedStep {
            prior,
            prior_borders,
            outcome: outcome.clone(),
        });

        Ok(outcome)
    }

    /// Return to `generation` if the last step moved past it.
    ///
    /// Only the most recent step can be undone; rolling back to the current
    /// generation is a no-op.
    pub fn rollback(&mut self, generation: u64) -> Result<(), ShardError> {
        if generation == self.generation {
            return Ok(());
        }
        match self.last.take() {
            Some(last) if self.generation.checked_sub(1) == Some(generation) => {
                self.grid = last.prior;
                self.borders = last.prior_borders;
                self.generation = generation;
                Ok(())
            }
            last => {
                self.last = last;
                Err(ShardError::GenerationMismatch {
                    expected: generation,
                    actual: self.generation,
                })
            }
        }
    }

    /// Current outbound borders (the shard's own edges).
    pub fn outbound(&self) -> BorderSet {
        BorderSet::edges_of(&self.grid)
    }

    pub fn snapshot(&self) -> ShardSnapshot {
        ShardSnapshot {
            coord: self.coord,
            generation: self.generation,
            grid: self.grid.clone(),
        }
    }
}
