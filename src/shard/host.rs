//! Request dispatch for a single shard slot.
//!
//! Both the in-process shard actor and the TCP shard server hold a
//! `ShardHost` and feed it requests one at a time.

use super::{ShardError, ShardWorker};
use crate::transport::{ShardRequest, ShardResponse};

/// A shard slot that is empty until provisioned.
#[derive(Debug, Default)]
pub struct ShardHost {
    worker: Option<ShardWorker>,
}

impl ShardHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_provisioned(&self) -> bool {
        self.worker.is_some()
    }

    pub fn handle(&mut self, request: ShardRequest) -> ShardResponse {
        match request {
            ShardRequest::Provision { coord, grid } => {
                crate::debug!("shard"; "{} provisioned {}x{}", coord, grid.width(), grid.height());
                self.worker = Some(ShardWorker::new(coord, grid));
                ShardResponse::Provisioned
            }
            ShardRequest::Step {
                generation,
                borders,
            } => match self.worker_mut() {
                Ok(worker) => match worker.compute_step(generation, borders) {
                    Ok(outcome) => ShardResponse::Stepped(outcome),
                    Err(e) => ShardResponse::Failed(e),
                },
                Err(e) => ShardResponse::Failed(e),
            },
            ShardRequest::Rollback { generation } => match self.worker_mut() {
                Ok(worker) => match worker.rollback(generation) {
                    Ok(()) => ShardResponse::RolledBack,
                    Err(e) => ShardResponse::Failed(e),
                },
                Err(e) => ShardResponse::Failed(e),
            },
            ShardRequest::Snapshot => match &self.worker {
                Some(worker) => ShardResponse::Snapshot(worker.snapshot()),
                None => ShardResponse::Failed(ShardError::NotProvisioned),
            },
            ShardRequest::Release => {
                self.worker = None;
                ShardResponse::Released
            }
        }
    }

    fn worker_mut(&mut self) -> Result<&mut ShardWorker, ShardError> {
        self.worker.as_mut().ok_or(ShardError::NotProvisioned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use crate::shard::{BorderSet, ShardCoord};

    #[test]
    fn test_requests_before_provision_fail() {
        let mut host = ShardHost::new();
        let response = host.handle(ShardRequest::Step {
            generation: 0,
            borders: BorderSet::dead(3, 3),
        });
        assert_eq!(response, ShardResponse::Failed(ShardError::NotProvisioned));
        assert_eq!(
            host.handle(ShardRequest::Snapshot),
            ShardResponse::Failed(ShardError::NotProvisioned)
        );
    }

    #[test]
    fn test_provision_step_release() {
        let mut host = ShardHost::new();
        let coord = ShardCoord::new(1, 2);
        let grid = Grid::new(4, 3).unwrap();

        assert_eq!(
            host.handle(ShardRequest::Provision { coord, grid }),
            ShardResponse::Provisioned
        );

        let response = host.handle(ShardRequest::Step {
            generation: 0,
            borders: BorderSet::dead(4, 3),
        });
        assert!(matches!(response, ShardResponse::Stepped(ref o) if o.generation == 1));

        match host.handle(ShardRequest::Snapshot) {
            ShardResponse::Snapshot(snapshot) => {
                assert_eq!(snapshot.coord, coord);
                assert_eq!(snapshot.generation, 1);
            }
            other => panic!("unexpected response: {other:?}"),
        }

        assert_eq!(host.handle(ShardRequest::Release), ShardResponse::Released);
        assert!(!host.is_provisioned());
    }
}
