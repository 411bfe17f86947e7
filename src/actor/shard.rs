//! Shard Actor - one in-process shard
//!
//! Owns a [`ShardHost`] and answers requests strictly in arrival order, so a
//! shard never sees two steps at once.

use tokio::sync::mpsc;

use super::messages::ShardMsg;
use crate::shard::{ShardCoord, ShardHost};

pub struct ShardActor {
    coord: ShardCoord,
    rx: mpsc::Receiver<ShardMsg>,
    host: ShardHost,
}

impl ShardActor {
    pub fn new(coord: ShardCoord, rx: mpsc::Receiver<ShardMsg>) -> Self {
        Self {
            coord,
            rx,
            host: ShardHost::new(),
        }
    }

    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                ShardMsg::Request { request, reply } => {
                    let response = self.host.handle(request);
                    // Caller may have timed out and dropped the receiver
                    let _ = reply.send(response);
                }
                ShardMsg::Shutdown => break,
            }
        }
        crate::debug!("shard"; "{} stopped", self.coord);
    }
}
