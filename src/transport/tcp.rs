//! TCP transport: shards in other processes, newline-delimited JSON.
//!
//! Each request is one JSON line, answered by one JSON line. A connection is
//! opened lazily per shard and dropped on any error, so the next attempt
//! reconnects. The shard server keeps its state across connections, which is
//! what lets a coordinator retry a step whose reply was lost.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use rustc_hash::FxHashMap;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};

use super::{ShardRequest, ShardResponse, ShardTransport, TransportError};
use crate::shard::{LayoutError, ShardCoord, ShardError, ShardHost, ShardLayout};

/// How often the accept loop checks the stop flag.
const STOP_POLL: Duration = Duration::from_millis(100);

struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

struct Endpoint {
    addr: String,
    conn: tokio::sync::Mutex<Option<Connection>>,
}

pub struct TcpTransport {
    endpoints: FxHashMap<ShardCoord, Endpoint>,
    timeout: Duration,
}

impl TcpTransport {
    /// Assign `addresses` to the shards of `layout` in row-major order.
    pub fn new(
        layout: &ShardLayout,
        addresses: &[String],
        timeout: Duration,
    ) -> Result<Self, LayoutError> {
        layout.expect_count(addresses.len())?;
        let endpoints = layout
            .coords()
            .zip(addresses)
            .map(|(coord, addr)| {
                let endpoint = Endpoint {
                    addr: addr.clone(),
                    conn: tokio::sync::Mutex::new(None),
                };
                (coord, endpoint)
            })
            .collect();
        Ok(Self { endpoints, timeout })
    }
}

impl ShardTransport for TcpTransport {
    async fn request(
        &self,
        coord: ShardCoord,
        request: ShardRequest,
    ) -> Result<ShardResponse, TransportError> {
        let endpoint = self
            .endpoints
            .get(&coord)
            .ok_or(TransportError::UnknownShard(coord))?;

        let mut slot = endpoint.conn.lock().await;
        let exchange = exchange(coord, &endpoint.addr, &mut slot, &request);
        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => {
                *slot = None;
                Err(e)
            }
            Err(_) => {
                *slot = None;
                Err(TransportError::Timeout(coord, self.timeout))
            }
        }
    }

    async fn close(&self) {
        for (coord, endpoint) in &self.endpoints {
            let mut slot = endpoint.conn.lock().await;
            if let Some(conn) = slot.as_mut() {
                let _ = conn.writer.shutdown().await;
            }
            *slot = None;
            crate::debug!("shard"; "{} disconnected from {}", coord, endpoint.addr);
        }
    }
}

async fn exchange(
    coord: ShardCoord,
    addr: &str,
    slot: &mut Option<Connection>,
    request: &ShardRequest,
) -> Result<ShardResponse, TransportError> {
    let unreachable = |e: io::Error| TransportError::Unreachable {
        coord,
        reason: format!("{addr}: {e}"),
    };

    if slot.is_none() {
        let stream = TcpStream::connect(addr).await.map_err(unreachable)?;
        let _ = stream.set_nodelay(true);
        let (reader, writer) = stream.into_split();
        *slot = Some(Connection {
            reader: BufReader::new(reader),
            writer,
        });
    }
    let Some(conn) = slot.as_mut() else {
        return Err(TransportError::Closed(coord));
    };

    let mut line = serde_json::to_string(request).map_err(|e| TransportError::Protocol {
        coord,
        reason: e.to_string(),
    })?;
    line.push('\n');
    conn.writer
        .write_all(line.as_bytes())
        .await
        .map_err(unreachable)?;

    let mut reply = String::new();
    let read = conn.reader.read_line(&mut reply).await.map_err(unreachable)?;
    if read == 0 {
        return Err(unreachable(io::ErrorKind::UnexpectedEof.into()));
    }
    serde_json::from_str(&reply).map_err(|e| TransportError::Protocol {
        coord,
        reason: e.to_string(),
    })
}

/// Serves one shard slot over TCP.
///
/// All connections share the same [`ShardHost`], so a coordinator that
/// reconnects finds the shard where it left it.
pub struct ShardServer {
    listener: TcpListener,
    host: Arc<parking_lot::Mutex<ShardHost>>,
}

impl ShardServer {
    pub async fn bind(addr: &str) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            host: Arc::new(parking_lot::Mutex::new(ShardHost::new())),
        })
    }

    pub fn local_addr(&self) -> io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until `should_stop` returns true.
    pub async fn run(self, should_stop: impl Fn() -> bool) -> io::Result<()> {
        loop {
            if should_stop() {
                crate::debug!("shard"; "stop requested");
                return Ok(());
            }
            let accepted = tokio::time::timeout(STOP_POLL, self.listener.accept()).await;
            let (stream, peer) = match accepted {
                Err(_) => continue,
                Ok(Ok(accepted)) => accepted,
                Ok(Err(e)) => {
                    crate::log!("shard"; "accept failed: {}", e);
                    continue;
                }
            };
            crate::debug!("shard"; "connection from {}", peer);

            let host = Arc::clone(&self.host);
            tokio::spawn(async move {
                if let Err(e) = serve_connection(stream, host).await {
                    crate::debug!("shard"; "connection from {} closed: {}", peer, e);
                }
            });
        }
    }
}

async fn serve_connection(
    stream: TcpStream,
    host: Arc<parking_lot::Mutex<ShardHost>>,
) -> io::Result<()> {
    let _ = stream.set_nodelay(true);
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = answer(&host, &line);

        let mut reply = serde_json::to_string(&response)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        reply.push('\n');
        writer.write_all(reply.as_bytes()).await?;
    }
    Ok(())
}

/// Answer one request line. Lines that do not decode to a valid request
/// never reach the host.
fn answer(host: &parking_lot::Mutex<ShardHost>, line: &str) -> ShardResponse {
    match serde_json::from_str::<ShardRequest>(line) {
        Ok(request) => host.lock().handle(request),
        Err(e) => {
            crate::debug!("shard"; "rejected request: {}", e);
            ShardResponse::Failed(ShardError::MalformedRequest(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use crate::shard::BorderSet;
    use std::sync::atomic::{AtomicBool, Ordering};

    async fn spawn_server(stop: Arc<AtomicBool>) -> String {
        let server = ShardServer::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr().unwrap().to_string();
        tokio::spawn(server.run(move || stop.load(Ordering::Relaxed)));
        addr
    }

    #[tokio::test]
    async fn test_step_over_tcp() {
        let stop = Arc::new(AtomicBool::new(false));
        let addr = spawn_server(Arc::clone(&stop)).await;
        let layout = ShardLayout::new(3, 3, 1, 1).unwrap();
        let transport = TcpTransport::new(&layout, &[addr], Duration::from_secs(5)).unwrap();
        let coord = ShardCoord::new(0, 0);

        let blinker = Grid::with_live_cells(3, 3, [(1, 0), (1, 1), (1, 2)]).unwrap();
        transport.provision(coord, blinker).await.unwrap();
        let outcome = transport.step(coord, 0, BorderSet::dead(3, 3)).await.unwrap();
        assert_eq!(outcome.generation, 1);
        assert_eq!(outcome.outbound.north, vec![false, true, false]);

        transport.release(coord).await.unwrap();
        transport.close().await;
        stop.store(true, Ordering::Relaxed);
    }

    #[tokio::test]
    async fn test_state_survives_reconnect() {
        let stop = Arc::new(AtomicBool::new(false));
        let addr = spawn_server(Arc::clone(&stop)).await;
        let layout = ShardLayout::new(3, 3, 1, 1).unwrap();
        let coord = ShardCoord::new(0, 0);

        let first = TcpTransport::new(&layout, &[addr.clone()], Duration::from_secs(5)).unwrap();
        first.provision(coord, Grid::new(3, 3).unwrap()).await.unwrap();
        first.step(coord, 0, BorderSet::dead(3, 3)).await.unwrap();
        first.close().await;

        let second = TcpTransport::new(&layout, &[addr], Duration::from_secs(5)).unwrap();
        assert_eq!(second.snapshot(coord).await.unwrap().generation, 1);
        second.close().await;
        stop.store(true, Ordering::Relaxed);
    }

    #[tokio::test]
    async fn test_unreachable_shard_is_retryable() {
        // Bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let layout = ShardLayout::new(3, 3, 1, 1).unwrap();
        let transport = TcpTransport::new(&layout, &[addr], Duration::from_secs(5)).unwrap();
        let err = transport.snapshot(ShardCoord::new(0, 0)).await.unwrap_err();
        assert!(err.is_retryable(), "{err}");
    }

    #[test]
    fn test_malformed_provision_is_rejected() {
        let host = parking_lot::Mutex::new(ShardHost::new());

        let short = r#"{"op":"provision","coord":{"row":0,"col":0},"grid":{"width":3,"height":3,"cells":[]}}"#;
        assert!(matches!(
            answer(&host, short),
            ShardResponse::Failed(ShardError::MalformedRequest(_))
        ));
        let empty = r#"{"op":"provision","coord":{"row":0,"col":0},"grid":{"width":0,"height":0,"cells":[]}}"#;
        assert!(matches!(
            answer(&host, empty),
            ShardResponse::Failed(ShardError::MalformedRequest(_))
        ));
        assert!(matches!(
            answer(&host, "not json"),
            ShardResponse::Failed(ShardError::MalformedRequest(_))
        ));

        let step = serde_json::to_string(&ShardRequest::Step {
            generation: 0,
            borders: BorderSet::dead(3, 3),
        })
        .unwrap();
        assert_eq!(
            answer(&host, &step),
            ShardResponse::Failed(ShardError::NotProvisioned)
        );
    }

    #[test]
    fn test_far_generation_step_is_rejected() {
        let host = parking_lot::Mutex::new(ShardHost::new());
        let provision = serde_json::to_string(&ShardRequest::Provision {
            coord: ShardCoord::new(0, 0),
            grid: Grid::new(3, 3).unwrap(),
        })
        .unwrap();
        assert_eq!(answer(&host, &provision), ShardResponse::Provisioned);

        let step = serde_json::to_string(&ShardRequest::Step {
            generation: u64::MAX,
            borders: BorderSet::dead(3, 3),
        })
        .unwrap();
        assert!(matches!(
            answer(&host, &step),
            ShardResponse::Failed(ShardError::GenerationMismatch { .. })
        ));
    }

    #[test]
    fn test_address_count_must_match_layout() {
        let layout = ShardLayout::new(6, 6, 2, 2).unwrap();
        let addresses = vec!["127.0.0.1:1".to_string(); 3];
        assert!(matches!(
            TcpTransport::new(&layout, &addresses, Duration::from_secs(1)),
            Err(LayoutError::CountMismatch { expected: 4, actual: 3, .. })
        ));
    }
}
