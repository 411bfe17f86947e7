//! Server lifecycle management.

use crate::{
    actor::{BoardActor, BoardHandle, ShardPlan, board_channel},
    core::register_server,
    log,
};
use anyhow::Result;
use crossbeam::channel::{Receiver, Sender};
use std::{
    net::SocketAddr,
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};
use tiny_http::Server;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Bind to the specified interface and port, with automatic port retry.
pub fn bind_with_retry(
    interface: std::net::IpAddr,
    base_port: u16,
) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;
    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }
    Err(anyhow::anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

/// Register server for graceful shutdown.
///
/// When Ctrl+C is pressed or `/quit` is requested, the server is unblocked
/// and the board thread is notified.
pub fn register_server_for_shutdown(server: Arc<Server>, shutdown_tx: Sender<()>) {
    register_server(server, shutdown_tx);
}

/// Spawn the board actor on its own runtime thread.
pub fn spawn_board(plan: ShardPlan, shutdown_rx: Receiver<()>) -> (BoardHandle, JoinHandle<()>) {
    let (actor, handle) = board_channel(plan);
    let stopper = handle.clone();
    let thread = thread::spawn(move || run_board(actor, stopper, shutdown_rx));
    (handle, thread)
}

fn run_board(actor: BoardActor, handle: BoardHandle, shutdown_rx: Receiver<()>) {
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log!("error"; "failed to create tokio runtime: {}", e);
            return;
        }
    };

    let task = rt.spawn(actor.run());

    // A dropped sender also ends the wait
    let _ = shutdown_rx.recv();
    handle.shutdown();

    if let Err(e) = rt.block_on(task) {
        log!("board"; "actor failed: {}", e);
    }
}

/// Wait for the board thread to release its shards (max 2 seconds).
pub fn wait_for_shutdown(handle: JoinHandle<()>) {
    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(Duration::from_millis(50));
    }
    log!("board"; "shards did not stop in time");
}
