//! Process-wide shutdown state.
//!
//! `SHUTDOWN` is raised by Ctrl+C or `/quit` and polled by the long-running
//! loops: the HTTP request loop, the board actor between rounds, `run`
//! between generations and the shard server's accept loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tiny_http::Server;

/// Shutdown has been requested (Ctrl+C or `/quit`)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Shutdown signal sender for the board actor thread
static SHUTDOWN_TX: OnceLock<crossbeam::channel::Sender<()>> = OnceLock::new();

/// Exit code for a second Ctrl+C (128 + SIGINT)
const FORCED_EXIT: i32 = 130;

/// Setup the global Ctrl+C handler. Call once at program start
///
/// The first Ctrl+C requests a graceful shutdown. A second one exits
/// immediately, for when a shard request is stuck waiting on its timeout.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        if raise(&SHUTDOWN) {
            std::process::exit(FORCED_EXIT);
        }
        crate::log!("shutdown"; "stopping, press Ctrl+C again to force");
        notify();
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Request a graceful shutdown from inside the process.
pub fn request_shutdown() {
    if !raise(&SHUTDOWN) {
        notify();
    }
}

/// Register the HTTP server for graceful shutdown
///
/// Call this after binding the server, before entering the request loop
pub fn register_server(server: Arc<Server>, shutdown_tx: crossbeam::channel::Sender<()>) {
    let _ = SERVER.set(server);
    let _ = SHUTDOWN_TX.set(shutdown_tx);
}

/// Check if shutdown has been requested
///
/// Relaxed ordering: a loop may run one more iteration before it notices.
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

/// Set `flag`, returning whether it was already set.
fn raise(flag: &AtomicBool) -> bool {
    flag.swap(true, Ordering::SeqCst)
}

/// Wake the board actor thread and unblock the HTTP server, if registered.
fn notify() {
    if let Some(tx) = SHUTDOWN_TX.get() {
        let _ = tx.send(());
    }
    if let Some(server) = SERVER.get() {
        server.unblock();
    }
}
