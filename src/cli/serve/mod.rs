//! Board server: the HTTP front end of a running simulation.
//!
//! Requests are handled on a small rayon pool and forwarded to the board
//! actor through a [`BoardHandle`]. Reads of the current board go straight
//! to the published snapshot.

mod lifecycle;
mod path;
mod response;
mod route;

use crate::{
    actor::{BoardHandle, BoardSnapshot, BoardSpec, ShardPlan, SimulationError},
    config::{LifeConfig, cfg},
    grid::{Encoding, encode, to_json},
    log,
};
use anyhow::{Context, Result};
use crossbeam::channel;
use route::{BoardQuery, Route};
use std::sync::Arc;
use tiny_http::{Request, Server};

/// Worker threads answering HTTP requests.
const REQUEST_THREADS: usize = 4;

const HELP: &str = "\
shardlife board server

  /board?width=W&height=H&density=D&seed=S   new random board (height defaults to width)
  /board?width=W&pattern=NAME&row=R&col=C     new board with a named pattern
  /step?n=N                                   advance N generations (default 1)
  /snapshot                                   current board without stepping
  /shard?row=R&col=C                          one shard's cells and generation
  /quit                                       stop the server

Boards are JSON arrays with one entry per row; add encoding=columns for
absolute live columns instead of gaps.
";

/// Run the board server until `/quit` or Ctrl+C.
pub fn serve() -> Result<()> {
    let config = cfg();
    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    lifecycle::register_server_for_shutdown(Arc::clone(&server), shutdown_tx);

    let (board, board_thread) = lifecycle::spawn_board(ShardPlan::from_config(&config), shutdown_rx);

    let bootstrapped = config
        .board_spec()
        .map_err(SimulationError::from)
        .and_then(|spec| board.bootstrap(spec));
    if let Err(e) = bootstrapped {
        crate::core::request_shutdown();
        lifecycle::wait_for_shutdown(board_thread);
        return Err(e).context("failed to bootstrap the board");
    }

    log!("serve"; "http://{}", addr);
    run_request_loop(&server, &board, &config)?;
    lifecycle::wait_for_shutdown(board_thread);
    Ok(())
}

fn run_request_loop(server: &Server, board: &BoardHandle, config: &Arc<LifeConfig>) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(REQUEST_THREADS)
        .build()
        .context("failed to create thread pool")?;

    for request in server.incoming_requests() {
        let board = board.clone();
        let config = Arc::clone(config);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &board, &config) {
                log!("serve"; "request error: {e}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(request: Request, board: &BoardHandle, config: &LifeConfig) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    let route = match Route::parse(request.url()) {
        Ok(route) => route,
        Err(message) => return response::respond_error(request, 400, &message),
    };
    crate::debug!("serve"; "{} {}", request.method(), request.url());

    match route {
        Route::Help => response::respond_text(request, HELP),
        Route::Board(query) => {
            let encoding = query.encoding;
            respond_board(request, board.bootstrap(spec_of(query)), encoding)
        }
        Route::Step { count, encoding } => respond_board(request, board.step(count), encoding),
        Route::Snapshot { encoding } => match board.latest() {
            Some(snapshot) => response::respond_json(request, to_json(&snapshot.grid, encoding)),
            None => response::respond_error(request, 503, "no board"),
        },
        Route::Shard { coord, encoding } => match board.shard(coord) {
            Ok(shard) => {
                let body = serde_json::json!({
                    "row": shard.coord.row,
                    "col": shard.coord.col,
                    "generation": shard.generation,
                    "width": shard.grid.width(),
                    "height": shard.grid.height(),
                    "cells": encode(&shard.grid, encoding),
                });
                response::respond_json(request, body.to_string())
            }
            Err(e) => respond_failure(request, &e),
        },
        Route::Quit => {
            response::respond_text(request, "bye\n")?;
            log!("serve"; "quit requested");
            crate::core::request_shutdown();
            Ok(())
        }
        Route::Static => match path::resolve_path(request.url(), &config.serve.static_dir) {
            Some(path) => response::respond_file(request, &path),
            None => response::respond_not_found(request),
        },
    }
}

fn spec_of(query: BoardQuery) -> BoardSpec {
    BoardSpec {
        width: query.width,
        height: query.height,
        seed: query.seed,
    }
}

fn respond_board(
    request: Request,
    result: Result<Arc<BoardSnapshot>, SimulationError>,
    encoding: Encoding,
) -> Result<()> {
    match result {
        Ok(snapshot) => response::respond_json(request, to_json(&snapshot.grid, encoding)),
        Err(e) => respond_failure(request, &e),
    }
}

/// 400 for requests that can never succeed, 500 for simulation failures.
fn respond_failure(request: Request, error: &SimulationError) -> Result<()> {
    let status = if error.is_bad_request() { 400 } else { 500 };
    if status == 500 {
        log!("error"; "{}", error);
    }
    response::respond_error(request, status, &error.to_string())
}
