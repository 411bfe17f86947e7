//! `shardlife shard`: one remote shard worker.

use anyhow::{Context, Result};

use crate::{log, transport::ShardServer};

pub fn shard(listen: &str) -> Result<()> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    rt.block_on(async {
        let server = ShardServer::bind(listen)
            .await
            .with_context(|| format!("failed to listen on {listen}"))?;
        log!("shard"; "listening on {}", server.local_addr()?);
        server.run(crate::core::is_shutdown).await?;
        log!("shard"; "stopped");
        Ok::<_, anyhow::Error>(())
    })
}
