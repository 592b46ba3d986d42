//! `zwlock run`: the long-running bridge.

use std::sync::Arc;

use tracing::info;
use zwlock_core::Platform;

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::host::FileAccessoryHost;

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let platform_config = config::platform_config(global)?;
    let host = Arc::new(FileAccessoryHost::open(&platform_config.storage_dir)?);
    let platform = Platform::new(platform_config, host.clone())?;

    for record in host.records() {
        platform.restore_accessory(record).await;
    }
    platform.launch().await?;

    tokio::signal::ctrl_c().await?;
    info!("interrupted, shutting down");
    platform.shutdown().await;
    host.flush().await
}
