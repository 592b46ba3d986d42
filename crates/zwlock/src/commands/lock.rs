//! `zwlock lock`, `zwlock unlock`, `zwlock beeper`.

use std::sync::Arc;

use zwlock_core::{Command, LockState, NodeId, Platform};

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::host::EphemeralHost;
use crate::output;

pub async fn set_lock(
    node_id: NodeId,
    secure: bool,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let target = if secure {
        LockState::Secured
    } else {
        LockState::Unsecured
    };
    run_command(Command::SetLockTarget { node_id, target }, global).await?;

    let verb = if secure { "Locking" } else { "Unlocking" };
    output::print_output(&format!("{verb} node {node_id}"), global.quiet);
    Ok(())
}

pub async fn set_beeper(
    node_id: NodeId,
    enabled: bool,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    run_command(Command::SetAudioFeedback { node_id, enabled }, global).await?;

    let state = if enabled { "on" } else { "off" };
    output::print_output(&format!("Beeper {state} for node {node_id}"), global.quiet);
    Ok(())
}

async fn run_command(command: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let platform_config = config::platform_config(global)?;
    Platform::oneshot(platform_config, Arc::new(EphemeralHost), |platform| async move {
        platform.execute(command).await
    })
    .await?;
    Ok(())
}
