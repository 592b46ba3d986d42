//! Command handlers.

pub mod accessories;
pub mod config_cmd;
pub mod devices;
pub mod lock;
pub mod run;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Route a command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Config(args) => config_cmd::handle(&args, global),
        Command::Accessories => accessories::handle(global),
        Command::Run => run::handle(global).await,
        Command::Devices => devices::handle(global).await,
        Command::Lock(args) => lock::set_lock(args.node, true, global).await,
        Command::Unlock(args) => lock::set_lock(args.node, false, global).await,
        Command::Beeper(args) => lock::set_beeper(args.node, args.state.enabled(), global).await,
        Command::Completions(_) => Ok(()),
    }
}
