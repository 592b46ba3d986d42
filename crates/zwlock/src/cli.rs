//! Clap derive structures for the `zwlock` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// zwlock -- bridge Allegion Z-Wave locks on a Z-Way gateway to an accessory host
#[derive(Debug, Parser)]
#[command(
    name = "zwlock",
    version,
    about = "Bridge Allegion Z-Wave locks on a Z-Way gateway",
    long_about = "Discovers Allegion Secure Keypad locks on a Z-Way gateway, keeps their\n\
        lock state, battery level and beeper setting fresh, and exposes them\n\
        as smart-home lock accessories.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config dir)
    #[arg(long, env = "ZWLOCK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Gateway URL (overrides config)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Directory for the session token and accessory records (overrides config)
    #[arg(long, global = true)]
    pub storage_dir: Option<PathBuf>,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "ZWLOCK_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one node id per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the bridge until interrupted
    Run,

    /// List gateway devices and which ones are tracked as locks
    #[command(alias = "dev")]
    Devices,

    /// Bolt a lock
    Lock(NodeArgs),

    /// Retract a lock's bolt
    Unlock(NodeArgs),

    /// Turn a lock's keypad beeper on or off
    Beeper(BeeperArgs),

    /// List persisted accessory records
    #[command(alias = "acc")]
    Accessories,

    /// Inspect configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct NodeArgs {
    /// Z-Wave node id of the lock
    pub node: u32,
}

#[derive(Debug, Args)]
pub struct BeeperArgs {
    /// Z-Wave node id of the lock
    pub node: u32,

    /// Desired beeper state
    pub state: Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn enabled(self) -> bool {
        matches!(self, Self::On)
    }
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Print the effective configuration (password masked)
    Show,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
