//! Engine between `zwlock-api` and an accessory host.
//!
//! - **[`Platform`]**: lifecycle facade. [`launch()`](Platform::launch)
//!   discovers locks, reconciles accessories, publishes values once, then
//!   spawns the poll task and the command processor.
//!   [`Platform::oneshot()`](Platform::oneshot) skips polling for single
//!   CLI invocations.
//!
//! - **Discovery** ([`discovery`]): picks supported locks out of a gateway
//!   snapshot and resolves their command-class instances.
//!
//! - **Reconciliation** ([`reconcile`]): order-preserving diff between known
//!   accessories and discovered locks.
//!
//! - **Staleness** ([`poll`]): tolerance checks, startup anti-flood, and
//!   pending-query de-duplication.
//!
//! - **[`AccessoryHost`]**: the seam to whatever persists and surfaces
//!   accessories.

pub mod command;
pub mod config;
pub mod discovery;
pub mod error;
pub mod host;
pub mod mapping;
pub mod model;
pub mod platform;
pub mod poll;
pub mod reconcile;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::Command;
pub use config::{PlatformConfig, Tolerances};
pub use error::CoreError;
pub use host::AccessoryHost;
pub use platform::Platform;
pub use reconcile::Delta;

pub use model::{
    AccessoryRecord, Characteristic, CharacteristicValue, ChargingState, ConfigurationFlags,
    ConfigurationOption, InstanceIndices, LockState, NodeId, TrackedLock,
};
