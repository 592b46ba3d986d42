// zwlock-api: Async Rust client for the Z-Way gateway HTTP API

pub mod client;
pub mod error;
pub mod invocation;
pub mod models;
pub mod session;
pub mod token_store;
pub mod transport;

pub use client::{ApiBase, GatewayClient, normalize_base_url};
pub use error::Error;
pub use invocation::{Invocation, Method as InvocationMethod, command_class};
pub use models::{ApiValue, CommandClass, Device, DeviceSnapshot, Instance};
pub use session::{Credentials, SESSION_COOKIE, SessionManager};
pub use token_store::{TOKEN_FILE_NAME, TokenStore};
pub use transport::{TlsMode, TransportConfig};
