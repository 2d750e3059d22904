/*!
 * Tether - self-healing TCP client connections
 *
 * Keeps one logical connection to a remote host alive:
 * - Tries each resolved address in turn, then backs off with jitter
 * - Withholds repetitive failure messages after repeated short sessions
 * - Drives the sans-IO state machine from a tokio event loop
 *
 * The state machine itself lives in `tether-core-reconnect`; this crate adds
 * configuration, logging setup and the socket driver.
 */

pub mod config;
pub mod driver;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{LogLevel, TetherConfig};
pub use driver::{Driver, LineLogger, TcpConnector, TcpTransport, TetheredConnection};
pub use error::{Result, TetherError};
pub use tether_core_reconnect::{ConnectionState, ReconnectConfig};
