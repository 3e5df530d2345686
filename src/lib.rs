//! # OpenAWG SCPI
//!
//! SCPI-99 / IEEE 488.2 command front end for the OpenAWG generator.
//!
//! ## Architecture
//!
//! Two execution contexts share exactly two objects:
//! - RX context: [`ingest::Ingest`] frames bytes into lines and pushes them
//!   to the [`ingest::CommandQueue`]
//! - Worker context: [`scpi::Server`] pops lines, matches and runs them, and
//!   writes responses
//! - The queue and the [`ingest::OverrunState`] are the only shared state,
//!   both lock-free
//!
//! Logging goes through per-context [`logging::LogStream`] rings and never
//! blocks the RX path.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod ingest;
pub mod log_drain;
pub mod log_globals;
pub mod logging;
pub mod scpi;
pub mod transport;

#[cfg(target_os = "espidf")]
pub mod hal;

pub use config::{SaturationPolicy, ServerConfig};
pub use ingest::{CommandQueue, Ingest, Line, LineFramer, OverrunState};
pub use log_globals::{DISPATCH_LOG_STREAM, RX_LOG_STREAM};
pub use scpi::{CommandTable, Identity, Instrument, ScpiError, Server, TableError};
pub use transport::{DeviceId, SerialRx, SerialTx};
