//! SCPI command interpreter.
//!
//! Pattern matching, parameter parsing, the error queue, IEEE 488.2 status
//! registers and the dispatcher that ties them together.

pub mod commands;
pub mod error;
pub mod error_queue;
pub mod identity;
pub mod params;
pub mod pattern;
pub mod response;
pub mod server;
pub mod status;

pub use commands::{Builtin, CommandTable, CustomHandler, Handler, BUILTIN_COMMANDS, SCPI_VERSION};
pub use error::{PatternError, ScpiError, TableError};
pub use error_queue::{ErrorQueue, PushOutcome};
pub use identity::Identity;
pub use params::{parse_line, Params};
pub use pattern::{Header, Match, Pattern};
pub use response::{Response, ResponseOverflow, ResponseWriter};
pub use server::{Context, DispatchState, Instrument, Outcome, Server};
pub use status::{StatusGroup, StatusRegisters};
