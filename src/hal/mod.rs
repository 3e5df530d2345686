//! Hardware Abstraction Layer for OpenAWG.
//!
//! Thin wrappers around ESP-IDF peripherals implementing the transport
//! traits. Interpreter logic stays in core modules, HAL is just I/O.

pub mod device;
pub mod uart;

pub use device::{timestamp_us, EfuseMac};
pub use uart::{init_log_uart, init_scpi_uart, LogUart, UartConfig, UartRx, UartTx};
