//! UART transports.
//!
//! ```text
//! UART2 GPIO18 (RX) ◀────── host TX     SCPI commands
//! UART2 GPIO17 (TX) ──────▶ host RX     SCPI responses
//! UART1 GPIO6  (TX) ──────▶ USB-UART    log output
//! ```
//!
//! **WARNING**: GPIO6 conflicts with Octal PSRAM. Only use on Quad flash boards!
//!
//! The SCPI receive side is polled: the IDF UART driver already buffers
//! bytes from its own ISR, so the RX task drains that buffer with
//! non-blocking reads every tick. Arming the port only flushes bytes that
//! arrived before ingestion started.

use core::fmt;

use esp_idf_svc::hal::delay::{BLOCK, NON_BLOCK};
use esp_idf_svc::hal::gpio::{self, AnyIOPin};
use esp_idf_svc::hal::peripheral::Peripheral;
use esp_idf_svc::hal::uart::{self, UartDriver, UartRxDriver, UartTxDriver};
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::sys::EspError;

use super::device::timestamp_us;
use crate::log_globals::RX_LOG_STREAM;
use crate::rt_warn;
use crate::transport::{SerialRx, SerialTx};

/// UART line settings.
pub struct UartConfig {
    pub baud_rate: u32,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self { baud_rate: 115200 }
    }
}

/// Receive half of the SCPI port.
pub struct UartRx<'d> {
    driver: UartRxDriver<'d>,
}

impl SerialRx for UartRx<'_> {
    fn read_byte(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        match self.driver.read(&mut byte, NON_BLOCK) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }

    fn enable_rx_interrupt(&mut self) {
        // Stale bytes would prefix the first command
        if let Err(e) = self.driver.clear_rx() {
            rt_warn!(RX_LOG_STREAM, timestamp_us(), "UART RX flush failed: {:?}", e);
        }
    }
}

/// Transmit half of the SCPI port.
pub struct UartTx<'d> {
    driver: UartTxDriver<'d>,
}

impl SerialTx for UartTx<'_> {
    type Error = EspError;

    fn write_byte(&mut self, byte: u8) -> Result<(), EspError> {
        self.write_all(&[byte])
    }

    fn write_all(&mut self, mut bytes: &[u8]) -> Result<(), EspError> {
        while !bytes.is_empty() {
            let n = self.driver.write(bytes)?;
            bytes = &bytes[n..];
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), EspError> {
        self.driver.wait_done(BLOCK)
    }
}

/// Bring up the SCPI port and split it into its two halves.
pub fn init_scpi_uart<'d>(
    uart: impl Peripheral<P = uart::UART2> + 'd,
    tx_pin: impl Peripheral<P = impl gpio::OutputPin> + 'd,
    rx_pin: impl Peripheral<P = impl gpio::InputPin> + 'd,
    config: &UartConfig,
) -> Result<(UartRx<'d>, UartTx<'d>), EspError> {
    let uart_config = uart::config::Config::default().baudrate(Hertz(config.baud_rate));
    let driver = UartDriver::new(
        uart,
        tx_pin,
        rx_pin,
        Option::<AnyIOPin>::None, // CTS
        Option::<AnyIOPin>::None, // RTS
        &uart_config,
    )?;
    let (tx, rx) = driver.into_split();
    Ok((UartRx { driver: rx }, UartTx { driver: tx }))
}

/// TX-only log port.
pub struct LogUart<'d> {
    driver: UartTxDriver<'d>,
}

impl fmt::Write for LogUart<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut bytes = s.as_bytes();
        while !bytes.is_empty() {
            let n = self.driver.write(bytes).map_err(|_| fmt::Error)?;
            bytes = &bytes[n..];
        }
        Ok(())
    }
}

/// Initialize UART1 TX-only for log output.
pub fn init_log_uart<'d>(
    uart: impl Peripheral<P = uart::UART1> + 'd,
    tx_pin: impl Peripheral<P = impl gpio::OutputPin> + 'd,
    config: &UartConfig,
) -> Result<LogUart<'d>, EspError> {
    let uart_config = uart::config::Config::default().baudrate(Hertz(config.baud_rate));
    let driver = UartTxDriver::new(
        uart,
        tx_pin,
        Option::<AnyIOPin>::None, // CTS
        Option::<AnyIOPin>::None, // RTS
        &uart_config,
    )?;
    Ok(LogUart { driver })
}
