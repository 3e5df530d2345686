//! OpenAWG - Main entry point
//!
//! Wires the SCPI front end to a serial port:
//! 1. RX task: frame incoming bytes into `COMMAND_QUEUE`
//! 2. Server task: match, execute, respond
//! 3. Main task: drain log streams to the log port
//!
//! On the board the SCPI port is UART2 and logs go to UART1. On a host build
//! stdin/stdout carry SCPI and logs go to stderr.

use openawg_scpi::{CommandQueue, OverrunState, TableError};

/// Framer → server hand-off. Shared by exactly one producer and one consumer.
static COMMAND_QUEUE: CommandQueue = CommandQueue::new();

/// Overrun events waiting to be reported as -363.
static OVERRUN: OverrunState = OverrunState::new();

#[derive(Debug)]
#[allow(dead_code)]
enum StartupError {
    Table(TableError),
    Io(std::io::Error),
    #[cfg(target_os = "espidf")]
    Esp(esp_idf_svc::sys::EspError),
}

impl From<TableError> for StartupError {
    fn from(e: TableError) -> Self {
        StartupError::Table(e)
    }
}

impl From<std::io::Error> for StartupError {
    fn from(e: std::io::Error) -> Self {
        StartupError::Io(e)
    }
}

#[cfg(target_os = "espidf")]
impl From<esp_idf_svc::sys::EspError> for StartupError {
    fn from(e: esp_idf_svc::sys::EspError) -> Self {
        StartupError::Esp(e)
    }
}

#[cfg(target_os = "espidf")]
fn main() -> Result<(), StartupError> {
    board::run()
}

#[cfg(not(target_os = "espidf"))]
fn main() -> Result<(), StartupError> {
    host::run()
}

#[cfg(target_os = "espidf")]
mod board {
    use esp_idf_svc::hal::delay::FreeRtos;
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::task::thread::ThreadSpawnConfiguration;

    use openawg_scpi::config::{ServerConfig, SERVER_STACK_SIZE, SERVER_TASK_PRIORITY};
    use openawg_scpi::hal::{init_log_uart, init_scpi_uart, timestamp_us, EfuseMac, UartConfig};
    use openawg_scpi::ingest::Ingest;
    use openawg_scpi::log_drain;
    use openawg_scpi::scpi::ResponseWriter;
    use openawg_scpi::{Identity, Server};

    use super::{StartupError, COMMAND_QUEUE, OVERRUN};

    /// RX task stack.
    const RX_STACK_SIZE: usize = 4096;

    pub fn run() -> Result<(), StartupError> {
        esp_idf_svc::sys::link_patches();

        let peripherals = Peripherals::take()?;
        let pins = peripherals.pins;
        let uart_config = UartConfig::default();

        let mut log_uart = init_log_uart(peripherals.uart1, pins.gpio6, &uart_config)?;
        let (mut rx, tx) = init_scpi_uart(peripherals.uart2, pins.gpio17, pins.gpio18, &uart_config)?;

        let config = ServerConfig {
            clock: timestamp_us,
            ..ServerConfig::default()
        };
        let identity = Identity::from_device(&mut EfuseMac);
        let mut server = Server::with_builtins(identity, (), config)?;

        // Server task
        ThreadSpawnConfiguration {
            stack_size: SERVER_STACK_SIZE,
            priority: SERVER_TASK_PRIORITY,
            ..Default::default()
        }
        .set()?;
        std::thread::Builder::new()
            .stack_size(SERVER_STACK_SIZE)
            .spawn(move || {
                let mut writer = ResponseWriter::new(tx);
                server.run(&COMMAND_QUEUE, &OVERRUN, &mut writer, || FreeRtos::delay_ms(1))
            })?;

        // RX task, one priority above the server so lines are framed promptly
        ThreadSpawnConfiguration {
            stack_size: RX_STACK_SIZE,
            priority: SERVER_TASK_PRIORITY + 1,
            ..Default::default()
        }
        .set()?;
        std::thread::Builder::new()
            .stack_size(RX_STACK_SIZE)
            .spawn(move || {
                let mut ingest: Ingest = Ingest::new(config.saturation, timestamp_us);
                ingest.start(&mut rx);
                loop {
                    ingest.on_rx(&mut rx, &COMMAND_QUEUE, &OVERRUN);
                    FreeRtos::delay_ms(1);
                }
            })?;

        ThreadSpawnConfiguration::default().set()?;

        log_drain::run(&mut log_uart, timestamp_us, || FreeRtos::delay_ms(10))
    }
}

#[cfg(not(target_os = "espidf"))]
mod host {
    use std::fmt;
    use std::io::{self, Read, Write};
    use std::sync::OnceLock;
    use std::thread;
    use std::time::{Duration, Instant};

    use openawg_scpi::config::{SaturationPolicy, ServerConfig, INPUT_BUFFER_LENGTH, SERVER_STACK_SIZE};
    use openawg_scpi::ingest::Ingest;
    use openawg_scpi::log_drain;
    use openawg_scpi::scpi::ResponseWriter;
    use openawg_scpi::transport::{DeviceId, SerialTx, SliceRx};
    use openawg_scpi::{Identity, Server};

    use super::{StartupError, COMMAND_QUEUE, OVERRUN};

    /// Grace period for the server to answer the last line after EOF.
    const EOF_GRACE: Duration = Duration::from_millis(100);

    static START: OnceLock<Instant> = OnceLock::new();

    fn clock() -> i64 {
        START.get_or_init(Instant::now).elapsed().as_micros() as i64
    }

    struct StdoutTx(io::Stdout);

    impl SerialTx for StdoutTx {
        type Error = io::Error;

        fn write_byte(&mut self, byte: u8) -> io::Result<()> {
            self.0.write_all(&[byte])
        }

        fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
            self.0.write_all(bytes)
        }

        fn flush(&mut self) -> io::Result<()> {
            self.0.flush()
        }
    }

    struct StderrSink(io::Stderr);

    impl fmt::Write for StderrSink {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            self.0.write_all(s.as_bytes()).map_err(|_| fmt::Error)
        }
    }

    /// Host machines have no burned-in id.
    struct NoDeviceId;

    impl DeviceId for NoDeviceId {
        fn unique_id(&mut self, _buf: &mut [u8]) -> Option<usize> {
            None
        }
    }

    pub fn run() -> Result<(), StartupError> {
        START.get_or_init(Instant::now);

        let saturation = if std::env::args().any(|a| a == "--drop-on-full") {
            SaturationPolicy::DropAndReport
        } else {
            SaturationPolicy::Block
        };
        let config = ServerConfig { saturation, clock };
        let mut server = Server::with_builtins(Identity::from_device(&mut NoDeviceId), (), config)?;

        thread::Builder::new()
            .name("scpi".into())
            .stack_size(SERVER_STACK_SIZE)
            .spawn(move || {
                let mut writer = ResponseWriter::new(StdoutTx(io::stdout()));
                server.run(&COMMAND_QUEUE, &OVERRUN, &mut writer, || {
                    thread::sleep(Duration::from_micros(200))
                })
            })?;

        thread::Builder::new().name("log".into()).spawn(|| {
            let mut sink = StderrSink(io::stderr());
            log_drain::run(&mut sink, clock, || thread::sleep(Duration::from_millis(5)))
        })?;

        let mut ingest: Ingest = Ingest::new(config.saturation, clock);
        let mut stdin = io::stdin().lock();
        let mut chunk = [0u8; INPUT_BUFFER_LENGTH];
        loop {
            let n = stdin.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            let mut rx = SliceRx::new(&chunk[..n]);
            ingest.on_rx(&mut rx, &COMMAND_QUEUE, &OVERRUN);
        }

        while !COMMAND_QUEUE.is_empty() {
            thread::sleep(Duration::from_millis(1));
        }
        thread::sleep(EOF_GRACE);
        Ok(())
    }
}
