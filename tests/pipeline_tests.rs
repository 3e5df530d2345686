//! End-to-end tests: bytes in, framed lines through the queue, responses out

use std::sync::Arc;
use std::thread;

use openawg_scpi::config::{no_clock, SaturationPolicy, ServerConfig};
use openawg_scpi::ingest::{CommandQueue, Ingest, OverrunState};
use openawg_scpi::scpi::identity::serial_from_device;
use openawg_scpi::scpi::{Identity, Outcome, ResponseWriter, ScpiError, Server};
use openawg_scpi::transport::{DeviceId, SerialTx, SliceRx};

/// Fixed hardware id.
struct BoardId;

impl DeviceId for BoardId {
    fn unique_id(&mut self, buf: &mut [u8]) -> Option<usize> {
        let id = [0xDE, 0xAD, 0xBE, 0xEF];
        buf[..id.len()].copy_from_slice(&id);
        Some(id.len())
    }
}

/// Captures everything written.
#[derive(Default)]
struct CaptureTx {
    out: Vec<u8>,
    fail: bool,
}

impl SerialTx for CaptureTx {
    type Error = &'static str;

    fn write_byte(&mut self, byte: u8) -> Result<(), &'static str> {
        if self.fail {
            return Err("link down");
        }
        self.out.push(byte);
        Ok(())
    }
}

fn server() -> Server<()> {
    let serial = serial_from_device(&mut BoardId);
    let id = Identity::new("AcmeCo", "AWG-1", &serial, "1.0.0");
    Server::with_builtins(id, (), ServerConfig::default()).unwrap()
}

/// Feed `input` through a fresh pipeline and return everything sent back.
fn run_pipeline(input: &[u8]) -> String {
    let queue = CommandQueue::<4>::new();
    let overrun = OverrunState::new();
    let mut ingest: Ingest = Ingest::new(SaturationPolicy::DropAndReport, no_clock);
    let mut server = server();
    let mut writer = ResponseWriter::new(CaptureTx::default());

    // Small chunks so the queue never fills
    for chunk in input.chunks(8) {
        let mut rx = SliceRx::new(chunk);
        ingest.on_rx(&mut rx, &queue, &overrun);
        while let Some(line) = queue.try_pop() {
            server.report_overruns(&overrun);
            server.process(&line, &mut writer).unwrap();
        }
    }
    String::from_utf8(writer.into_inner().out).unwrap()
}

#[test]
fn test_idn_over_the_wire() {
    assert_eq!(run_pipeline(b"*idn?\n"), "AcmeCo,AWG-1,DEADBEEF,1.0.0\r\n");
}

#[test]
fn test_unknown_command_then_error_query() {
    let out = run_pipeline(b"BOGUS:CMD?\r\nSYST:ERR:COUN?\r\nSYST:ERR:NEXT?\r\nSYST:ERR?\r\n");
    assert_eq!(out, "1\r\n-113,\"Undefined header\"\r\n0,\"No error\"\r\n");
}

#[test]
fn test_commands_without_response_send_nothing() {
    assert_eq!(run_pipeline(b"*RST\n*CLS\n\n\n*OPC?\n"), "1\r\n");
}

#[test]
fn test_long_line_reports_input_overrun() {
    let mut input = vec![b'A'; 400];
    input.extend_from_slice(b"\nSYST:ERR?\nSYST:ERR?\n");
    let out = run_pipeline(&input);
    assert_eq!(out, "-363,\"Input buffer overrun\"\r\n0,\"No error\"\r\n");
}

#[test]
fn test_invalid_utf8_reports_invalid_character() {
    let mut server = server();
    let mut writer = ResponseWriter::new(CaptureTx::default());
    let queue = CommandQueue::<2>::new();
    let overrun = OverrunState::new();
    let mut ingest: Ingest = Ingest::new(SaturationPolicy::Block, no_clock);

    let mut rx = SliceRx::new(&[0xC3, 0x28, b'\n']);
    ingest.on_rx(&mut rx, &queue, &overrun);
    let line = queue.try_pop().unwrap();
    assert_eq!(
        server.process(&line, &mut writer),
        Ok(Outcome::Failed(ScpiError::InvalidCharacter))
    );
    assert!(writer.transport().out.is_empty());
}

#[test]
fn test_dropped_lines_reported_before_next_command() {
    let queue = CommandQueue::<2>::new();
    let overrun = OverrunState::new();
    let mut ingest: Ingest = Ingest::new(SaturationPolicy::DropAndReport, no_clock);
    let mut server = server();
    let mut writer = ResponseWriter::new(CaptureTx::default());

    let mut rx = SliceRx::new(b"*WAI\n*WAI\n*WAI\n*WAI\n");
    assert_eq!(ingest.on_rx(&mut rx, &queue, &overrun), 2);

    while let Some(line) = queue.try_pop() {
        server.report_overruns(&overrun);
        server.process(&line, &mut writer).unwrap();
    }
    assert_eq!(server.errors().len(), 2);
    server.execute("SYST:ERR?");
    assert_eq!(server.response(), "-363,\"Input buffer overrun\"");
}

#[test]
fn test_transport_failure_surfaces() {
    let mut server = server();
    let mut writer = ResponseWriter::new(CaptureTx {
        out: Vec::new(),
        fail: true,
    });
    let line = openawg_scpi::Line::new("*IDN?").unwrap();
    assert_eq!(server.process(&line, &mut writer), Err("link down"));

    // A command with no response never touches the transport
    let line = openawg_scpi::Line::new("*CLS").unwrap();
    assert_eq!(server.process(&line, &mut writer), Ok(Outcome::Executed));
}

#[test]
fn test_threaded_pipeline_preserves_order() {
    const COUNT: usize = 50;
    let queue = Arc::new(CommandQueue::<3>::new());
    let overrun = Arc::new(OverrunState::new());

    let producer = {
        let queue = Arc::clone(&queue);
        let overrun = Arc::clone(&overrun);
        thread::spawn(move || {
            let mut ingest: Ingest = Ingest::new(SaturationPolicy::Block, no_clock);
            let mut input = Vec::new();
            for i in 0..COUNT {
                input.extend_from_slice(format!("*ESE {}\n*ESE?\n", i).as_bytes());
            }
            let mut rx = SliceRx::new(&input);
            ingest.on_rx(&mut rx, &queue, &overrun)
        })
    };

    let mut server = server();
    let mut writer = ResponseWriter::new(CaptureTx::default());
    for _ in 0..COUNT * 2 {
        let line = queue.pop_wait(thread::yield_now);
        server.report_overruns(&overrun);
        server.process(&line, &mut writer).unwrap();
    }
    assert_eq!(producer.join().unwrap(), COUNT * 2);

    let out = String::from_utf8(writer.into_inner().out).unwrap();
    let expected: String = (0..COUNT).map(|i| format!("{}\r\n", i)).collect();
    assert_eq!(out, expected);
    assert!(server.errors().is_empty());
}
