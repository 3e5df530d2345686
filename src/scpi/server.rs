//! SCPI dispatcher.
//!
//! Owns everything the worker context touches: command table, error queue,
//! status registers, identity and the instrument. One line is processed at
//! a time, and its response is sent before the next line is taken.
//!
//! ```text
//! IDLE ──line──▶ MATCHING ──hit──▶ EXECUTING ──▶ RESPONDING ──▶ IDLE
//!                   │                  │
//!                   └──miss──▶ ERROR RECORDED ◀──handler error
//! ```

use super::commands::{CommandTable, Handler};
use super::error::{ScpiError, TableError};
use super::error_queue::{ErrorQueue, PushOutcome};
use super::identity::Identity;
use super::params::{parse_line, Params};
use super::pattern::{Header, DEFAULT_SUFFIX};
use super::response::{Response, ResponseWriter};
use super::status::StatusRegisters;
use crate::config::{Clock, ServerConfig};
use crate::ingest::{CommandQueue, Line, OverrunState};
use crate::log_globals::DISPATCH_LOG_STREAM;
use crate::transport::SerialTx;
use crate::{rt_debug, rt_error, rt_trace, rt_warn};

/// Device-specific hooks invoked by the common commands.
pub trait Instrument {
    /// `*RST`: return the instrument to its power-on settings.
    fn reset(&mut self) {}

    /// `*TST?`: run a self-test, `0` means pass.
    fn self_test(&mut self) -> i32 {
        0
    }
}

/// Instrument with no device state.
impl Instrument for () {}

/// Everything a handler may read or change while it runs.
pub struct Context<'a, I> {
    pub params: Params<'a>,
    suffixes: &'a [u32],
    pub response: &'a mut Response,
    pub errors: &'a mut ErrorQueue,
    pub status: &'a mut StatusRegisters,
    pub identity: &'a Identity,
    pub instrument: &'a mut I,
    clock: Clock,
}

impl<I> Context<'_, I> {
    /// Numeric suffix captured by the `idx`-th suffix-capable node, counted
    /// from the start of the pattern. Missing suffixes read as 1.
    pub fn suffix(&self, idx: usize) -> u32 {
        self.suffixes.get(idx).copied().unwrap_or(DEFAULT_SUFFIX)
    }

    /// Record an error without failing the command.
    pub fn push_error(&mut self, error: ScpiError) -> PushOutcome {
        record_error(self.errors, self.status, self.clock, error)
    }
}

/// Queue `error`, raise its event status bit and log queue overflow.
fn record_error(
    errors: &mut ErrorQueue,
    status: &mut StatusRegisters,
    clock: Clock,
    error: ScpiError,
) -> PushOutcome {
    status.raise(error.esr_bit());
    let outcome = errors.push(error);
    match outcome {
        PushOutcome::Queued => {}
        PushOutcome::Overflowed => {
            rt_warn!(DISPATCH_LOG_STREAM, clock(), "error queue overflow");
        }
        PushOutcome::Discarded => {
            rt_trace!(DISPATCH_LOG_STREAM, clock(), "error {} discarded", error.code());
        }
    }
    outcome
}

/// Dispatch phase, observable between lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Matching,
    Executing,
    Responding,
    ErrorRecorded,
}

/// What happened to one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Handler ran; the response (possibly empty) is ready.
    Executed,
    /// An error was queued instead of a response.
    Failed(ScpiError),
    /// Truncated line, already reported as an input overrun.
    Skipped,
}

pub struct Server<I> {
    table: CommandTable<I>,
    errors: ErrorQueue,
    status: StatusRegisters,
    identity: Identity,
    instrument: I,
    response: Response,
    state: DispatchState,
    clock: Clock,
    processed: u32,
}

impl<I: Instrument> Server<I> {
    pub fn new(table: CommandTable<I>, identity: Identity, instrument: I, config: ServerConfig) -> Self {
        Self {
            table,
            errors: ErrorQueue::new(),
            status: StatusRegisters::new(),
            identity,
            instrument,
            response: Response::new(),
            state: DispatchState::Idle,
            clock: config.clock,
            processed: 0,
        }
    }

    /// Server with only the built-in commands registered.
    pub fn with_builtins(identity: Identity, instrument: I, config: ServerConfig) -> Result<Self, TableError> {
        Ok(Self::new(CommandTable::with_builtins()?, identity, instrument, config))
    }

    /// Queue an error and set its event status bit.
    pub fn push_error(&mut self, error: ScpiError) -> PushOutcome {
        record_error(&mut self.errors, &mut self.status, self.clock, error)
    }

    /// Turn overrun events recorded by the RX context into `-363` records.
    pub fn report_overruns(&mut self, overrun: &OverrunState) {
        if !overrun.is_pending() {
            return;
        }
        let snapshot = overrun.take();
        for _ in 0..snapshot.truncated.saturating_add(snapshot.dropped) {
            self.push_error(ScpiError::InputBufferOverrun);
        }
        rt_warn!(
            DISPATCH_LOG_STREAM,
            (self.clock)(),
            "input overrun: {} truncated, {} dropped",
            snapshot.truncated,
            snapshot.dropped
        );
    }

    /// Match and run one command line. The response is left in
    /// [`Server::response`] until the next call.
    pub fn execute(&mut self, line: &str) -> Outcome {
        self.response.clear();
        self.state = DispatchState::Matching;

        let parsed = parse_line(line);
        if parsed.header.is_empty() {
            self.state = DispatchState::Idle;
            return Outcome::Executed;
        }

        let Some(header) = Header::parse(parsed.header) else {
            return self.fail(ScpiError::SyntaxError);
        };

        let Some(resolved) = self.table.resolve(&header) else {
            rt_debug!(DISPATCH_LOG_STREAM, (self.clock)(), "undefined header '{}'", parsed.header);
            return self.fail(ScpiError::UndefinedHeader);
        };

        self.state = DispatchState::Executing;
        let handler = resolved.entry.handler;
        let suffixes = resolved.suffixes;

        let mut ctx = Context {
            params: parsed.params,
            suffixes: &suffixes,
            response: &mut self.response,
            errors: &mut self.errors,
            status: &mut self.status,
            identity: &self.identity,
            instrument: &mut self.instrument,
            clock: self.clock,
        };
        let result = match handler {
            Handler::Builtin(builtin) => builtin.execute(&mut ctx),
            Handler::Custom(f) => f(&mut ctx),
        };

        if let Err(error) = result {
            rt_debug!(
                DISPATCH_LOG_STREAM,
                (self.clock)(),
                "'{}' failed: {}",
                parsed.header,
                error
            );
            self.response.clear();
            return self.fail(error);
        }
        if self.response.overflowed().is_err() {
            self.response.clear();
            return self.fail(ScpiError::TooMuchData);
        }

        self.processed = self.processed.wrapping_add(1);
        self.state = DispatchState::Responding;
        Outcome::Executed
    }

    fn fail(&mut self, error: ScpiError) -> Outcome {
        self.state = DispatchState::ErrorRecorded;
        self.push_error(error);
        Outcome::Failed(error)
    }

    /// Execute a framed line and send its response.
    ///
    /// Transport failures are logged and returned; the line still counts as
    /// processed.
    pub fn process<T: SerialTx>(&mut self, line: &Line, writer: &mut ResponseWriter<T>) -> Result<Outcome, T::Error> {
        if line.is_truncated() {
            rt_debug!(DISPATCH_LOG_STREAM, (self.clock)(), "skipping truncated line");
            self.state = DispatchState::Idle;
            return Ok(Outcome::Skipped);
        }

        let outcome = match line.as_str() {
            Some(text) => self.execute(text),
            None => {
                self.response.clear();
                self.fail(ScpiError::InvalidCharacter)
            }
        };

        let sent = writer.send(self.response.as_str());
        self.state = DispatchState::Idle;
        match sent {
            Ok(()) => Ok(outcome),
            Err(e) => {
                rt_error!(DISPATCH_LOG_STREAM, (self.clock)(), "response write failed: {:?}", e);
                Err(e)
            }
        }
    }

    /// Worker loop: take lines from `queue` forever.
    ///
    /// `idle` runs while the queue is empty (yield or sleep).
    pub fn run<T: SerialTx, F: FnMut(), const N: usize>(
        &mut self,
        queue: &CommandQueue<N>,
        overrun: &OverrunState,
        writer: &mut ResponseWriter<T>,
        mut idle: F,
    ) -> ! {
        loop {
            let line = queue.pop_wait(&mut idle);
            self.report_overruns(overrun);
            // Already logged
            let _ = self.process(&line, writer);
        }
    }

    pub fn response(&self) -> &str {
        self.response.as_str()
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Lines executed successfully since start.
    pub fn processed(&self) -> u32 {
        self.processed
    }

    pub fn errors(&self) -> &ErrorQueue {
        &self.errors
    }

    pub fn errors_mut(&mut self) -> &mut ErrorQueue {
        &mut self.errors
    }

    pub fn status(&self) -> &StatusRegisters {
        &self.status
    }

    pub fn status_mut(&mut self) -> &mut StatusRegisters {
        &mut self.status
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn instrument(&self) -> &I {
        &self.instrument
    }

    pub fn instrument_mut(&mut self) -> &mut I {
        &mut self.instrument
    }

    pub fn table(&self) -> &CommandTable<I> {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut CommandTable<I> {
        &mut self.table
    }
}
