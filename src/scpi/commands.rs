//! Command table and built-in command handlers

use heapless::Vec;

use super::error::{ScpiError, TableError};
use super::pattern::{Header, Pattern};
use super::server::Context;
use super::status::stb;
use crate::config::{MAX_COMMANDS, MAX_NODES};

/// SCPI standard version reported by `SYSTem:VERSion?`.
pub const SCPI_VERSION: &str = "1999.0";

/// Instrument-specific command body.
pub type CustomHandler<I> = fn(&mut Context<'_, I>) -> Result<(), ScpiError>;

/// IEEE 488.2 common commands and the required SCPI subsystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Cls,
    Ese,
    EseQ,
    EsrQ,
    IdnQ,
    Opc,
    OpcQ,
    Rst,
    Sre,
    SreQ,
    StbQ,
    TstQ,
    Wai,
    SystemErrorNextQ,
    SystemErrorCountQ,
    SystemVersionQ,
    QuestionableEventQ,
    QuestionableConditionQ,
    QuestionableEnable,
    QuestionableEnableQ,
    OperationEventQ,
    OperationConditionQ,
    OperationEnable,
    OperationEnableQ,
    StatusPreset,
}

/// Built-in command descriptor
pub struct CommandDescriptor {
    pub pattern: &'static str,
    pub brief: &'static str,
    pub builtin: Builtin,
}

/// Built-in command surface
pub static BUILTIN_COMMANDS: &[CommandDescriptor] = &[
    // IEEE 488.2 common commands
    CommandDescriptor { pattern: "*CLS", brief: "Clear status", builtin: Builtin::Cls },
    CommandDescriptor { pattern: "*ESE", brief: "Set event status enable", builtin: Builtin::Ese },
    CommandDescriptor { pattern: "*ESE?", brief: "Event status enable", builtin: Builtin::EseQ },
    CommandDescriptor { pattern: "*ESR?", brief: "Read and clear event status", builtin: Builtin::EsrQ },
    CommandDescriptor { pattern: "*IDN?", brief: "Identification", builtin: Builtin::IdnQ },
    CommandDescriptor { pattern: "*OPC", brief: "Set operation complete", builtin: Builtin::Opc },
    CommandDescriptor { pattern: "*OPC?", brief: "Operation complete", builtin: Builtin::OpcQ },
    CommandDescriptor { pattern: "*RST", brief: "Reset", builtin: Builtin::Rst },
    CommandDescriptor { pattern: "*SRE", brief: "Set service request enable", builtin: Builtin::Sre },
    CommandDescriptor { pattern: "*SRE?", brief: "Service request enable", builtin: Builtin::SreQ },
    CommandDescriptor { pattern: "*STB?", brief: "Status byte", builtin: Builtin::StbQ },
    CommandDescriptor { pattern: "*TST?", brief: "Self-test", builtin: Builtin::TstQ },
    CommandDescriptor { pattern: "*WAI", brief: "Wait to continue", builtin: Builtin::Wai },
    // Required SCPI commands
    CommandDescriptor { pattern: "SYSTem:ERRor[:NEXT]?", brief: "Pop oldest error", builtin: Builtin::SystemErrorNextQ },
    CommandDescriptor { pattern: "SYSTem:ERRor:COUNt?", brief: "Queued error count", builtin: Builtin::SystemErrorCountQ },
    CommandDescriptor { pattern: "SYSTem:VERSion?", brief: "SCPI version", builtin: Builtin::SystemVersionQ },
    CommandDescriptor { pattern: "STATus:QUEStionable[:EVENt]?", brief: "Questionable event", builtin: Builtin::QuestionableEventQ },
    CommandDescriptor { pattern: "STATus:QUEStionable:CONDition?", brief: "Questionable condition", builtin: Builtin::QuestionableConditionQ },
    CommandDescriptor { pattern: "STATus:QUEStionable:ENABle", brief: "Set questionable enable", builtin: Builtin::QuestionableEnable },
    CommandDescriptor { pattern: "STATus:QUEStionable:ENABle?", brief: "Questionable enable", builtin: Builtin::QuestionableEnableQ },
    CommandDescriptor { pattern: "STATus:OPERation[:EVENt]?", brief: "Operation event", builtin: Builtin::OperationEventQ },
    CommandDescriptor { pattern: "STATus:OPERation:CONDition?", brief: "Operation condition", builtin: Builtin::OperationConditionQ },
    CommandDescriptor { pattern: "STATus:OPERation:ENABle", brief: "Set operation enable", builtin: Builtin::OperationEnable },
    CommandDescriptor { pattern: "STATus:OPERation:ENABle?", brief: "Operation enable", builtin: Builtin::OperationEnableQ },
    CommandDescriptor { pattern: "STATus:PRESet", brief: "Preset status", builtin: Builtin::StatusPreset },
];

impl Builtin {
    /// Run the command. Parameters are validated before any register
    /// changes, so an error leaves state untouched.
    pub fn execute<I: super::server::Instrument>(self, ctx: &mut Context<'_, I>) -> Result<(), ScpiError> {
        match self {
            Builtin::Cls => {
                ctx.params.finish()?;
                ctx.errors.clear();
                ctx.status.clear_events();
            }
            Builtin::Ese => {
                let value = ctx.params.next_ranged(true, 0, 255)?.unwrap_or_default();
                ctx.params.finish()?;
                ctx.status.ese = value as u8;
            }
            Builtin::EseQ => {
                ctx.params.finish()?;
                ctx.response.push_uint(u64::from(ctx.status.ese));
            }
            Builtin::EsrQ => {
                ctx.params.finish()?;
                let esr = ctx.status.take_esr();
                ctx.response.push_uint(u64::from(esr));
            }
            Builtin::IdnQ => {
                ctx.params.finish()?;
                ctx.response.push_display(ctx.identity);
            }
            Builtin::Opc => {
                ctx.params.finish()?;
                // No pending operations: complete immediately
                ctx.status.raise(super::status::esr::OPC);
            }
            Builtin::OpcQ => {
                ctx.params.finish()?;
                ctx.response.push_int(1);
            }
            Builtin::Rst => {
                ctx.params.finish()?;
                ctx.status.reset();
                ctx.instrument.reset();
            }
            Builtin::Sre => {
                let value = ctx.params.next_ranged(true, 0, 255)?.unwrap_or_default();
                ctx.params.finish()?;
                // Bit 6 cannot enable itself
                ctx.status.sre = (value as u8) & !stb::MSS;
            }
            Builtin::SreQ => {
                ctx.params.finish()?;
                ctx.response.push_uint(u64::from(ctx.status.sre));
            }
            Builtin::StbQ => {
                ctx.params.finish()?;
                let value = ctx.status.status_byte(!ctx.errors.is_empty());
                ctx.response.push_uint(u64::from(value));
            }
            Builtin::TstQ => {
                ctx.params.finish()?;
                let code = ctx.instrument.self_test();
                ctx.response.push_int(i64::from(code));
            }
            Builtin::Wai => {
                ctx.params.finish()?;
            }
            Builtin::SystemErrorNextQ => {
                ctx.params.finish()?;
                let error = ctx.errors.pop();
                ctx.response.push_display(&error);
            }
            Builtin::SystemErrorCountQ => {
                ctx.params.finish()?;
                ctx.response.push_uint(ctx.errors.len() as u64);
            }
            Builtin::SystemVersionQ => {
                ctx.params.finish()?;
                ctx.response.push_text(SCPI_VERSION);
            }
            Builtin::QuestionableEventQ => {
                ctx.params.finish()?;
                let event = ctx.status.questionable.take_event();
                ctx.response.push_uint(u64::from(event));
            }
            Builtin::QuestionableConditionQ => {
                ctx.params.finish()?;
                ctx.response.push_uint(u64::from(ctx.status.questionable.condition));
            }
            Builtin::QuestionableEnable => {
                let value = ctx.params.next_ranged(true, 0, 0xFFFF)?.unwrap_or_default();
                ctx.params.finish()?;
                ctx.status.questionable.enable = value as u16;
            }
            Builtin::QuestionableEnableQ => {
                ctx.params.finish()?;
                ctx.response.push_uint(u64::from(ctx.status.questionable.enable));
            }
            Builtin::OperationEventQ => {
                ctx.params.finish()?;
                let event = ctx.status.operation.take_event();
                ctx.response.push_uint(u64::from(event));
            }
            Builtin::OperationConditionQ => {
                ctx.params.finish()?;
                ctx.response.push_uint(u64::from(ctx.status.operation.condition));
            }
            Builtin::OperationEnable => {
                let value = ctx.params.next_ranged(true, 0, 0xFFFF)?.unwrap_or_default();
                ctx.params.finish()?;
                ctx.status.operation.enable = value as u16;
            }
            Builtin::OperationEnableQ => {
                ctx.params.finish()?;
                ctx.response.push_uint(u64::from(ctx.status.operation.enable));
            }
            Builtin::StatusPreset => {
                ctx.params.finish()?;
                ctx.status.preset();
            }
        }
        Ok(())
    }
}

/// What a table entry runs.
pub enum Handler<I> {
    Builtin(Builtin),
    Custom(CustomHandler<I>),
}

impl<I> Clone for Handler<I> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I> Copy for Handler<I> {}

impl<I> core::fmt::Debug for Handler<I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Handler::Builtin(b) => write!(f, "Builtin({:?})", b),
            Handler::Custom(_) => f.write_str("Custom"),
        }
    }
}

pub struct Entry<I> {
    pub pattern: Pattern,
    pub handler: Handler<I>,
}

/// Pattern resolved for one input header.
pub struct Resolved<'t, I> {
    pub entry: &'t Entry<I>,
    pub index: usize,
    pub suffixes: Vec<u32, MAX_NODES>,
}

/// Parsed command table, built once at startup.
pub struct CommandTable<I> {
    entries: Vec<Entry<I>, MAX_COMMANDS>,
}

impl<I> CommandTable<I> {
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Table holding every built-in command.
    pub fn with_builtins() -> Result<Self, TableError> {
        let mut table = Self::new();
        for desc in BUILTIN_COMMANDS {
            table.register(desc.pattern, Handler::Builtin(desc.builtin))?;
        }
        Ok(table)
    }

    pub fn register(&mut self, pattern: &'static str, handler: Handler<I>) -> Result<(), TableError> {
        let pattern = Pattern::parse(pattern)?;
        self.entries
            .push(Entry { pattern, handler })
            .map_err(|_| TableError::Full)
    }

    /// Register an instrument command.
    pub fn register_custom(&mut self, pattern: &'static str, handler: CustomHandler<I>) -> Result<(), TableError> {
        self.register(pattern, Handler::Custom(handler))
    }

    /// Find the handler for `header`.
    ///
    /// Among matching entries the one that skipped fewer optional nodes wins,
    /// then the one with more nodes written in long form, then table order.
    pub fn resolve(&self, header: &Header<'_>) -> Option<Resolved<'_, I>> {
        let mut best: Option<(usize, super::pattern::Match)> = None;

        for (index, entry) in self.entries.iter().enumerate() {
            let Some(m) = entry.pattern.matches(header) else {
                continue;
            };
            let better = match &best {
                None => true,
                Some((_, b)) => {
                    m.skipped < b.skipped || (m.skipped == b.skipped && m.long_hits > b.long_hits)
                }
            };
            if better {
                best = Some((index, m));
            }
        }

        best.map(|(index, m)| Resolved {
            entry: &self.entries[index],
            index,
            suffixes: m.suffixes,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Source patterns in table order.
    pub fn patterns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|e| e.pattern.source())
    }
}

impl<I> Default for CommandTable<I> {
    fn default() -> Self {
        Self::new()
    }
}
