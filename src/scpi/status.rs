//! IEEE 488.2 / SCPI status registers.
//!
//! ```text
//! QUES cond ─▶ QUES event & QUES enable ─┐
//! OPER cond ─▶ OPER event & OPER enable ─┤
//! error queue non-empty ─────────────────┼─▶ STB & SRE ─▶ MSS
//! ESR & ESE ─────────────────────────────┘
//! ```
//!
//! Only the dispatcher mutates these; no locking.

/// Event Status Register bits.
pub mod esr {
    /// Operation complete
    pub const OPC: u8 = 0x01;
    /// Request control
    pub const REQ: u8 = 0x02;
    /// Query error
    pub const QYE: u8 = 0x04;
    /// Device-dependent error
    pub const DDE: u8 = 0x08;
    /// Execution error
    pub const EXE: u8 = 0x10;
    /// Command error
    pub const CME: u8 = 0x20;
    /// User request
    pub const URQ: u8 = 0x40;
    /// Power on
    pub const PON: u8 = 0x80;
}

/// Status Byte bits.
pub mod stb {
    /// Error/event queue not empty
    pub const EAV: u8 = 0x04;
    /// Questionable status summary
    pub const QES: u8 = 0x08;
    /// Message available
    pub const MAV: u8 = 0x10;
    /// Standard event summary
    pub const ESB: u8 = 0x20;
    /// Master summary / request service
    pub const MSS: u8 = 0x40;
    /// Operation status summary
    pub const OSS: u8 = 0x80;
}

/// Condition / event / enable triple of a SCPI status structure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatusGroup {
    pub condition: u16,
    pub event: u16,
    pub enable: u16,
}

impl StatusGroup {
    /// Update the condition register, latching 0→1 transitions into event.
    pub fn set_condition(&mut self, condition: u16) {
        let rising = condition & !self.condition;
        self.event |= rising;
        self.condition = condition;
    }

    /// Read and clear the event register.
    pub fn take_event(&mut self) -> u16 {
        core::mem::take(&mut self.event)
    }

    pub fn summary(&self) -> bool {
        self.event & self.enable != 0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatusRegisters {
    /// Standard Event Status Register
    pub esr: u8,
    /// Standard Event Status Enable
    pub ese: u8,
    /// Service Request Enable
    pub sre: u8,
    pub questionable: StatusGroup,
    pub operation: StatusGroup,
}

impl StatusRegisters {
    pub const fn new() -> Self {
        Self {
            esr: 0,
            ese: 0,
            sre: 0,
            questionable: StatusGroup { condition: 0, event: 0, enable: 0 },
            operation: StatusGroup { condition: 0, event: 0, enable: 0 },
        }
    }

    /// Set ESR bits.
    pub fn raise(&mut self, bits: u8) {
        self.esr |= bits;
    }

    /// Read and clear ESR (`*ESR?`).
    pub fn take_esr(&mut self) -> u8 {
        core::mem::take(&mut self.esr)
    }

    /// Status byte as `*STB?` reports it. `errors_pending` feeds EAV.
    pub fn status_byte(&self, errors_pending: bool) -> u8 {
        let mut stb = 0u8;
        if errors_pending {
            stb |= stb::EAV;
        }
        if self.questionable.summary() {
            stb |= stb::QES;
        }
        if self.esr & self.ese != 0 {
            stb |= stb::ESB;
        }
        if self.operation.summary() {
            stb |= stb::OSS;
        }
        if stb & self.sre & !stb::MSS != 0 {
            stb |= stb::MSS;
        }
        stb
    }

    /// `*CLS`: clear event registers. Enables survive.
    pub fn clear_events(&mut self) {
        self.esr = 0;
        self.questionable.event = 0;
        self.operation.event = 0;
    }

    /// `STATus:PRESet`: SCPI enable registers to their preset value.
    pub fn preset(&mut self) {
        self.questionable.enable = 0;
        self.operation.enable = 0;
    }

    /// `*RST`: every register back to power-on defaults. Condition
    /// registers are owned by the instrument and are kept.
    pub fn reset(&mut self) {
        let questionable = self.questionable.condition;
        let operation = self.operation.condition;
        *self = Self::new();
        self.questionable.condition = questionable;
        self.operation.condition = operation;
    }
}
