//! SCPI error records

use core::fmt;

/// Deferred error, as stored in the error queue and reported by
/// `SYSTem:ERRor?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScpiError {
    /// 0: queue empty sentinel
    NoError,
    /// -101: byte outside the ASCII command set
    InvalidCharacter,
    /// -102: malformed header or parameter list
    SyntaxError,
    /// -104: parameter of the wrong type
    DataTypeError,
    /// -108: more parameters than the command accepts
    ParameterNotAllowed,
    /// -109: mandatory parameter absent
    MissingParameter,
    /// -113: no pattern matched
    UndefinedHeader,
    /// -114: suffix names an instance the instrument does not have
    HeaderSuffixOutOfRange,
    /// -222: numeric parameter outside the allowed range
    DataOutOfRange,
    /// -223: response does not fit the output buffer
    TooMuchData,
    /// -224: parameter value not in the accepted set
    IllegalParameterValue,
    /// -350: error queue overflowed
    QueueOverflow,
    /// -363: input lost by the framer or the command queue
    InputBufferOverrun,
    /// Instrument-specific error raised by a custom handler.
    Custom { code: i16, message: &'static str },
}

impl ScpiError {
    /// Get error code
    pub fn code(&self) -> i16 {
        match self {
            Self::NoError => 0,
            Self::InvalidCharacter => -101,
            Self::SyntaxError => -102,
            Self::DataTypeError => -104,
            Self::ParameterNotAllowed => -108,
            Self::MissingParameter => -109,
            Self::UndefinedHeader => -113,
            Self::HeaderSuffixOutOfRange => -114,
            Self::DataOutOfRange => -222,
            Self::TooMuchData => -223,
            Self::IllegalParameterValue => -224,
            Self::QueueOverflow => -350,
            Self::InputBufferOverrun => -363,
            Self::Custom { code, .. } => *code,
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoError => "No error",
            Self::InvalidCharacter => "Invalid character",
            Self::SyntaxError => "Syntax error",
            Self::DataTypeError => "Data type error",
            Self::ParameterNotAllowed => "Parameter not allowed",
            Self::MissingParameter => "Missing parameter",
            Self::UndefinedHeader => "Undefined header",
            Self::HeaderSuffixOutOfRange => "Header suffix out of range",
            Self::DataOutOfRange => "Data out of range",
            Self::TooMuchData => "Too much data",
            Self::IllegalParameterValue => "Illegal parameter value",
            Self::QueueOverflow => "Queue overflow",
            Self::InputBufferOverrun => "Input buffer overrun",
            Self::Custom { message, .. } => message,
        }
    }

    /// Event Status Register bit raised when this error is queued.
    pub fn esr_bit(&self) -> u8 {
        use super::status::esr;
        match self.code() {
            0 => 0,
            -199..=-100 => esr::CME,
            -299..=-200 => esr::EXE,
            -499..=-400 => esr::QYE,
            _ => esr::DDE,
        }
    }
}

impl fmt::Display for ScpiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},\"{}\"", self.code(), self.message())
    }
}

/// Malformed command pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternError {
    Empty,
    /// `[` without `]`, nested brackets, or a stray `]`.
    UnbalancedBracket,
    /// `::`, or a separator with no node on one side.
    EmptyNode,
    TooManyNodes,
    /// `?` anywhere but the end.
    MisplacedQuery,
}

/// Command table rejected an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    Pattern(PatternError),
    Full,
}

impl From<PatternError> for TableError {
    fn from(e: PatternError) -> Self {
        TableError::Pattern(e)
    }
}
