//! Command line parser
//!
//! `<header>[<ws><param>{,<param>}]`, one command per line.

use super::error::ScpiError;

/// Line split into header token and parameter text.
#[derive(Debug, Clone)]
pub struct ParsedLine<'a> {
    /// Command token, up to the first whitespace
    pub header: &'a str,
    pub params: Params<'a>,
}

/// Split a line into header and parameters.
pub fn parse_line(line: &str) -> ParsedLine<'_> {
    let line = line.trim();
    let (header, rest) = match line.find(|c: char| c.is_ascii_whitespace()) {
        Some(i) => (&line[..i], &line[i..]),
        None => (line, ""),
    };
    ParsedLine {
        header,
        params: Params::new(rest),
    }
}

/// Comma-separated parameter cursor.
#[derive(Debug, Clone)]
pub struct Params<'a> {
    rest: &'a str,
    /// A comma was consumed, so another parameter must follow.
    need_more: bool,
}

impl<'a> Params<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            rest: text.trim(),
            need_more: false,
        }
    }

    /// Unparsed parameter text.
    pub fn remaining(&self) -> &'a str {
        self.rest
    }

    pub fn is_empty(&self) -> bool {
        self.rest.is_empty() && !self.need_more
    }

    /// Next raw parameter, quotes intact.
    pub fn next_raw(&mut self) -> Result<Option<&'a str>, ScpiError> {
        if self.rest.is_empty() {
            return if self.need_more {
                Err(ScpiError::SyntaxError)
            } else {
                Ok(None)
            };
        }

        let mut quote: Option<char> = None;
        let mut end = self.rest.len();
        for (i, c) in self.rest.char_indices() {
            match quote {
                Some(q) if c == q => quote = None,
                Some(_) => {}
                None if c == '"' || c == '\'' => quote = Some(c),
                None if c == ',' => {
                    end = i;
                    break;
                }
                None => {}
            }
        }
        if quote.is_some() {
            return Err(ScpiError::SyntaxError);
        }

        let token = self.rest[..end].trim();
        if end < self.rest.len() {
            self.rest = self.rest[end + 1..].trim_start();
            self.need_more = true;
        } else {
            self.rest = "";
            self.need_more = false;
        }
        if token.is_empty() {
            return Err(ScpiError::SyntaxError);
        }
        Ok(Some(token))
    }

    fn next_required(&mut self, mandatory: bool) -> Result<Option<&'a str>, ScpiError> {
        match self.next_raw()? {
            Some(token) => Ok(Some(token)),
            None if mandatory => Err(ScpiError::MissingParameter),
            None => Ok(None),
        }
    }

    pub fn next_i32(&mut self, mandatory: bool) -> Result<Option<i32>, ScpiError> {
        let Some(token) = self.next_required(mandatory)? else {
            return Ok(None);
        };
        let value = parse_integer(token)?;
        i32::try_from(value).map(Some).map_err(|_| ScpiError::DataOutOfRange)
    }

    /// Integer constrained to `min..=max`.
    pub fn next_ranged(&mut self, mandatory: bool, min: i64, max: i64) -> Result<Option<i64>, ScpiError> {
        let Some(token) = self.next_required(mandatory)? else {
            return Ok(None);
        };
        let value = parse_integer(token)?;
        if value < min || value > max {
            return Err(ScpiError::DataOutOfRange);
        }
        Ok(Some(value))
    }

    pub fn next_f64(&mut self, mandatory: bool) -> Result<Option<f64>, ScpiError> {
        let Some(token) = self.next_required(mandatory)? else {
            return Ok(None);
        };
        if token.starts_with('#') {
            return parse_integer(token).map(|v| Some(v as f64));
        }
        token.parse::<f64>().map(Some).map_err(|_| ScpiError::DataTypeError)
    }

    /// `ON`/`OFF` or numeric (non-zero is true).
    pub fn next_bool(&mut self, mandatory: bool) -> Result<Option<bool>, ScpiError> {
        let Some(token) = self.next_required(mandatory)? else {
            return Ok(None);
        };
        if token.eq_ignore_ascii_case("ON") {
            return Ok(Some(true));
        }
        if token.eq_ignore_ascii_case("OFF") {
            return Ok(Some(false));
        }
        parse_integer(token).map(|v| Some(v != 0))
    }

    /// String or character data. Quotes are stripped; doubled quotes inside
    /// are left as sent.
    pub fn next_str(&mut self, mandatory: bool) -> Result<Option<&'a str>, ScpiError> {
        let Some(token) = self.next_required(mandatory)? else {
            return Ok(None);
        };
        let bytes = token.as_bytes();
        let quoted = bytes.len() >= 2
            && (bytes[0] == b'"' || bytes[0] == b'\'')
            && bytes[bytes.len() - 1] == bytes[0];
        if quoted {
            Ok(Some(&token[1..token.len() - 1]))
        } else {
            Ok(Some(token))
        }
    }

    /// Fail with "Parameter not allowed" if anything is left, or with a
    /// syntax error on a dangling comma.
    pub fn finish(&self) -> Result<(), ScpiError> {
        if !self.rest.is_empty() {
            Err(ScpiError::ParameterNotAllowed)
        } else if self.need_more {
            Err(ScpiError::SyntaxError)
        } else {
            Ok(())
        }
    }
}

/// Decimal or SCPI non-decimal (`#H1F`, `#Q17`, `#B101`) integer.
pub fn parse_integer(token: &str) -> Result<i64, ScpiError> {
    if let Some(rest) = token.strip_prefix('#') {
        let mut chars = rest.chars();
        let radix = match chars.next() {
            Some('H' | 'h') => 16,
            Some('Q' | 'q') => 8,
            Some('B' | 'b') => 2,
            _ => return Err(ScpiError::DataTypeError),
        };
        let digits = chars.as_str();
        if digits.is_empty() {
            return Err(ScpiError::DataTypeError);
        }
        let value = u32::from_str_radix(digits, radix).map_err(|_| ScpiError::DataTypeError)?;
        return Ok(i64::from(value));
    }
    token.parse::<i64>().map_err(|_| ScpiError::DataTypeError)
}
