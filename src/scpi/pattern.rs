//! Command pattern parsing and header matching.
//!
//! Patterns use the SCPI notation: `SYSTem:ERRor[:NEXT]?`.
//!
//! - Upper-case prefix of a node is its short form, the whole node its long
//!   form.
//! - `[...]` marks an optional node.
//! - A trailing `#` on a node accepts a numeric suffix (`SOURce#` matches
//!   `SOUR2`, default 1).
//! - A trailing `?` makes the pattern a query.
//!
//! Patterns are parsed once when the table is built; matching walks the
//! node list with backtracking over optional nodes.

use heapless::Vec;

use super::error::PatternError;
use crate::config::MAX_NODES;

/// Suffix assumed when a `#` node is written without digits or skipped.
pub const DEFAULT_SUFFIX: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Node {
    long: &'static str,
    short_len: usize,
    optional: bool,
    suffix: bool,
}

impl Node {
    pub fn long_form(&self) -> &'static str {
        self.long
    }

    pub fn short_form(&self) -> &'static str {
        &self.long[..self.short_len]
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn takes_suffix(&self) -> bool {
        self.suffix
    }

    /// Compare one input node. Returns `None` on mismatch, otherwise whether
    /// the long form was used and the numeric suffix (if this node takes one).
    fn match_token(&self, token: &str) -> Option<(bool, Option<u32>)> {
        let (name, suffix) = if self.suffix {
            let split = token
                .bytes()
                .rposition(|b| !b.is_ascii_digit())
                .map_or(0, |p| p + 1);
            let digits = &token[split..];
            let value = if digits.is_empty() {
                DEFAULT_SUFFIX
            } else {
                match digits.parse::<u32>() {
                    Ok(v) if v > 0 => v,
                    _ => return None,
                }
            };
            (&token[..split], Some(value))
        } else {
            (token, None)
        };

        let long = self.long.as_bytes();
        let short = &long[..self.short_len];
        let input = name.as_bytes();

        if input.eq_ignore_ascii_case(long) {
            return Some((true, suffix));
        }
        if input.len() < short.len() || input.len() > long.len() {
            return None;
        }
        if !input[..short.len()].eq_ignore_ascii_case(short) {
            return None;
        }
        // Past the short form the abbreviation must continue the long form
        // exactly.
        if input[short.len()..] == long[short.len()..input.len()] {
            return Some((false, suffix));
        }
        None
    }
}

/// Successful match of a header against a pattern.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Match {
    /// One entry per `#` node, in pattern order.
    pub suffixes: Vec<u32, MAX_NODES>,
    /// Optional nodes the input left out.
    pub skipped: u8,
    /// Input nodes written in long form.
    pub long_hits: u8,
}

/// Pre-parsed command pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    source: &'static str,
    nodes: Vec<Node, MAX_NODES>,
    query: bool,
}

impl Pattern {
    pub fn parse(source: &'static str) -> Result<Self, PatternError> {
        let (body, query) = match source.strip_suffix('?') {
            Some(body) => (body, true),
            None => (source, false),
        };
        if body.is_empty() {
            return Err(PatternError::Empty);
        }
        if body.contains('?') {
            return Err(PatternError::MisplacedQuery);
        }

        let mut nodes: Vec<Node, MAX_NODES> = Vec::new();
        let mut start: Option<usize> = None;
        let mut in_optional = false;
        let mut group_nodes = 0usize;
        let mut awaiting_node = false;

        for (i, c) in body.char_indices() {
            match c {
                '[' | ']' | ':' => {
                    if let Some(s) = start.take() {
                        push_node(&mut nodes, &body[s..i], in_optional)?;
                        group_nodes += 1;
                        awaiting_node = false;
                    }
                    match c {
                        '[' => {
                            if in_optional {
                                return Err(PatternError::UnbalancedBracket);
                            }
                            in_optional = true;
                            group_nodes = 0;
                        }
                        ']' => {
                            if !in_optional {
                                return Err(PatternError::UnbalancedBracket);
                            }
                            if group_nodes == 0 || awaiting_node {
                                return Err(PatternError::EmptyNode);
                            }
                            in_optional = false;
                        }
                        _ => {
                            if awaiting_node {
                                return Err(PatternError::EmptyNode);
                            }
                            awaiting_node = i != 0 || !nodes.is_empty();
                        }
                    }
                }
                _ => {
                    if start.is_none() {
                        start = Some(i);
                    }
                }
            }
        }

        if in_optional {
            return Err(PatternError::UnbalancedBracket);
        }
        if let Some(s) = start {
            push_node(&mut nodes, &body[s..], false)?;
        } else if awaiting_node {
            return Err(PatternError::EmptyNode);
        }
        if nodes.is_empty() {
            return Err(PatternError::Empty);
        }

        Ok(Self { source, nodes, query })
    }

    pub fn source(&self) -> &'static str {
        self.source
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn is_query(&self) -> bool {
        self.query
    }

    /// Number of `#` nodes.
    pub fn suffix_slots(&self) -> usize {
        self.nodes.iter().filter(|n| n.suffix).count()
    }

    /// Match a parsed input header.
    pub fn matches(&self, header: &Header<'_>) -> Option<Match> {
        if header.query != self.query {
            return None;
        }
        let mut m = Match::default();
        if match_from(&self.nodes, &header.nodes, &mut m) {
            Some(m)
        } else {
            None
        }
    }
}

fn push_node(
    nodes: &mut Vec<Node, MAX_NODES>,
    text: &'static str,
    optional: bool,
) -> Result<(), PatternError> {
    let (long, suffix) = match text.strip_suffix('#') {
        Some(long) => (long, true),
        None => (text, false),
    };
    if long.is_empty() {
        return Err(PatternError::EmptyNode);
    }
    let short_len = long
        .bytes()
        .position(|b| b.is_ascii_lowercase())
        .unwrap_or(long.len());

    nodes
        .push(Node {
            long,
            short_len,
            optional,
            suffix,
        })
        .map_err(|_| PatternError::TooManyNodes)
}

fn match_from(nodes: &[Node], tokens: &[&str], m: &mut Match) -> bool {
    let Some((node, rest)) = nodes.split_first() else {
        return tokens.is_empty();
    };

    let saved = (m.suffixes.len(), m.skipped, m.long_hits);

    if let Some((token, remaining)) = tokens.split_first() {
        if let Some((long, suffix)) = node.match_token(token) {
            if let Some(value) = suffix {
                let _ = m.suffixes.push(value);
            }
            if long {
                m.long_hits += 1;
            }
            if match_from(rest, remaining, m) {
                return true;
            }
            restore(m, saved);
        }
    }

    if node.optional {
        if node.suffix {
            let _ = m.suffixes.push(DEFAULT_SUFFIX);
        }
        m.skipped += 1;
        if match_from(rest, tokens, m) {
            return true;
        }
        restore(m, saved);
    }

    false
}

fn restore(m: &mut Match, (suffixes, skipped, long_hits): (usize, u8, u8)) {
    m.suffixes.truncate(suffixes);
    m.skipped = skipped;
    m.long_hits = long_hits;
}

/// Input header split into nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header<'a> {
    pub nodes: Vec<&'a str, MAX_NODES>,
    pub query: bool,
}

impl<'a> Header<'a> {
    /// Parse the command token of a line (`SYST:ERR?`, `:STAT:PRES`,
    /// `*idn?`). Returns `None` for empty nodes or too many nodes.
    pub fn parse(token: &'a str) -> Option<Self> {
        let (body, query) = match token.strip_suffix('?') {
            Some(body) => (body, true),
            None => (token, false),
        };
        let body = body.strip_prefix(':').unwrap_or(body);
        if body.is_empty() {
            return None;
        }

        let mut nodes = Vec::new();
        for part in body.split(':') {
            if part.is_empty() || part.contains('?') {
                return None;
            }
            nodes.push(part).ok()?;
        }
        Some(Self { nodes, query })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(pattern: &'static str, input: &str) -> Option<Match> {
        let p = Pattern::parse(pattern).unwrap();
        p.matches(&Header::parse(input)?)
    }

    #[test]
    fn test_parse_optional_and_query() {
        let p = Pattern::parse("SYSTem:ERRor[:NEXT]?").unwrap();
        assert!(p.is_query());
        let nodes = p.nodes();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].short_form(), "SYST");
        assert_eq!(nodes[0].long_form(), "SYSTem");
        assert!(!nodes[1].is_optional());
        assert!(nodes[2].is_optional());
        assert_eq!(nodes[2].short_form(), "NEXT");
    }

    #[test]
    fn test_parse_common_command() {
        let p = Pattern::parse("*IDN?").unwrap();
        assert_eq!(p.nodes()[0].short_form(), "*IDN");
    }

    #[test]
    fn test_parse_suffix_node() {
        let p = Pattern::parse("SOURce#:FREQuency").unwrap();
        assert!(p.nodes()[0].takes_suffix());
        assert_eq!(p.nodes()[0].long_form(), "SOURce");
        assert_eq!(p.suffix_slots(), 1);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Pattern::parse(""), Err(PatternError::Empty));
        assert_eq!(Pattern::parse("?"), Err(PatternError::Empty));
        assert_eq!(Pattern::parse("A::B"), Err(PatternError::EmptyNode));
        assert_eq!(Pattern::parse("A[:B"), Err(PatternError::UnbalancedBracket));
        assert_eq!(Pattern::parse("A:B]"), Err(PatternError::UnbalancedBracket));
        assert_eq!(Pattern::parse("A[[:B]]"), Err(PatternError::UnbalancedBracket));
        assert_eq!(Pattern::parse("A?:B"), Err(PatternError::MisplacedQuery));
        assert_eq!(Pattern::parse("A:"), Err(PatternError::EmptyNode));
        assert_eq!(Pattern::parse("A[]"), Err(PatternError::EmptyNode));
        assert_eq!(Pattern::parse("A:B:C:D:E:F:G:H:I"), Err(PatternError::TooManyNodes));
    }

    #[test]
    fn test_short_long_and_case() {
        assert!(hit("SYSTem:ERRor[:NEXT]?", "SYST:ERR?").is_some());
        assert!(hit("SYSTem:ERRor[:NEXT]?", "system:error?").is_some());
        assert!(hit("SYSTem:ERRor[:NEXT]?", "SyStEm:ErRoR:nExT?").is_some());
        assert!(hit("SYSTem:ERRor[:NEXT]?", "SYSX:ERR?").is_none());
        assert!(hit("SYSTem:ERRor[:NEXT]?", "SYS:ERR?").is_none());
    }

    #[test]
    fn test_abbreviation_must_continue_long_form() {
        assert!(hit("SYSTem:VERSion?", "SYSTe:VERS?").is_some());
        assert!(hit("SYSTem:VERSion?", "systE:VERS?").is_none());
        assert!(hit("SYSTem:VERSion?", "SYSTx:VERS?").is_none());
        assert!(hit("SYSTem:VERSion?", "SYSTemx:VERS?").is_none());
    }

    #[test]
    fn test_query_marker_must_agree() {
        assert!(hit("STATus:PRESet", "STAT:PRES?").is_none());
        assert!(hit("*IDN?", "*IDN").is_none());
        assert!(hit("*IDN?", "*idn?").is_some());
    }

    #[test]
    fn test_optional_middle_node_backtracks() {
        let m = hit("STATus:QUEStionable[:EVENt]?", "STAT:QUES?").unwrap();
        assert_eq!(m.skipped, 1);
        let m = hit("STATus:QUEStionable[:EVENt]?", "STATUS:QUES:EVEN?").unwrap();
        assert_eq!(m.skipped, 0);
        assert_eq!(m.long_hits, 1);

        // Leading optional node
        assert!(hit("[SOURce]:FREQuency", "FREQ").is_some());
        assert!(hit("[SOURce]:FREQuency", "SOUR:FREQ").is_some());
        assert!(hit("[SOURce]:FREQuency", "SOUR").is_none());
    }

    #[test]
    fn test_numeric_suffix() {
        let m = hit("OUTPut#:STATe", "OUTP2:STAT").unwrap();
        assert_eq!(m.suffixes.as_slice(), &[2]);
        let m = hit("OUTPut#:STATe", "OUTPUT:STAT").unwrap();
        assert_eq!(m.suffixes.as_slice(), &[DEFAULT_SUFFIX]);
        let m = hit("[SOURce#]:FREQuency", "FREQ").unwrap();
        assert_eq!(m.suffixes.as_slice(), &[DEFAULT_SUFFIX]);
        assert!(hit("OUTPut#:STATe", "OUTP0:STAT").is_none());
        assert!(hit("OUTPut:STATe", "OUTP2:STAT").is_none());
    }

    #[test]
    fn test_header_parse() {
        let h = Header::parse(":SYST:ERR?").unwrap();
        assert!(h.query);
        assert_eq!(h.nodes.as_slice(), &["SYST", "ERR"]);
        assert!(Header::parse("SYST::ERR").is_none());
        assert!(Header::parse("?").is_none());
        assert!(Header::parse("A?B").is_none());
    }
}
