//! Pattern parsing, header matching and table resolution tests

use openawg_scpi::scpi::{CommandTable, Context, Handler, Header, Pattern, PatternError, ScpiError, TableError};

fn matches(pattern: &'static str, input: &str) -> bool {
    let p = Pattern::parse(pattern).unwrap();
    Header::parse(input).is_some_and(|h| p.matches(&h).is_some())
}

fn nop(_ctx: &mut Context<'_, ()>) -> Result<(), ScpiError> {
    Ok(())
}

#[test]
fn test_short_and_long_forms() {
    for input in ["SYST:ERR?", "SYSTEM:ERROR?", "syst:err?", "System:Error?", "SYST:ERR:NEXT?", "system:error:next?"] {
        assert!(matches("SYSTem:ERRor[:NEXT]?", input), "{} should match", input);
    }
}

#[test]
fn test_rejects_misspelled_and_partial() {
    for input in ["SYSX:ERR?", "SYS:ERR?", "SYSTEMS:ERR?", "SYST:ERR", "SYST?", "SYST:ERR:NEXT:MORE?"] {
        assert!(!matches("SYSTem:ERRor[:NEXT]?", input), "{} should not match", input);
    }
}

#[test]
fn test_abbreviation_must_continue_long_form() {
    assert!(matches("FREQuency?", "freq?"));
    assert!(matches("FREQuency?", "FREQuen?"));
    assert!(matches("FREQuency?", "FREQUENCY?"));
    assert!(!matches("FREQuency?", "FREQX?"));
    // Continuation past the short form is compared exactly
    assert!(!matches("FREQuency?", "FREQUEN?"));
}

#[test]
fn test_leading_colon_allowed() {
    assert!(matches("STATus:PRESet", ":STAT:PRES"));
}

#[test]
fn test_optional_in_middle() {
    assert!(matches("STATus:QUEStionable[:EVENt]?", "STAT:QUES?"));
    assert!(matches("STATus:QUEStionable[:EVENt]?", "STAT:QUES:EVEN?"));
    assert!(!matches("STATus:QUEStionable[:EVENt]?", "STAT:EVEN?"));
    assert!(matches("[SOURce]:FREQuency", "FREQ"));
    assert!(matches("[SOURce]:FREQuency", "SOUR:FREQ"));
}

#[test]
fn test_numeric_suffix_captured() {
    let p = Pattern::parse("OUTPut#:STATe").unwrap();
    assert_eq!(p.suffix_slots(), 1);

    let m = p.matches(&Header::parse("OUTP3:STAT").unwrap()).unwrap();
    assert_eq!(m.suffixes.as_slice(), &[3]);

    let m = p.matches(&Header::parse("OUTPUT:STAT").unwrap()).unwrap();
    assert_eq!(m.suffixes.as_slice(), &[1]);

    assert!(p.matches(&Header::parse("OUTP0:STAT").unwrap()).is_none());
}

#[test]
fn test_common_commands() {
    assert!(matches("*IDN?", "*idn?"));
    assert!(!matches("*IDN?", "*IDN"));
    assert!(!matches("*RST", "*RST?"));
}

#[test]
fn test_bad_patterns_rejected() {
    assert_eq!(Pattern::parse(""), Err(PatternError::Empty));
    assert_eq!(Pattern::parse("SYST:[ERR"), Err(PatternError::UnbalancedBracket));
    assert_eq!(Pattern::parse("SYST::ERR"), Err(PatternError::EmptyNode));
    assert_eq!(Pattern::parse("SYST?:ERR"), Err(PatternError::MisplacedQuery));
    assert_eq!(Pattern::parse("A:B:C:D:E:F:G:H:I"), Err(PatternError::TooManyNodes));
}

#[test]
fn test_header_parse_rejects_empty_nodes() {
    assert!(Header::parse("SYST::ERR?").is_none());
    assert!(Header::parse(":").is_none());
    assert!(Header::parse("SYST?:ERR").is_none());
    let h = Header::parse("SYST:ERR?").unwrap();
    assert!(h.query);
    assert_eq!(h.nodes.as_slice(), &["SYST", "ERR"]);
}

#[test]
fn test_builtin_table_resolves_all_required_commands() {
    let table = CommandTable::<()>::with_builtins().unwrap();
    for input in [
        "*CLS", "*ESE", "*ESE?", "*ESR?", "*IDN?", "*OPC", "*OPC?", "*RST", "*SRE", "*SRE?", "*STB?",
        "*TST?", "*WAI", "SYST:ERR?", "SYST:ERR:COUN?", "SYST:VERS?", "STAT:QUES?", "STAT:QUES:ENAB",
        "STAT:QUES:ENAB?", "STAT:OPER?", "STAT:OPER:COND?", "STAT:PRES",
    ] {
        let header = Header::parse(input).unwrap();
        assert!(table.resolve(&header).is_some(), "{} unresolved", input);
    }
}

#[test]
fn test_fewest_skipped_optional_wins() {
    let mut table = CommandTable::<()>::new();
    table.register_custom("SOURce:FREQuency[:CW]?", nop).unwrap();
    table.register_custom("SOURce[:FREQuency]?", nop).unwrap();

    // Both match; the second skips nothing
    let header = Header::parse("SOUR:FREQ?").unwrap();
    assert_eq!(table.resolve(&header).unwrap().index, 1);

    let header = Header::parse("SOUR:FREQ:CW?").unwrap();
    assert_eq!(table.resolve(&header).unwrap().index, 0);
}

#[test]
fn test_table_order_breaks_ties() {
    let mut table = CommandTable::<()>::new();
    table.register_custom("MEASure:VOLTage?", nop).unwrap();
    table.register_custom("MEASure:VOLTage?", nop).unwrap();
    let header = Header::parse("MEAS:VOLT?").unwrap();
    assert_eq!(table.resolve(&header).unwrap().index, 0);
}

#[test]
fn test_table_full() {
    let mut table = CommandTable::<()>::new();
    let mut result = Ok(());
    for _ in 0..100 {
        result = table.register("DUMMy", Handler::Custom(nop));
        if result.is_err() {
            break;
        }
    }
    assert_eq!(result, Err(TableError::Full));
}

#[test]
fn test_register_rejects_bad_pattern() {
    let mut table = CommandTable::<()>::new();
    assert_eq!(
        table.register_custom("BAD[", nop),
        Err(TableError::Pattern(PatternError::UnbalancedBracket))
    );
    assert!(table.is_empty());
}
