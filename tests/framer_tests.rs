//! Line framing tests

use openawg_scpi::ingest::{FrameEvent, Line, LineFramer};

fn feed_all<const CAP: usize>(framer: &mut LineFramer<CAP>, bytes: &[u8]) -> Vec<Line> {
    let mut lines = Vec::new();
    for &b in bytes {
        if let FrameEvent::Line(line) = framer.feed(b) {
            lines.push(line);
        }
    }
    lines
}

#[test]
fn test_lf_terminates_line() {
    let mut framer: LineFramer = LineFramer::new();
    let lines = feed_all(&mut framer, b"*IDN?\n");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].as_str(), Some("*IDN?"));
    assert!(!lines[0].is_truncated());
    assert!(framer.is_empty());
}

#[test]
fn test_crlf_yields_single_line() {
    let mut framer: LineFramer = LineFramer::new();
    let lines = feed_all(&mut framer, b"*RST\r\n*CLS\r\n");
    let texts: Vec<_> = lines.iter().map(|l| l.as_str().unwrap()).collect();
    assert_eq!(texts, ["*RST", "*CLS"]);
}

#[test]
fn test_empty_lines_ignored() {
    let mut framer: LineFramer = LineFramer::new();
    let lines = feed_all(&mut framer, b"\n\r\n\r\r*OPC?\n\n");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].as_bytes(), b"*OPC?");
}

#[test]
fn test_partial_line_held_until_terminator() {
    let mut framer: LineFramer = LineFramer::new();
    assert!(feed_all(&mut framer, b"SYST:ERR").is_empty());
    assert_eq!(framer.len(), 8);
    let lines = feed_all(&mut framer, b"?\n");
    assert_eq!(lines[0].as_str(), Some("SYST:ERR?"));
}

#[test]
fn test_overflow_keeps_head_and_flags_line() {
    let mut framer = LineFramer::<8>::new();
    assert_eq!(framer.max_line_len(), 7);

    let mut overflow_events = Vec::new();
    for &b in b"ABCDEFGHIJ" {
        if let FrameEvent::Overflow { dropped } = framer.feed(b) {
            overflow_events.push(dropped);
        }
    }
    assert_eq!(overflow_events, [1, 2, 3]);

    match framer.feed(b'\n') {
        FrameEvent::Line(line) => {
            assert_eq!(line.as_bytes(), b"ABCDEFG");
            assert!(line.is_truncated());
        }
        other => panic!("expected line, got {:?}", other),
    }

    // Next line starts clean
    let lines = feed_all(&mut framer, b"*WAI\n");
    assert!(!lines[0].is_truncated());
}

#[test]
fn test_line_at_capacity_not_truncated() {
    let mut framer = LineFramer::<8>::new();
    let lines = feed_all(&mut framer, b"1234567\n");
    assert_eq!(lines[0].len(), 7);
    assert!(!lines[0].is_truncated());
}

#[test]
fn test_clear_discards_partial() {
    let mut framer: LineFramer = LineFramer::new();
    feed_all(&mut framer, b"garbage");
    framer.clear();
    let lines = feed_all(&mut framer, b"*TST?\n");
    assert_eq!(lines[0].as_str(), Some("*TST?"));
}

#[test]
fn test_non_utf8_line_has_no_text() {
    let mut framer: LineFramer = LineFramer::new();
    let lines = feed_all(&mut framer, &[0xFF, 0xFE, b'\n']);
    assert_eq!(lines[0].as_str(), None);
    assert_eq!(lines[0].as_bytes(), &[0xFF, 0xFE]);
}

#[test]
fn test_line_new_rejects_bad_text() {
    assert!(Line::new("").is_none());
    assert!(Line::new("A\nB").is_none());
    assert!(Line::new(&"X".repeat(300)).is_none());
    assert_eq!(Line::new("*IDN?").unwrap().as_str(), Some("*IDN?"));
}
