//! IEEE 488.2 status register tests

use openawg_scpi::config::ServerConfig;
use openawg_scpi::scpi::status::{esr, stb};
use openawg_scpi::scpi::{Identity, Server};

fn server() -> Server<()> {
    let id = Identity::new("AcmeCo", "AWG-1", "DEADBEEF", "1.0.0");
    Server::with_builtins(id, (), ServerConfig::default()).unwrap()
}

fn query(s: &mut Server<()>, line: &str) -> String {
    s.execute(line);
    s.response().to_string()
}

#[test]
fn test_esr_read_clears() {
    let mut s = server();
    s.execute("BOGUS");
    assert_eq!(query(&mut s, "*ESR?"), esr::CME.to_string());
    assert_eq!(query(&mut s, "*ESR?"), "0");
}

#[test]
fn test_error_classes_set_esr_bits() {
    let mut s = server();
    s.execute("*ESE 300");
    s.execute("BOGUS");
    assert_eq!(query(&mut s, "*ESR?"), (esr::EXE | esr::CME).to_string());
}

#[test]
fn test_opc_sets_operation_complete() {
    let mut s = server();
    s.execute("*OPC");
    assert_eq!(query(&mut s, "*ESR?"), esr::OPC.to_string());
}

#[test]
fn test_status_byte_summaries() {
    let mut s = server();
    assert_eq!(query(&mut s, "*STB?"), "0");

    s.execute("BOGUS");
    assert_eq!(query(&mut s, "*STB?"), stb::EAV.to_string());

    s.execute("*ESE 32");
    assert_eq!(query(&mut s, "*STB?"), (stb::EAV | stb::ESB).to_string());

    s.execute("*SRE 32");
    assert_eq!(query(&mut s, "*STB?"), (stb::EAV | stb::ESB | stb::MSS).to_string());
    assert_eq!(query(&mut s, "*SRE?"), "32");
}

#[test]
fn test_sre_ignores_bit_six() {
    let mut s = server();
    s.execute("*SRE 255");
    assert_eq!(query(&mut s, "*SRE?"), (255 & !stb::MSS).to_string());
}

#[test]
fn test_cls_clears_events_and_errors() {
    let mut s = server();
    s.execute("*ESE 32");
    s.execute("BOGUS");
    s.execute("BOGUS");
    s.execute("*CLS");

    assert_eq!(query(&mut s, "SYST:ERR:COUN?"), "0");
    assert_eq!(query(&mut s, "*ESR?"), "0");
    assert_eq!(query(&mut s, "*STB?"), "0");
    // Enables survive
    assert_eq!(query(&mut s, "*ESE?"), "32");
}

#[test]
fn test_questionable_group() {
    let mut s = server();
    s.status_mut().questionable.set_condition(0b0110);

    assert_eq!(query(&mut s, "STAT:QUES:COND?"), "6");
    assert_eq!(query(&mut s, "STAT:QUES?"), "6");
    assert_eq!(query(&mut s, "STATus:QUEStionable:EVENt?"), "0");
    assert_eq!(query(&mut s, "STAT:QUES:COND?"), "6");

    s.execute("STAT:QUES:ENAB 4");
    assert_eq!(query(&mut s, "STAT:QUES:ENAB?"), "4");
    s.status_mut().questionable.set_condition(0b0000);
    s.status_mut().questionable.set_condition(0b0100);
    assert_eq!(query(&mut s, "*STB?"), stb::QES.to_string());
}

#[test]
fn test_operation_group_and_preset() {
    let mut s = server();
    s.execute("STAT:OPER:ENAB #H8000");
    assert_eq!(query(&mut s, "STAT:OPER:ENAB?"), "32768");
    s.status_mut().operation.set_condition(0x8000);
    assert_eq!(query(&mut s, "*STB?"), stb::OSS.to_string());
    assert_eq!(query(&mut s, "STAT:OPER:COND?"), "32768");

    s.execute("STAT:PRES");
    assert_eq!(query(&mut s, "STAT:OPER:ENAB?"), "0");
    assert_eq!(query(&mut s, "STAT:OPER?"), "32768");
    assert_eq!(query(&mut s, "STAT:OPER?"), "0");
}

#[test]
fn test_enable_range_checked() {
    let mut s = server();
    s.execute("STAT:QUES:ENAB 70000");
    assert_eq!(query(&mut s, "SYST:ERR?"), "-222,\"Data out of range\"");
    assert_eq!(query(&mut s, "STAT:QUES:ENAB?"), "0");
}
