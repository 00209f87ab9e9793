#![allow(non_snake_case)]

use super::*;
use test_case::test_case;

#[test]
fn LogLevel___ordering___trace_less_than_debug() {
    assert!(LogLevel::Trace < LogLevel::Debug);
}

#[test]
fn LogLevel___ordering___error_less_than_off() {
    assert!(LogLevel::Error < LogLevel::Off);
}

#[test_case(0, LogLevel::Trace)]
#[test_case(1, LogLevel::Debug)]
#[test_case(2, LogLevel::Info)]
#[test_case(3, LogLevel::Warn)]
#[test_case(4, LogLevel::Error)]
#[test_case(5, LogLevel::Off)]
#[test_case(100, LogLevel::Off)]
fn LogLevel___from_u8___maps_value(value: u8, expected: LogLevel) {
    assert_eq!(LogLevel::from_u8(value), expected);
}

#[test_case("trace", Some(LogLevel::Trace))]
#[test_case("DEBUG", Some(LogLevel::Debug))]
#[test_case(" info ", Some(LogLevel::Info))]
#[test_case("warning", Some(LogLevel::Warn))]
#[test_case("error", Some(LogLevel::Error))]
#[test_case("off", Some(LogLevel::Off))]
#[test_case("verbose", None)]
fn LogLevel___parse___recognizes_names(name: &str, expected: Option<LogLevel>) {
    assert_eq!(LogLevel::parse(name), expected);
}

#[test]
fn LogLevel___display___uppercase_name() {
    assert_eq!(LogLevel::Info.to_string(), "INFO");
    assert_eq!(LogLevel::Warn.to_string(), "WARN");
}

#[test]
fn LogLevel___as_str___accepted_by_parse() {
    for value in 0..=5 {
        let level = LogLevel::from_u8(value);
        assert_eq!(LogLevel::parse(level.as_str()), Some(level));
    }
}
