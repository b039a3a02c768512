//! Integration tests for smplog.
//!
//! These exercise the public surface end to end:
//! - Logger construction, tags and payload merging
//! - Environment layering
//! - Console installation stacks
//! - Cyclic payloads and faults
//! - The `log` bridge on the global console

use std::io;
use std::sync::{Arc, Mutex};

use smplog::console::{Bindings, ConsolePort};
use smplog::testing::CaptureOutput;
use smplog::{
    Arg, EnvConfig, Fault, Fields, Logger, LoggerBuilder, Options, Record, Severity, Shared,
    Threshold, Value, args, fields,
};

fn quiet_env() -> EnvConfig {
    EnvConfig::default()
}

fn env(pairs: &[(&str, &str)]) -> EnvConfig {
    let pairs: Vec<(String, String)> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    EnvConfig::from_lookup(move |key| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    })
}

fn builder(out: &CaptureOutput) -> LoggerBuilder {
    Logger::builder()
        .env(quiet_env())
        .color(false)
        .output(out.clone())
}

// ============================================================================
// Logging Pipeline
// ============================================================================

#[test]
fn warn_threshold_filters_info() {
    let out = CaptureOutput::new();
    let log = builder(&out).level("warn").build();

    log.info(("x", fields! { "v" => 1 })).unwrap();
    assert!(out.is_empty());

    log.warn(("y", fields! { "v" => 2 })).unwrap();
    assert_eq!(out.stderr(), vec![r#"[warn]  y smplog::{"v":2}"#]);
    assert!(out.stdout().is_empty());
}

#[test]
fn default_tags_are_merged_into_every_line() {
    let out = CaptureOutput::new();
    let log = builder(&out).tags(fields! { "env" => "prod" }).build();

    log.error(("boom", fields! { "code" => 500 })).unwrap();
    log.info("plain").unwrap();

    assert_eq!(
        out.lines(),
        vec![
            r#"[error] boom smplog::{"env":"prod","code":500}"#,
            r#"[info]  plain smplog::{"env":"prod"}"#,
        ]
    );
}

#[test]
fn create_takes_resolved_options() {
    let out = CaptureOutput::new();
    let options = Logger::builder()
        .env(quiet_env())
        .threshold(Threshold::Off)
        .output(out.clone())
        .build()
        .options()
        .clone();
    let log = smplog::create(Fields::new(), options);
    log.error("never").unwrap();
    assert!(out.is_empty());

    let default = smplog::create(fields! { "k" => 1 }, Options::default());
    assert_eq!(default.threshold(), Threshold::Level(Severity::Info));
}

#[test]
fn printf_arguments_and_payload() {
    let out = CaptureOutput::new();
    let log = builder(&out).build();

    log.info(args!["%s took %dms", "GET /", 12, fields! { "status" => 200 }])
        .unwrap();
    log.info(args!["%d%% done", 50]).unwrap();
    log.info(args!["extra", 1, true]).unwrap();

    assert_eq!(
        out.stdout(),
        vec![
            r#"[info]  GET / took 12ms smplog::{"status":200}"#,
            "[info]  50% done",
            "[info]  extra 1 true",
        ]
    );
}

#[test]
fn mapping_consumed_by_placeholder_is_not_payload() {
    let out = CaptureOutput::new();
    let log = builder(&out).build();
    log.info(args!["got %j", fields! { "a" => 1 }]).unwrap();
    assert_eq!(out.stdout(), vec![r#"[info]  got {"a":1}"#]);
}

#[test]
fn fault_argument_lands_in_payload() {
    let out = CaptureOutput::new();
    let log = builder(&out).build();

    let err = io::Error::new(io::ErrorKind::NotFound, "config.toml missing");
    log.error(Arg::fault(&err)).unwrap();
    log.warn(Fault::new("DeprecationWarning", "old api")).unwrap();

    assert_eq!(
        out.stderr(),
        vec![
            r#"[error] Error: config.toml missing smplog::{"error":{"name":"Error","message":"config.toml missing"}}"#,
            r#"[warn]  DeprecationWarning: old api smplog::{"warning":{"name":"DeprecationWarning","message":"old api"}}"#,
        ]
    );
}

#[test]
fn cyclic_payload_renders() {
    let out = CaptureOutput::new();
    let log = builder(&out).build();

    let node = Shared::new(fields! { "name" => "loop" });
    node.insert("me", node.clone());
    log.warn(("cycle", fields! { "obj" => node.clone() })).unwrap();

    assert_eq!(
        out.stderr(),
        vec![r#"[warn]  cycle smplog::{"obj":{"name":"loop","me":"[Circular ~.obj]"}}"#]
    );
}

#[test]
fn colors_are_ansi_and_strip_to_plain_text() {
    let out = CaptureOutput::new();
    let log = Logger::builder()
        .env(quiet_env())
        .color(true)
        .output(out.clone())
        .build();
    log.error(("red", fields! { "k" => 1 })).unwrap();

    assert!(out.raw_output()[0].contains('\u{1b}'));
    assert_eq!(out.stderr(), vec![r#"[error] red smplog::{"k":1}"#]);
}

#[test]
fn timestamps_prefix_lines() {
    let out = CaptureOutput::new();
    let log = builder(&out).timestamps(true).build();
    log.info("stamped").unwrap();
    assert!(out.matches(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}Z \[info\]  stamped$"));
}

#[test]
fn timekey_replays_historic_records() {
    let out = CaptureOutput::new();
    let log = builder(&out).timestamps(true).meta(false).timekey("ts").build();
    log.info(("replayed", fields! { "ts" => 1_000_000_000_000_i64 }))
        .unwrap();
    assert_eq!(out.stdout(), vec!["2001-09-09T01:46:40.000Z [info]  replayed"]);
}

#[test]
fn interceptor_rewrites_records() {
    let out = CaptureOutput::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let log = builder(&out)
        .tags(fields! { "svc" => "api" })
        .interceptor(move |record: Record, writer| {
            sink.lock().unwrap().push(record.severity);
            let mut payload = record.payload.clone();
            payload.remove("secret");
            writer.write(Record { payload, ..record })
        })
        .build();

    log.debug("below threshold").unwrap();
    log.warn(("login", fields! { "user" => "ann", "secret" => "hunter2" }))
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![Severity::Debug, Severity::Warn]);
    assert_eq!(
        out.stderr(),
        vec![r#"[warn]  login smplog::{"svc":"api","user":"ann"}"#]
    );
}

#[test]
fn interceptor_can_defer_writes() {
    let out = CaptureOutput::new();
    let pending = Arc::new(Mutex::new(Vec::new()));
    let queue = Arc::clone(&pending);
    let log = builder(&out)
        .interceptor(move |record, writer| {
            queue.lock().unwrap().push((record, writer));
            Ok(())
        })
        .build();

    log.warn(("later", fields! { "n" => 1 })).unwrap();
    assert!(out.is_empty());

    let queued: Vec<_> = pending.lock().unwrap().drain(..).collect();
    let handle = std::thread::spawn(move || {
        for (record, writer) in queued {
            writer.write(record).unwrap();
        }
    });
    handle.join().unwrap();

    assert_eq!(out.stderr(), vec![r#"[warn]  later smplog::{"n":1}"#]);
}

// ============================================================================
// Environment
// ============================================================================

#[test]
fn environment_sets_defaults() {
    let out = CaptureOutput::new();
    let log = Logger::builder()
        .env(env(&[
            ("SMPLOG_LEVEL", "error"),
            ("SMPLOG_COLORS", "false"),
            ("SMPLOG_META", "false"),
        ]))
        .output(out.clone())
        .build();

    log.warn("hidden").unwrap();
    log.error(("shown", fields! { "k" => 1 })).unwrap();
    assert_eq!(out.raw_output(), vec!["[error] shown"]);
}

#[test]
fn explicit_level_beats_environment_but_meta_kill_switch_holds() {
    let out = CaptureOutput::new();
    let log = Logger::builder()
        .env(env(&[("SMPLOG_LEVEL", "none"), ("SMPLOG_META", "false")]))
        .level("debug")
        .meta(true)
        .color(false)
        .output(out.clone())
        .build();

    log.debug(("visible", fields! { "k" => 1 })).unwrap();
    assert_eq!(out.stderr(), vec!["[debug] visible"]);
}

#[test]
fn empty_environment_level_keeps_default() {
    let out = CaptureOutput::new();
    let log = Logger::builder()
        .env(env(&[("SMPLOG_LEVEL", "  ")]))
        .color(false)
        .output(out.clone())
        .build();

    log.debug("hidden").unwrap();
    log.info("shown").unwrap();
    assert_eq!(out.lines(), vec!["[info]  shown"]);
}

#[test]
fn level_none_silences_everything() {
    let out = CaptureOutput::new();
    let log = Logger::builder()
        .env(env(&[("SMPLOG_LEVEL", "none")]))
        .output(out.clone())
        .build();
    for severity in Severity::ALL {
        log.emit(severity, "quiet").unwrap();
    }
    assert!(out.is_empty());
}

// ============================================================================
// Console Installation
// ============================================================================

fn private_port() -> (ConsolePort, CaptureOutput) {
    let plain = CaptureOutput::new();
    (ConsolePort::new(Bindings::plain(plain.clone())), plain)
}

#[test]
fn install_stack_discipline() {
    let (port, plain) = private_port();
    let out_a = CaptureOutput::new();
    let out_b = CaptureOutput::new();
    let a = builder(&out_a).tag("who", "a").build();
    let b = builder(&out_b).tag("who", "b").build();

    a.install_on(&port);
    b.install_on(&port);
    port.info("one").unwrap();

    b.uninstall_from(&port);
    port.info("two").unwrap();

    a.uninstall_from(&port);
    port.info("three").unwrap();

    assert_eq!(out_b.stdout(), vec![r#"[info]  one smplog::{"who":"b"}"#]);
    assert_eq!(out_a.stdout(), vec![r#"[info]  two smplog::{"who":"a"}"#]);
    assert_eq!(plain.stdout(), vec!["three"]);
}

#[test]
fn console_log_method_is_info() {
    let (port, _plain) = private_port();
    let out = CaptureOutput::new();
    let log = builder(&out).build();
    log.install_on(&port);
    port.log(("hello", fields! { "n" => 1 })).unwrap();
    port.debug("filtered").unwrap();
    assert_eq!(out.lines(), vec![r#"[info]  hello smplog::{"n":1}"#]);
}

#[test]
fn global_console_and_log_bridge() {
    let out = CaptureOutput::new();
    let log = builder(&out).level("debug").tag("svc", "bridge").build();

    smplog::bridge::try_init();
    log.install();
    smplog::console::info("direct").unwrap();
    log::warn!("via facade {}", 42);
    log.uninstall();

    out.assert_contains(r#"[info]  direct smplog::{"svc":"bridge"}"#);
    out.assert_contains(r#"[warn]  via facade 42 smplog::{"svc":"bridge"}"#);
    assert!(ConsolePort::global().is_pristine());
}

// ============================================================================
// Values
// ============================================================================

#[test]
fn field_assignments_parse_json_or_fall_back_to_text() {
    assert_eq!(
        Fields::parse_assignment("count=3").unwrap(),
        ("count".to_string(), Value::Int(3))
    );
    assert_eq!(
        Fields::parse_assignment("name=ann").unwrap(),
        ("name".to_string(), Value::from("ann"))
    );
    assert!(Fields::parse_assignment("novalue").is_err());
}
