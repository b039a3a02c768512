//! smplog CLI - log a message, or every line of stdin, through smplog.
//!
//! ```text
//! smplog -s warn -t svc=api -f ms=900 "slow request"
//! tail -f app.log | smplog -s debug
//! producer | smplog --json --timekey ts
//! ```
//!
//! `SMPLOG_*` environment variables apply; flags override them.

#![forbid(unsafe_code)]

use std::io::{self, BufRead};
use std::process::ExitCode;

use clap::Parser;

use smplog::{Fields, Logger, Severity, Value};

/// Log lines with smplog's format.
#[derive(Parser, Debug)]
#[command(name = "smplog")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Message to log. Without one, each stdin line is logged.
    message: Vec<String>,

    /// Severity of the logged lines (debug, info, warn, error).
    #[arg(long, short = 's', default_value = "info")]
    severity: Severity,

    /// Minimum severity written (debug, info, warn, error, none).
    #[arg(long, short = 'l')]
    level: Option<String>,

    /// Default tag (KEY=VALUE, VALUE parsed as JSON when possible).
    #[arg(long = "tag", short = 't', value_parser = parse_field)]
    tags: Vec<(String, Value)>,

    /// Payload field (KEY=VALUE, VALUE parsed as JSON when possible).
    #[arg(long = "field", short = 'f', value_parser = parse_field)]
    fields: Vec<(String, Value)>,

    /// Prefix lines with an ISO-8601 timestamp.
    #[arg(long)]
    timestamps: bool,

    /// Disable ANSI colors.
    #[arg(long)]
    no_color: bool,

    /// Do not print payloads.
    #[arg(long)]
    no_meta: bool,

    /// Payload key holding the record timestamp.
    #[arg(long)]
    timekey: Option<String>,

    /// Treat each stdin line as a JSON object payload; its `msg` string is
    /// the message.
    #[arg(long)]
    json: bool,
}

fn parse_field(raw: &str) -> Result<(String, Value), String> {
    Fields::parse_assignment(raw).map_err(|e| e.to_string())
}

impl Cli {
    fn logger(&self) -> Logger {
        let mut builder = Logger::builder().tags(self.tags.iter().cloned().collect());
        if let Some(level) = &self.level {
            builder = builder.level(level.clone());
        }
        if self.timestamps {
            builder = builder.timestamps(true);
        }
        if self.no_color {
            builder = builder.color(false);
        }
        if self.no_meta {
            builder = builder.meta(false);
        }
        if let Some(key) = &self.timekey {
            builder = builder.timekey(key.clone());
        }
        builder.build()
    }

    fn payload(&self) -> Fields {
        self.fields.iter().cloned().collect()
    }
}

/// Message and payload for one stdin line.
fn parse_line(line: &str, json: bool) -> (String, Fields) {
    if json {
        if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(line) {
            let mut payload = Fields::from(map);
            let message = payload.get("msg").and_then(Value::as_str).map(str::to_string);
            if message.is_some() {
                payload.remove("msg");
            }
            return (message.unwrap_or_default(), payload);
        }
    }
    (line.to_string(), Fields::new())
}

fn run(cli: &Cli) -> smplog::Result<()> {
    let logger = cli.logger();

    if !cli.message.is_empty() {
        return logger
            .event(cli.severity)
            .message(cli.message.join(" "))
            .fields(cli.payload())
            .emit();
    }

    for line in io::stdin().lock().lines() {
        let (message, payload) = parse_line(&line?, cli.json);
        logger
            .event(cli.severity)
            .message(message)
            .fields(cli.payload())
            .fields(payload)
            .emit()?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    smplog::bridge::try_init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("smplog: {e}");
            ExitCode::from(1)
        }
    }
}
