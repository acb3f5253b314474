// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Miniapp probe: answers method calls against the desktop stub bridge.
//
// Entry point. Initialises logging, builds the plugin, then either answers a
// single call given on the command line or one JSON call per stdin line.
// Responses go to stdout as JSON; logs go to stderr.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use miniapp_bridge::executor::InlineExecutor;
use miniapp_bridge::permissions::TracingSink;
use miniapp_bridge::stub::{StubBridge, StubProfile, StubSurface};
use miniapp_bridge::MiniappPlugin;
use miniapp_core::error::Result;
use miniapp_core::{BridgeConfig, MethodCall, MethodResponse, MiniappError, Value};

#[derive(Parser)]
#[command(name = "miniapp-probe")]
#[command(about = "Answer Miniapp method calls against the desktop stub bridge")]
#[command(version)]
struct Cli {
    /// Bridge config file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run without an attached UI surface
    #[arg(long)]
    detached: bool,

    /// Pretend the device has a vibrator
    #[arg(long)]
    vibrator: bool,

    /// Method to call. Without it, calls are read from stdin, one JSON
    /// object per line: {"method": "...", "arguments": {...}}
    method: Option<String>,

    /// JSON arguments for METHOD
    arguments: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "probe failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::default(),
    };

    let bridge = StubBridge::with_profile(StubProfile {
        has_vibrator: cli.vibrator,
        ..StubProfile::default()
    });
    let plugin = MiniappPlugin::new(
        bridge,
        Arc::new(InlineExecutor),
        Arc::new(TracingSink),
        config,
    );
    if !cli.detached {
        plugin.on_attached_to_activity(StubSurface::new("probe"));
    }

    let mut out = std::io::stdout().lock();

    if let Some(method) = cli.method {
        let arguments = match cli.arguments.as_deref() {
            Some(json) => serde_json::from_str::<Value>(json)?,
            None => Value::Null,
        };
        let response = plugin.on_method_call(&MethodCall::new(method, arguments));
        return write_response(&mut out, &response);
    }

    for line in std::io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<MethodCall>(&line) {
            Ok(call) => plugin.on_method_call(&call),
            Err(e) => MethodResponse::from(MiniappError::from(e)),
        };
        write_response(&mut out, &response)?;
    }
    Ok(())
}

fn write_response(out: &mut impl Write, response: &MethodResponse) -> Result<()> {
    serde_json::to_writer(&mut *out, response)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
