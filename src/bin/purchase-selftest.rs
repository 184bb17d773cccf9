//! Runs the built-in purchase test suite against the simulated store.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin purchase-selftest
//! cargo run --bin purchase-selftest -- --config selftest.toml --json
//! ```
//!
//! Exits with failure if any test failed.

use std::process::ExitCode;

use anyhow::Context;
use purchase_kit::prelude::*;

struct Args {
    config: Option<String>,
    json: bool,
}

fn parse_args() -> anyhow::Result<Option<Args>> {
    let mut args = std::env::args().skip(1);
    let mut parsed = Args {
        config: None,
        json: false,
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(None),
            "--json" => parsed.json = true,
            "--config" => {
                let path = args.next().context("--config requires a path")?;
                parsed.config = Some(path);
            }
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }
    Ok(Some(parsed))
}

fn print_help() {
    println!("purchase-selftest - run the purchase test suite");
    println!();
    println!("USAGE:");
    println!("    purchase-selftest [--config <path>] [--json]");
    println!();
    println!("OPTIONS:");
    println!("    --config <path>  Controller configuration (TOML)");
    println!("    --json           Print the summary as JSON on stdout");
    println!("    -h, --help       Print this help");
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let Some(args) = parse_args()? else {
        print_help();
        return Ok(ExitCode::SUCCESS);
    };

    let config = match &args.config {
        Some(path) => ControllerConfig::load(path)
            .with_context(|| format!("loading configuration from {path}"))?,
        None => ControllerConfig::default(),
    };
    tracing::info!(
        timeout = ?config.test_timeout,
        byte_order = %ByteOrder::configured(),
        "purchase self-test starting"
    );

    // Keep stdout clean for the JSON summary.
    let screen: Box<dyn ResultScreen> = if args.json {
        Box::new(ConsoleScreen::new(std::io::stderr()))
    } else {
        Box::new(ConsoleScreen::stdout())
    };

    let mut controller = TestController::with_default_suite(screen, config);
    let summary = controller.run().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    if summary.all_passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
