//! Skele: compute unique passwords per service and user from one skeleton key
//!
//! Nothing is stored. The same skeleton key, service name and user name
//! always give the same passwords.
//!
//! # Usage
//!
//! ```bash
//! skele                        # interactive session, 5 keys per request
//! skele --count 3 --fingerprint
//! skele --config ~/.config/skele.toml
//! ```

mod config;
mod session;

use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;

use session::{SessionEnd, SessionOptions, TerminalPrompter};

#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    config_path: Option<PathBuf>,
    key_count: Option<usize>,
    show_fingerprint: bool,
}

enum Command {
    Run(Args),
    Help,
    Version,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Command> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a path argument"))?;
                parsed.config_path = Some(PathBuf::from(path));
            }
            "--count" | "-n" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--count requires a number"))?;
                let count = value
                    .parse()
                    .with_context(|| format!("Invalid key count: {}", value))?;
                parsed.key_count = Some(count);
            }
            "--fingerprint" => {
                parsed.show_fingerprint = true;
            }
            "--help" | "-h" => return Ok(Command::Help),
            "--version" | "-V" => return Ok(Command::Version),
            other => {
                anyhow::bail!("Unknown argument: {}", other);
            }
        }
    }

    Ok(Command::Run(parsed))
}

fn load_config(args: &Args) -> Result<config::Config> {
    let mut config = match &args.config_path {
        Some(path) => config::Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => config::Config::default(),
    };

    config.apply_env_overrides();

    if let Some(count) = args.key_count {
        config.derivation.key_count = count;
    }
    if args.show_fingerprint {
        config.display.show_fingerprint = true;
    }

    config
        .validate()
        .context("Configuration validation failed")?;
    Ok(config)
}

fn main() -> Result<()> {
    // Keep the skeleton key out of core files
    skele_core::memory::disable_core_dumps();

    let args = match parse_args(std::env::args().skip(1))? {
        Command::Run(args) => args,
        Command::Help => {
            print_help();
            return Ok(());
        }
        Command::Version => {
            println!("skele {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
    };

    let config = load_config(&args)?;

    env_logger::Builder::new()
        .parse_filters(&config.logging.log_level)
        .init();
    log::debug!("keys per request: {}", config.derivation.key_count);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let end = session::run(
        &mut TerminalPrompter::stdin(),
        &mut out,
        &SessionOptions::from(&config),
    )?;

    let code = finish_session(&mut out, end)?;
    std::process::exit(code);
}

/// Tidy up after the session and pick the exit code. Any end is a failure
/// exit; on end of input the cursor is moved off the prompt line first.
fn finish_session<W: Write>(out: &mut W, end: SessionEnd) -> Result<i32> {
    if end == SessionEnd::EndOfInput {
        writeln!(out)?;
    }
    out.flush()?;
    log::debug!("session ended: {:?}", end);
    Ok(1)
}

fn print_help() {
    println!(
        r#"Skele: unique passwords per service and user from one skeleton key

USAGE:
    skele [OPTIONS]

OPTIONS:
    -c, --config <PATH>   Config file path (TOML, optional)
    -n, --count <N>       Keys printed per service/user pair (default: 5)
    --fingerprint         Print the skeleton key fingerprint after confirmation
    -h, --help            Show this help message
    -V, --version         Show version

An empty answer or end of input (Ctrl-D) ends the session.

ENVIRONMENT VARIABLES (override config file):
    SKELE_KEY_COUNT           Keys printed per service/user pair
    SKELE_SHOW_FINGERPRINT    Print the fingerprint (true/false)
    SKELE_WARN_WEAK_KEY       Warn about guessable skeleton keys (default: false)
    SKELE_LOG_LEVEL           Log level (off/error/warn/info/debug/trace)
"#
    );
}
