pub mod commands;
pub mod config;

use std::sync::Arc;

use filebuf::Handle;
use fs_runtime::{FsRuntime, PosixRuntime, StdHandle};
use tracing::debug;

use config::{Config, FileConfig, BUFFER_SIZE_ENV};

pub const USAGE: &str = "\
usage: fbuf [--buffer N] [--config FILE] <command>

commands:
  cat FILE...                  copy files to stdout
  lines FILE                   print numbered lines
  copy FROM TO                 copy a file
  stress FILE [--threads N] [--records N]
                               concurrent writers on one locked handle

environment:
  FILEBUF_BUFFER_SIZE          buffer size, overridden by --buffer
  RUST_LOG                     log filter, e.g. filebuf=trace";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Cat { paths: Vec<String> },
    Lines { path: String },
    Copy { from: String, to: String },
    Stress { path: String, threads: usize, records: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub command: Command,
    pub buffer: Option<String>,
    pub config: Option<String>,
}

fn parse_count(flag: &str, value: Option<String>) -> Result<usize, String> {
    let value = value.ok_or_else(|| format!("{flag} needs a value"))?;
    match value.parse::<usize>() {
        Ok(0) | Err(_) => Err(format!("{flag}: expected a positive integer, got {value:?}")),
        Ok(n) => Ok(n),
    }
}

/// Parse the command line, program name excluded.
///
/// # Errors
/// Unknown command or flag, missing operand.
pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Args, String> {
    let mut buffer = None;
    let mut config = None;
    let mut threads = 4;
    let mut records = 10_000;
    let mut positional = Vec::new();

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--buffer" => buffer = Some(args.next().ok_or("--buffer needs a value")?),
            "--config" => config = Some(args.next().ok_or("--config needs a value")?),
            "--threads" => threads = parse_count("--threads", args.next())?,
            "--records" => records = parse_count("--records", args.next())?,
            flag if flag.starts_with("--") => return Err(format!("unknown flag {flag}")),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let name = positional.next().ok_or("missing command")?;
    let operands: Vec<String> = positional.collect();
    let command = match (name.as_str(), operands.as_slice()) {
        ("cat", [_, ..]) => Command::Cat {
            paths: operands.clone(),
        },
        ("lines", [path]) => Command::Lines { path: path.clone() },
        ("copy", [from, to]) => Command::Copy {
            from: from.clone(),
            to: to.clone(),
        },
        ("stress", [path]) => Command::Stress {
            path: path.clone(),
            threads,
            records,
        },
        ("cat" | "lines" | "copy" | "stress", _) => {
            return Err(format!("{name}: wrong number of operands"))
        }
        _ => return Err(format!("unknown command {name}")),
    };

    Ok(Args {
        command,
        buffer,
        config,
    })
}

/// Resolve the configuration of `args` against `runtime` and the environment.
///
/// # Errors
/// Unreadable config file or invalid settings.
pub fn load_config<R: FsRuntime>(runtime: R, args: &Args) -> Result<Config, String> {
    let file = match &args.config {
        Some(path) => Some(FileConfig::load(runtime, path)?),
        None => None,
    };
    let env = std::env::var(BUFFER_SIZE_ENV).ok();
    Config::resolve(file, env.as_deref(), args.buffer.as_deref())
}

fn stdout<R: FsRuntime>(runtime: R, capacity: usize) -> Result<Handle<R>, String> {
    Handle::from_std(runtime, StdHandle::Stdout, capacity).map_err(|e| format!("stdout: {e}"))
}

fn finish<R: FsRuntime>(mut out: Handle<R>) -> Result<(), String> {
    out.close().map_err(|e| format!("stdout: {e}"))
}

/// Run a parsed command on the real file system.
///
/// # Errors
/// The first failure, as a message for the user.
pub async fn run(args: Args) -> Result<(), String> {
    let runtime = PosixRuntime::new();
    let config = load_config(runtime, &args)?;
    debug!(?config, "configuration");

    match args.command {
        Command::Cat { paths } => {
            let mut out = stdout(runtime, config.buffer_size)?;
            commands::cat(&runtime, &paths, config.buffer_size, &mut out)?;
            finish(out)
        }
        Command::Lines { path } => {
            let mut out = stdout(runtime, config.buffer_size)?;
            commands::lines(&runtime, &path, config.buffer_size, &mut out)?;
            finish(out)
        }
        Command::Copy { from, to } => {
            commands::copy(&runtime, &from, &to, config.buffer_size, &config.output)?;
            Ok(())
        }
        Command::Stress {
            path,
            threads,
            records,
        } => {
            let report =
                commands::stress(Arc::new(runtime), &path, config.buffer_size, threads, records)
                    .await?;
            println!(
                "{} writers x {} records, {} bytes, no torn records",
                report.writers, report.records, report.bytes
            );
            Ok(())
        }
    }
}
