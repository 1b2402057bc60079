//! Purpose: `chartcache` CLI entry point.
//! Role: Thin shell over the library: parse a cache connection string, or read
//! the error message out of a JSON response body.
//! Invariants: `cache-config` prints the serialized config exactly as the cache loader receives it.
//! Invariants: Failures print `{"error":{"kind","message",...}}` on stderr and exit via `to_exit_code`.
use std::error::Error as StdError;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

use chartcache::api::{Error, ErrorKind, extract_error, parse_backend_config, to_exit_code};

#[derive(Parser)]
#[command(
    name = "chartcache",
    version,
    about = "Parse cache backend connection strings and inspect JSON error bodies",
    after_help = r#"EXAMPLES
  $ chartcache cache-config redis:6379
  $ chartcache cache-config "redis:6379,100,secret,2"
  $ curl -s http://proxy/api/charts | chartcache extract-error"#,
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Parse a cache connection string and print its JSON config")]
    CacheConfig {
        #[arg(
            env = "CHART_CACHE_REDIS",
            help = "Connection string: address:port[,weight,password,db_index]"
        )]
        raw: String,
    },
    #[command(about = "Print the error message carried by a JSON response body")]
    ExtractError {
        #[arg(help = "Body file (default: stdin)", value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
    },
}

fn main() {
    init_tracing();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => {
            let usage = Error::new(ErrorKind::Usage)
                .with_message(err.kind().to_string())
                .with_hint("Try `chartcache --help`.");
            fail(&usage)
        }
    };
    if let Err(err) = run(cli.command) {
        fail(&err);
    }
}

fn run(command: Command) -> Result<(), Error> {
    match command {
        Command::CacheConfig { raw } => {
            println!("{}", parse_backend_config(&raw)?);
        }
        Command::ExtractError { file } => {
            let body = match file {
                Some(path) => std::fs::read(&path).map_err(|err| {
                    Error::new(ErrorKind::Io)
                        .with_message(format!("cannot read {}", path.display()))
                        .with_source(err)
                })?,
                None => {
                    let mut buf = Vec::new();
                    io::stdin().read_to_end(&mut buf).map_err(|err| {
                        Error::new(ErrorKind::Io)
                            .with_message("cannot read stdin")
                            .with_source(err)
                    })?;
                    buf
                }
            };
            let message = extract_error(&body).map(|err| err.to_string());
            println!("{}", json!({ "error": message }));
        }
    }
    Ok(())
}

// Library events go to stderr so stdout stays a clean JSON payload.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn fail(err: &Error) -> ! {
    eprintln!("{}", failure_report(err));
    std::process::exit(to_exit_code(err.kind()))
}

fn failure_report(err: &Error) -> Value {
    let mut report = json!({
        "kind": format!("{:?}", err.kind()),
        "message": err.to_string(),
    });
    if let Some(hint) = err.hint() {
        report["hint"] = json!(hint);
    }
    let causes: Vec<String> = std::iter::successors(err.source(), |&cause| cause.source())
        .map(ToString::to_string)
        .collect();
    if !causes.is_empty() {
        report["causes"] = json!(causes);
    }
    json!({ "error": report })
}
