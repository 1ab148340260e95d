//! Slave entry point.
//!
//! `brood-slave -file <paramfile>` starts a slave from a parameter file;
//! `brood-slave -checkpoint <file>` resumes from a restart snapshot. Any
//! other `key=value` argument (or `-p key=value`) overrides the database.

use brood_core::ParameterDatabase;
use brood_eval::{Slave, SlaveCheckpoint};
use tracing_subscriber::EnvFilter;

struct Args {
    file: Option<String>,
    checkpoint: Option<String>,
    overrides: Vec<(String, String)>,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut parsed = Args {
        file: None,
        checkpoint: None,
        overrides: Vec::new(),
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-file" => {
                parsed.file = Some(
                    iter.next()
                        .ok_or_else(|| "-file requires a path".to_owned())?
                        .clone(),
                );
            }
            "-checkpoint" => {
                parsed.checkpoint = Some(
                    iter.next()
                        .ok_or_else(|| "-checkpoint requires a path".to_owned())?
                        .clone(),
                );
            }
            "-p" => {
                let pair = iter
                    .next()
                    .ok_or_else(|| "-p requires key=value".to_owned())?;
                let (key, value) = pair
                    .split_once('=')
                    .ok_or_else(|| format!("'{}' is not key=value", pair))?;
                parsed.overrides.push((key.to_owned(), value.to_owned()));
            }
            other => {
                // Unknown arguments are forwarded to the parameter database.
                let (key, value) = other
                    .split_once('=')
                    .ok_or_else(|| format!("unrecognized argument '{}'", other))?;
                parsed.overrides.push((key.to_owned(), value.to_owned()));
            }
        }
    }

    if parsed.file.is_none() && parsed.checkpoint.is_none() {
        return Err("either -file <paramfile> or -checkpoint <file> is required".to_owned());
    }
    Ok(parsed)
}

fn run(args: Args) -> brood_core::Result<i32> {
    let (mut params, checkpoint) = match (&args.file, &args.checkpoint) {
        (Some(file), _) => (ParameterDatabase::from_file(file)?, None),
        (None, Some(path)) => {
            let (params, checkpoint) = SlaveCheckpoint::load(path)?;
            (params, Some(checkpoint))
        }
        (None, None) => unreachable!("argument parsing enforces one source"),
    };

    for (key, value) in args.overrides {
        params.set(key, value);
    }

    init_logging(&params)?;

    let mut slave = Slave::from_params(params)?;
    if let Some(checkpoint) = checkpoint {
        slave.restore(checkpoint);
    }
    slave.run()
}

/// Map the legacy `verbosity` knob onto a tracing filter (higher values
/// silence more), honoring `RUST_LOG` when it is set. `flush` and `store`
/// are validated for compatibility with old parameter files.
fn init_logging(params: &ParameterDatabase) -> brood_core::Result<()> {
    let verbosity = if params.has("verbosity") {
        params.get_u64("verbosity")?
    } else {
        1
    };
    params.get_bool_or("flush", true)?;
    params.get_bool_or("store", true)?;

    let level = match verbosity {
        0 => "debug",
        1..3000 => "info",
        _ => "warn",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();
    Ok(())
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_args(&args) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("brood-slave: {}", message);
            std::process::exit(64);
        }
    };

    match run(args) {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            eprintln!("brood-slave: fatal: {}", error);
            std::process::exit(1);
        }
    }
}
