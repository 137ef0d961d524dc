use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use multiscan::{AhoCorasick, Backing, Config, Match};

/// Report every occurrence of a set of literal patterns
#[derive(Parser, Debug)]
#[command(name = "multiscan")]
#[command(version, about, long_about = None)]
struct Args {
    /// Pattern to search for (repeatable)
    #[arg(short, long = "pattern", value_name = "PATTERN")]
    patterns: Vec<String>,

    /// File with one pattern per line
    #[arg(short = 'f', long, value_name = "FILE")]
    patterns_file: Option<PathBuf>,

    /// Fold ASCII case in patterns and input
    #[arg(short, long)]
    ignore_case: bool,

    /// Transition table layout
    #[arg(long, value_enum, value_name = "BACKING")]
    backing: Option<Backing>,

    /// TOML file with `case-sensitive` and `backing` keys
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Input file; standard input when absent
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Serialize)]
struct Record<'a> {
    #[serde(flatten)]
    m: Match,
    pattern: &'a str,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("MULTISCAN_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("multiscan: {e:#}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether anything matched.
fn run(args: Args) -> Result<bool> {
    let config = resolve_config(&args)?;

    let mut patterns = args.patterns.clone();
    if let Some(path) = &args.patterns_file {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read patterns from {}", path.display()))?;
        patterns.extend(text.lines().map(str::to_owned));
    }
    if patterns.is_empty() {
        bail!("no patterns given (use --pattern or --patterns-file)");
    }

    let ac = AhoCorasick::with_config(config, &patterns)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut count = 0usize;
    let mut write_error = None;
    // A closed stdout ends the search; the input may never end on its own.
    let mut emit = |m: Match| match write_match(&mut out, args.format, m, &patterns[m.pattern_id]) {
        Ok(()) => {
            count += 1;
            ControlFlow::Continue(())
        }
        Err(e) => {
            write_error = Some(e);
            ControlFlow::Break(())
        }
    };

    let mut stream = ac.stream();
    let read = match &args.input {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            stream.feed_reader(file, &mut emit)
        }
        None => stream.feed_reader(io::stdin().lock(), &mut emit),
    }
    .context("failed to read input")?;

    let written = match write_error {
        Some(e) => Err(e),
        None => out.flush(),
    };
    match written {
        // The reader went away, as with `| head`; what it took is all it wanted.
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
        written => written.context("failed to write output")?,
    }
    info!(bytes = read, matches = count, "search finished");
    Ok(count > 0)
}

fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            Config::from_toml(&text).with_context(|| format!("invalid config {}", path.display()))?
        }
        None => Config::default(),
    };
    if args.ignore_case {
        config.case_sensitive = false;
    }
    if let Some(backing) = args.backing {
        config.backing = backing;
    }
    Ok(config)
}

fn write_match<W: Write>(out: &mut W, format: Format, m: Match, pattern: &str) -> io::Result<()> {
    match format {
        Format::Text => writeln!(out, "{}\t{}\t{}\t{}", m.start, m.end, m.pattern_id, pattern),
        Format::Json => {
            serde_json::to_writer(&mut *out, &Record { m, pattern })?;
            writeln!(out)
        }
    }
}
