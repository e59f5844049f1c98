//! Skytag CLI
//!
//! Selects sources in a sky model and sets, clears or removes tags on them:
//!
//! ```text
//! skytag model.json 'ra<10d' 3C* +dE spectrum.spi=float:-0.7
//! skytag model.json -l 'I>1'
//! skytag model.json -t reference.json:5 dE
//! ```

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use colored::Colorize;
use skytag_engine::{transfer_tags, SessionOptions, TagError, TagSession};
use skytag_model::SkyModel;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "skytag")]
#[command(
    author,
    version,
    about = "Sets or changes tags of selected sources in a sky model",
    long_about = "Sets or changes tags of selected sources in a sky model.\n\n\
        Select sources with NAME (shell-style wildcards allowed), =TAG (sources \
        with a non-zero TAG), or TAG<op>VALUE where <op> is one of ==, !=, <=, <, \
        >=, > or .eq., .ne., .le., .lt., .ge., .gt.; VALUE may end in d, m or s \
        to give degrees, arc-minutes or arc-seconds (e.g. \"r<5d\").\n\n\
        Then tag the selection with TAG=[TYPE:]VALUE (TYPE is bool, int, float, \
        str or complex; guessed when omitted), +TAG (true), !TAG (false) or \
        /TAG (remove). Dotted tags such as spectrum.spi address sub-objects."
)]
struct Cli {
    /// Sky model file (JSON)
    model: PathBuf,

    /// Selection and tagging tokens, applied in order (tag names with -t)
    #[arg(required = true, num_args = 1..)]
    tokens: Vec<String>,

    /// List selected sources; do not apply any tags
    #[arg(short, long)]
    list: bool,

    /// Save to a different model file (default: in place)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Save without prompting
    #[arg(short, long)]
    force: bool,

    /// Copy the named tags from sources in a reference model onto sources
    /// of this model within TOL arc-seconds of them
    #[arg(short = 't', long = "transfer-tags", value_name = "FROM_MODEL:TOL", value_parser = parse_transfer_spec)]
    transfer_tags: Option<TransferSpec>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

#[derive(Debug, Clone)]
struct TransferSpec {
    reference: PathBuf,
    tolerance_arcsec: f64,
}

fn parse_transfer_spec(s: &str) -> std::result::Result<TransferSpec, String> {
    let (path, tol) = s
        .rsplit_once(':')
        .ok_or_else(|| format!("expected FROM_MODEL:TOL, got '{s}'"))?;
    if path.is_empty() {
        return Err(format!("missing reference model in '{s}'"));
    }
    let tolerance_arcsec = tol
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("tolerance '{tol}' is not a number"))?;
    Ok(TransferSpec {
        reference: PathBuf::from(path),
        tolerance_arcsec,
    })
}

fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if cli.no_color {
        colored::control::set_override(false);
    }

    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            let code = err
                .downcast_ref::<TagError>()
                .map(TagError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code as u8)
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let mut model = SkyModel::load(&cli.model)?;
    if model.is_empty() {
        println!("Input model {} contains no sources", cli.model.display());
        return Ok(ExitCode::SUCCESS);
    }
    println!("Input model contains {} sources", model.len());

    if let Some(spec) = &cli.transfer_tags {
        return run_transfer(cli, spec, model);
    }

    let options = SessionOptions {
        list_only: cli.list,
    };
    debug!(?options, tokens = cli.tokens.len(), "starting tag session");
    let mut session = TagSession::new(&mut model, options);
    for token in &cli.tokens {
        for line in session.apply(token)? {
            println!("{line}");
        }
    }
    for line in session.finish() {
        println!("{line}");
    }
    if !session.modified() {
        return Ok(ExitCode::SUCCESS);
    }

    if !cli.force && !confirm_save()? {
        println!("{}", "Cancelling".yellow());
        return Ok(ExitCode::FAILURE);
    }

    match &cli.output {
        Some(output) => {
            model.save(output)?;
            println!("Saved updated model to {}", output.display());
        }
        None => {
            model.save(&cli.model)?;
            println!("Saved updated model");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_transfer(cli: &Cli, spec: &TransferSpec, mut model: SkyModel) -> Result<ExitCode> {
    let tags: Vec<String> = cli
        .tokens
        .iter()
        .flat_map(|t| t.split_whitespace())
        .map(str::to_string)
        .collect();
    println!(
        "Transferring tags {} from {} to {} ({:.2}\" tolerance)",
        tags.join(","),
        spec.reference.display(),
        cli.model.display(),
        spec.tolerance_arcsec
    );

    let reference = SkyModel::load(&spec.reference)
        .with_context(|| format!("loading reference model {}", spec.reference.display()))?;
    let report = transfer_tags(&reference, &mut model, &tags, spec.tolerance_arcsec);
    for line in &report.lines {
        println!("{line}");
    }
    info!(changed = report.changed, "tag transfer done");

    let output: &Path = cli.output.as_deref().unwrap_or(&cli.model);
    model.save(output)?;
    Ok(ExitCode::SUCCESS)
}

/// `true` when the user pressed ENTER; end of input cancels.
fn confirm_save() -> Result<bool> {
    print!("Press ENTER to save model or Ctrl+C to cancel: ");
    io::stdout().flush()?;
    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    Ok(read > 0)
}
