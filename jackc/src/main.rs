use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use jack_lib::utils::discover_sources;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Compiles Jack classes to VM code. Every `X.jack` is translated to `X.vm` next to it.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// a .jack file, or a directory whose .jack files are compiled
    target: PathBuf,

    /// number of files compiled in parallel
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,

    /// log what the compiler is doing (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,

    /// print the token stream of every file instead of compiling it
    #[cfg(feature = "dev")]
    #[arg(short = 't', long)]
    show_tokens: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let failed = match run(&cli) {
        Ok(n_failed) => n_failed > 0,
        Err(e) => {
            eprintln!("{:#}", e);
            true
        }
    };
    std::process::exit(i32::from(failed));
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// compiles everything `cli.target` names and returns how many files failed
fn run(cli: &Cli) -> Result<usize> {
    let sources = discover_sources(&cli.target)
        .with_context(|| format!("looking for sources in {}", cli.target.display()))?;
    info!(n_files = sources.len(), jobs = cli.jobs, "found sources");

    #[cfg(feature = "dev")]
    if cli.show_tokens {
        return show_tokens(&sources);
    }

    let failures = compile_all(&sources, cli.jobs.max(1));
    for (path, err) in &failures {
        eprintln!("{}: {:#}", path.display(), err);
    }
    Ok(failures.len())
}

fn compile_one(path: &Path) -> Result<PathBuf> {
    let out = jack_lib::compile_file(path).context("compilation failed")?;
    debug!(source = %path.display(), output = %out.display(), "compiled");
    Ok(out)
}

/// Compiles every file, `jobs` at a time. Each file is independent, so workers just take the
/// next unclaimed index. Failures are returned in source order.
fn compile_all(sources: &[PathBuf], jobs: usize) -> Vec<(PathBuf, anyhow::Error)> {
    if jobs == 1 {
        return sources
            .iter()
            .filter_map(|p| compile_one(p).err().map(|e| (p.clone(), e)))
            .collect();
    }

    let next = AtomicUsize::new(0);
    let failures = Mutex::new(vec![]);
    std::thread::scope(|s| {
        for _ in 0..jobs.min(sources.len()) {
            s.spawn(|| loop {
                let idx = next.fetch_add(1, Ordering::Relaxed);
                let Some(path) = sources.get(idx) else {
                    break;
                };
                if let Err(e) = compile_one(path) {
                    let mut failures = failures.lock().unwrap_or_else(|p| p.into_inner());
                    failures.push((idx, e));
                }
            });
        }
    });

    let mut failures = failures.into_inner().unwrap_or_else(|p| p.into_inner());
    failures.sort_by_key(|(idx, _)| *idx);
    failures
        .into_iter()
        .map(|(idx, e)| (sources[idx].clone(), e))
        .collect()
}

#[cfg(feature = "dev")]
fn show_tokens(sources: &[PathBuf]) -> Result<usize> {
    use jack_lib::lexer::Lexer;

    for path in sources {
        let src = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        println!("{}:", path.display());
        for tok in Lexer::new(&src) {
            let tok = tok.with_context(|| format!("lexing {}", path.display()))?;
            println!("  {:>4}  {}", tok.line, tok.describe());
        }
    }
    Ok(0)
}
