//! `theoremx` command-line interface.
//!
//! - `theoremx extract --arxiv-id ID` fetches and extracts an arXiv paper.
//! - `theoremx extract --paper-path PATH` extracts a local directory or file.
//!
//! Theorems are written as JSON Lines to `--output-file` or stdout. Logs go
//! to stderr and are filtered by `RUST_LOG`.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use theoremx::extract::{
    DEFAULT_ARXIV_SRC_URL, ExtractError, ExtractRequest, PaperSource, Theorem, ValidationLevel,
    extract_paper, extract_paper_bounded, to_json_lines, write_report,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "theoremx")]
#[command(about = "Extract theorem and proof records from LaTeX paper sources")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract the theorems of one paper
    Extract(ExtractArgs),
    /// Run one extraction request and report it on stdout
    #[command(hide = true)]
    Worker {
        /// JSON-encoded extraction request
        #[arg(long)]
        request: String,
    },
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// arXiv identifier of the paper, e.g. 2101.00001
    #[arg(short = 'a', long)]
    arxiv_id: Option<String>,
    /// Local source directory or single source file
    #[arg(short = 'p', long)]
    paper_path: Option<PathBuf>,
    /// File to write JSON Lines to instead of stdout
    #[arg(short = 'o', long)]
    output_file: Option<PathBuf>,
    /// `theorem` drops invalid theorems; `paper` rejects the whole paper
    #[arg(
        short = 'v',
        long,
        env = "THEOREMX_VALIDATION_LEVEL",
        default_value = "paper"
    )]
    validation_level: ValidationLevel,
    /// Wall-clock budget in seconds; 0 runs without a bound
    #[arg(short = 't', long, env = "THEOREMX_TIMEOUT", default_value_t = 0)]
    timeout: u64,
    /// Endpoint serving arXiv source payloads
    #[arg(long, env = "THEOREMX_ARXIV_SRC_URL", default_value = DEFAULT_ARXIV_SRC_URL)]
    arxiv_src_url: String,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract(args) => match run_extract(args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => {
                report_failure(&error);
                ExitCode::FAILURE
            }
        },
        Commands::Worker { request } => run_worker(&request),
    }
}

fn run_extract(args: ExtractArgs) -> Result<(), ExtractError> {
    let source = PaperSource::from_options(args.arxiv_id, args.paper_path)?;
    let request = ExtractRequest::new(source)
        .with_level(args.validation_level)
        .with_arxiv_src_url(args.arxiv_src_url);

    let theorems = if args.timeout == 0 {
        extract_paper(&request)?
    } else {
        let worker = env::current_exe()
            .map_err(|error| ExtractError::unknown(format!("cannot locate own binary: {error}")))?;
        extract_paper_bounded(&request, &worker, Duration::from_secs(args.timeout))?
    };
    write_output(&theorems, args.output_file.as_ref())
}

fn write_output(theorems: &[Theorem], output_file: Option<&PathBuf>) -> Result<(), ExtractError> {
    let lines = to_json_lines(theorems)
        .map_err(|error| ExtractError::unknown(format!("cannot encode theorems: {error}")))?;
    match output_file {
        Some(path) => fs::write(path, lines).map_err(|error| {
            ExtractError::unknown(format!("cannot write {}: {error}", path.display()))
        })?,
        None => io::stdout()
            .lock()
            .write_all(lines.as_bytes())
            .map_err(|error| ExtractError::unknown(format!("cannot write output: {error}")))?,
    }
    debug!(theorems = theorems.len(), "wrote output");
    Ok(())
}

fn run_worker(request: &str) -> ExitCode {
    let result = serde_json::from_str::<ExtractRequest>(request)
        .map_err(|error| ExtractError::syntax(format!("malformed worker request: {error}")))
        .and_then(|decoded| extract_paper(&decoded));
    match write_report(io::stdout().lock(), result) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            report_failure(&ExtractError::unknown(format!("cannot write report: {error}")));
            ExitCode::FAILURE
        }
    }
}

fn report_failure(error: &ExtractError) {
    // Nothing useful remains to be done if stderr itself is closed.
    if writeln!(io::stderr().lock(), "{error}").is_err() {
        debug!("stderr closed before the error could be reported");
    }
}
