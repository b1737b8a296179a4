// LogSlice - main.rs
//
// Command-line entry point. Handles:
// 1. CLI argument parsing and input validation
// 2. Configuration loading and logging initialisation
// 3. Segment discovery
// 4. Extraction with console progress and the full-copy prompt

use clap::Parser;
use logslice::app::assemble::{ConfirmFullCopy, EnclosingRange};
use logslice::app::extract::{self, ExtractOptions, ExtractRequest};
use logslice::core::discovery::{self, DiscoveryConfig};
use logslice::core::model::{Archive, ExtractOutcome, ExtractProgress, ExtractionRange, OverlapCase};
use logslice::core::timestamp;
use logslice::platform::{config, fs};
use logslice::util::constants;
use logslice::util::error::{DiscoveryError, ExtractError, LogSliceError};
use std::cell::Cell;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

/// ISO 8601 UTC instant accepted on the command line.
const CLI_INSTANT_PATTERN: &str = r"^(-?(?:[1-9][0-9]*)?[0-9]{4})-(1[0-2]|0[1-9])-(3[01]|0[1-9]|[12][0-9])T(2[0-3]|[01][0-9]):([0-5][0-9]):([0-5][0-9])(\.[0-9]+)?Z$";

const USAGE_EXAMPLE: &str =
    "logslice -f 2020-08-22T21:40:47.762Z -t 2020-08-22T21:53:32.620Z -i /var/log/archive";

/// LogSlice: extract a time range from a chronologically segmented log archive.
#[derive(Parser, Debug)]
#[command(name = "logslice", version, about)]
struct Cli {
    /// Range start, e.g. 2020-08-22T21:40:47.762Z.
    #[arg(short = 'f', long = "from")]
    from: String,

    /// Range end, e.g. 2020-08-22T21:53:32.620Z.
    #[arg(short = 't', long = "to")]
    to: String,

    /// Directory holding the archive segments.
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Directory to create the output directory in (default: parent of INPUT).
    #[arg(short = 'o', long = "output-parent")]
    output_parent: Option<PathBuf>,

    /// Segment file name glob (default: LogFile-*.log).
    #[arg(short = 'p', long = "pattern")]
    pattern: Option<String>,

    /// Copy the whole archive without asking when the range encloses it.
    #[arg(short = 'y', long = "yes")]
    yes: bool,

    /// Open the output directory in the file manager when done.
    #[arg(long = "open")]
    open: bool,

    /// Write into a hidden staging directory and rename it on success.
    #[arg(long = "staged")]
    staged: bool,

    /// Worker threads for probes and writes (0 = one per core).
    #[arg(long = "threads", value_parser = clap::value_parser!(u64).range(0..=constants::MAX_WORKER_THREADS as u64))]
    threads: Option<u64>,

    /// Abort the extraction after this many seconds.
    #[arg(long = "timeout-secs", value_parser = clap::value_parser!(u64).range(1..=constants::MAX_TIMEOUT_SECS))]
    timeout_secs: Option<u64>,

    /// Print the extraction report as JSON on stdout.
    #[arg(long = "json")]
    json: bool,

    /// Config file to use instead of the platform default.
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

/// Human-readable messages go to stdout, or to stderr when stdout carries
/// the JSON report.
#[derive(Clone, Copy)]
struct Console {
    json: bool,
}

impl Console {
    fn say(&self, msg: &str) {
        if self.json {
            eprintln!("{msg}");
        } else {
            println!("{msg}");
        }
    }
}

/// Answer given at the full-copy prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Answer {
    Yes,
    No,
    Invalid,
}

/// Y/N prompt on stdin.
struct StdinConfirm {
    console: Console,
    answer: Cell<Option<Answer>>,
}

impl ConfirmFullCopy for StdinConfirm {
    fn confirm_full_copy(&self, range: &EnclosingRange) -> bool {
        tracing::debug!(segments = range.segment_count, "Asking for full-copy confirmation");
        self.console.say(
            "The given range is too large; the entire archive fits within this range. \
             Generating the output logs is not recommended as it would be exactly the same \
             as the archives. Do you still want to generate output logs anyway? Y/N ",
        );
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        let answer = match std::io::stdin().lock().read_line(&mut line) {
            Ok(_) => match line.trim().to_lowercase().as_str() {
                "y" | "yes" => Answer::Yes,
                "n" | "no" => Answer::No,
                _ => Answer::Invalid,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Could not read confirmation from stdin");
                Answer::Invalid
            }
        };
        self.answer.set(Some(answer));
        answer == Answer::Yes
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let console = Console { json: cli.json };

    // Config first so its log level can seed the subscriber.
    let platform_paths = config::PlatformPaths::resolve();
    let (app_config, config_warnings) = match &cli.config {
        Some(path) => match config::load_config_file(path) {
            Ok(loaded) => loaded,
            Err(e) => {
                logslice::util::logging::init(cli.debug, None);
                return report_error(e.into());
            }
        },
        None => config::load_config(&platform_paths.config_dir),
    };

    logslice::util::logging::init(cli.debug, app_config.log_level.as_deref());
    tracing::info!(
        version = constants::APP_VERSION,
        debug = cli.debug,
        "LogSlice starting"
    );
    for warning in &config_warnings {
        tracing::warn!(warning = %warning, "Config warning");
    }

    // -- Input validation --
    let range = match parse_range(&cli, console) {
        Some(range) => range,
        None => return ExitCode::from(2),
    };

    // -- Discovery --
    let discovery_config = DiscoveryConfig {
        segment_pattern: cli
            .pattern
            .clone()
            .unwrap_or_else(|| app_config.segment_pattern.clone()),
        max_depth: app_config.max_depth,
    };
    let segments = match discovery::discover_segments(&cli.input, &discovery_config) {
        Ok((segments, warnings)) => {
            for warning in &warnings {
                tracing::warn!(warning = %warning, "Discovery warning");
            }
            segments
        }
        Err(e @ DiscoveryError::RootNotFound { .. }) => {
            tracing::error!(error = %e, "Input directory missing");
            console.say(&format!(
                "The given directory does not exist: {}",
                cli.input.display()
            ));
            return ExitCode::from(2);
        }
        Err(e @ DiscoveryError::NotADirectory { .. }) => {
            tracing::error!(error = %e, "Input is not a directory");
            console.say(&format!(
                "The given input is not a directory: {}",
                cli.input.display()
            ));
            return ExitCode::from(2);
        }
        Err(e) => return report_error(e.into()),
    };

    let archive = match Archive::new(segments) {
        Ok(archive) => archive,
        Err(e) => {
            tracing::error!(error = %e, input = %cli.input.display(), "No segments discovered");
            console.say("No log files exist in the given input directory.");
            return ExitCode::from(1);
        }
    };
    tracing::info!(segments = archive.len(), "Archive discovered");

    // -- Extraction --
    let request = ExtractRequest {
        archive,
        range,
        output_parent: cli
            .output_parent
            .clone()
            .unwrap_or_else(|| default_output_parent(&cli.input)),
    };
    let options = ExtractOptions {
        worker_threads: cli
            .threads
            .map_or(app_config.worker_threads, |t| t as usize),
        large_file_threshold: app_config.large_file_threshold,
        staged: cli.staged || app_config.staged,
        cancel_flag: None,
        timeout: cli.timeout_secs.map(Duration::from_secs),
    };

    let progress = move |event: ExtractProgress| match event {
        ExtractProgress::Planned {
            case: OverlapCase::StartClamped,
            ..
        } => console.say(
            "From timestamp is less than the least available timestamp in the archives. \
             Generating logs from earliest available timestamp...",
        ),
        ExtractProgress::Planned {
            case: OverlapCase::EndClamped,
            ..
        } => console.say(
            "To timestamp is greater than the greatest available timestamp in the archives. \
             Generating logs till the latest available timestamp...",
        ),
        ExtractProgress::Planned { .. } => {}
        ExtractProgress::OutputCreated { path } => {
            console.say(&format!("Check output logs at {}", path.display()))
        }
        ExtractProgress::FirstSegmentReady { elapsed } => console.say(&format!(
            "First file ready after {} ms.",
            elapsed.as_millis()
        )),
        ExtractProgress::SegmentWritten {
            name,
            completed,
            total,
        } => tracing::debug!(segment = %name, completed, total, "Segment written"),
    };

    let stdin_confirm = StdinConfirm {
        console,
        answer: Cell::new(None),
    };
    let always = |_: &EnclosingRange| true;
    let confirm: &dyn ConfirmFullCopy = if cli.yes { &always } else { &stdin_confirm };

    match extract::run_extraction(&request, &options, confirm, &progress) {
        Ok(ExtractOutcome::Written(report)) => {
            if cli.json {
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{json}"),
                    Err(e) => {
                        eprintln!("Error: cannot serialise report: {e}");
                        return ExitCode::from(1);
                    }
                }
            }
            console.say("Execution complete.");
            if cli.open {
                fs::reveal_in_file_manager(&report.output_dir);
            }
            ExitCode::SUCCESS
        }
        Ok(ExtractOutcome::Declined) => {
            if stdin_confirm.answer.get() == Some(Answer::Invalid) {
                console.say("Invalid choice. Execution terminated.");
            } else {
                console.say(
                    "Output logs have not been generated. \
                     The entire archive lies within the given time range.",
                );
            }
            print_outcome_json(cli.json, "declined");
            ExitCode::SUCCESS
        }
        Ok(ExtractOutcome::NoOverlap) => {
            console.say(
                "No log records fall within the given time range. \
                 Output logs have not been generated.",
            );
            print_outcome_json(cli.json, "no_overlap");
            ExitCode::SUCCESS
        }
        Err(e) => {
            if matches!(e, ExtractError::Io { .. }) {
                eprintln!("An error occurred. LogSlice could not write output files.");
            }
            report_error(e.into())
        }
    }
}

/// Validate and parse `--from`/`--to`. Prints every problem found and the
/// usage example; `None` means the input was rejected.
fn parse_range(cli: &Cli, console: Console) -> Option<ExtractionRange> {
    let pattern = match regex::Regex::new(CLI_INSTANT_PATTERN) {
        Ok(re) => re,
        Err(e) => {
            tracing::error!(error = %e, "Instant pattern failed to compile");
            return None;
        }
    };

    let check = |label: &str, raw: &str| {
        let parsed = pattern
            .is_match(raw)
            .then(|| timestamp::parse_instant(raw).ok())
            .flatten();
        if parsed.is_none() {
            console.say(&format!("{label} timestamp is not in the correct format: {raw}"));
        }
        parsed
    };
    let from = check("From", &cli.from);
    let to = check("To", &cli.to);

    let (Some(from), Some(to)) = (from, to) else {
        console.say("Please check the inputs you have provided.");
        console.say("Here is an example for a valid input:");
        console.say(USAGE_EXAMPLE);
        return None;
    };

    match ExtractionRange::new(from, to) {
        Ok(range) => Some(range),
        Err(e) => {
            tracing::debug!(error = %e, "Inverted range rejected");
            console.say(
                "The From timestamp is greater than the To timestamp. \
                 You can exchange the two & try again.",
            );
            None
        }
    }
}

/// The parent of the input directory, so output lands beside the archive.
fn default_output_parent(input: &Path) -> PathBuf {
    let absolute = std::fs::canonicalize(input).unwrap_or_else(|_| input.to_path_buf());
    absolute
        .parent()
        .map_or_else(|| absolute.clone(), Path::to_path_buf)
}

fn report_error(err: LogSliceError) -> ExitCode {
    tracing::error!(error = %err, "LogSlice failed");
    eprintln!("Error: {err}");
    ExitCode::from(1)
}

fn print_outcome_json(json: bool, outcome: &str) {
    if json {
        println!("{}", serde_json::json!({ "outcome": outcome }));
    }
}
