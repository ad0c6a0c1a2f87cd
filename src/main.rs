//! Sprout - spaced-repetition notebook for short insights
//!
//! CLI entry point with global panic handler.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use sprout::config::{crash_log_path, sprout_home, Config, GeneratorKind};
use sprout::core::Controller;
use sprout::error::exit_codes;
use sprout::exercises::generator_for;
use sprout::scheduler::ReviewOutcome;
use sprout::storage::{open_adapter, PersistenceAdapter};

type CliResult = Result<ExitCode, Box<dyn std::error::Error>>;

// =============================================================================
// CLI Definition
// =============================================================================

/// Sprout - spaced-repetition notebook for short insights
#[derive(Parser)]
#[command(name = "sprout")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a new insight
    Add {
        /// The insight text (at least 10 characters)
        content: String,
        /// Personal note
        #[arg(long)]
        note: Option<String>,
        /// Where the insight came from
        #[arg(long)]
        source: Option<String>,
        /// Tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// List insights
    List {
        /// Only insights due now, highest priority first
        #[arg(long)]
        due: bool,
        /// Only mastered insights
        #[arg(long)]
        mastered: bool,
        /// Maximum number of results
        #[arg(long, short)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Show the dashboard
    Dashboard {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Review the highest-priority due insight
    Review {
        /// Record this outcome for the current insight
        #[arg(long, value_enum)]
        outcome: Option<OutcomeArg>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Practice exercises for an eligible insight (answers read from stdin)
    Practice {
        /// Practice this insight
        #[arg(long)]
        id: Option<String>,
        /// Seed for exercise generation
        #[arg(long)]
        seed: Option<u64>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Edit an insight
    Edit {
        /// Insight ID
        id: String,
        /// New content
        #[arg(long)]
        content: Option<String>,
        /// New note (empty to clear)
        #[arg(long)]
        note: Option<String>,
        /// New source (empty to clear)
        #[arg(long)]
        source: Option<String>,
        /// Replacement tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Delete an insight permanently
    Delete {
        /// Insight ID
        id: String,
        /// Confirm the deletion
        #[arg(long, short)]
        yes: bool,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Remove every insight
    Clear {
        /// Confirm removing everything
        #[arg(long, short)]
        yes: bool,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Replace the collection with a JSON export
    Import {
        /// Export file to read
        file: PathBuf,
        /// Confirm replacing the collection
        #[arg(long, short)]
        yes: bool,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Export the collection as JSON
    Export {
        /// File to write (stdout if omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Show or change settings
    Settings {
        /// Exercise generator to use
        #[arg(long, value_enum)]
        generator: Option<GeneratorArg>,
        /// User scope the collection is stored under
        #[arg(long)]
        scope: Option<String>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutcomeArg {
    /// Remembered well: advance a stage
    Remembered,
    /// Needs more review: same stage, rescheduled
    Struggled,
    /// Stop scheduling this insight
    Mastered,
}

impl From<OutcomeArg> for ReviewOutcome {
    fn from(arg: OutcomeArg) -> Self {
        match arg {
            OutcomeArg::Remembered => ReviewOutcome::Remembered,
            OutcomeArg::Struggled => ReviewOutcome::Struggled,
            OutcomeArg::Mastered => ReviewOutcome::Mastered,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum GeneratorArg {
    Basic,
    Enhanced,
}

impl From<GeneratorArg> for GeneratorKind {
    fn from(arg: GeneratorArg) -> Self {
        match arg {
            GeneratorArg::Basic => GeneratorKind::Basic,
            GeneratorArg::Enhanced => GeneratorKind::Enhanced,
        }
    }
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> ExitCode {
    setup_panic_handler();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("sprout error: {}", e);
            ExitCode::from(exit_codes::ERROR as u8)
        }
    }
}

/// Set up the global panic handler.
///
/// On panic, appends to ~/.sprout/crash.log and exits with code 3.
fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("sprout panic: {}", info);

        if let Some(crash_log) = crash_log_path() {
            if let Some(parent) = crash_log.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            if let Ok(mut file) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&crash_log)
            {
                let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
                let _ = writeln!(file, "[{}] {}", timestamp, info);
            }
        }

        std::process::exit(exit_codes::CRASH);
    }));
}

/// Install the stderr log subscriber.
///
/// `SPROUT_LOG` takes an `EnvFilter` directive; `--verbose` forces debug.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("SPROUT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // Fails only if a subscriber is already set
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Run the CLI and return the exit code.
fn run(cli: Cli) -> CliResult {
    let config = Config::load();

    match cli.command {
        Commands::Add {
            content,
            note,
            source,
            tags,
            json,
            quiet,
        } => run_add(&config, &content, note, source, tags, json, quiet),
        Commands::List {
            due,
            mastered,
            limit,
            json,
            quiet,
        } => run_list(&config, due, mastered, limit, json, quiet),
        Commands::Dashboard { json, quiet } => run_dashboard(&config, json, quiet),
        Commands::Review {
            outcome,
            json,
            quiet,
        } => run_review(&config, outcome.map(Into::into), json, quiet),
        Commands::Practice {
            id,
            seed,
            json,
            quiet,
        } => run_practice(&config, id, seed, json, quiet),
        Commands::Edit {
            id,
            content,
            note,
            source,
            tags,
            json,
            quiet,
        } => run_edit(&config, &id, content, note, source, tags, json, quiet),
        Commands::Delete {
            id,
            yes,
            json,
            quiet,
        } => run_delete(&config, &id, yes, json, quiet),
        Commands::Clear { yes, json, quiet } => run_clear(&config, yes, json, quiet),
        Commands::Import {
            file,
            yes,
            json,
            quiet,
        } => run_import(&config, file, yes, json, quiet),
        Commands::Export {
            output,
            json,
            quiet,
        } => run_export(&config, output, json, quiet),
        Commands::Settings {
            generator,
            scope,
            json,
            quiet,
        } => run_settings(generator.map(Into::into), scope, json, quiet),
    }
}

// =============================================================================
// Command Implementations
// =============================================================================

/// Convert a success boolean to an exit code.
fn success_to_exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::from(exit_codes::OK as u8)
    } else {
        ExitCode::from(exit_codes::ERROR as u8)
    }
}

/// Print formatted command output, if any.
fn print_formatted(formatted: &str) {
    if !formatted.is_empty() {
        println!("{}", formatted.trim_end_matches('\n'));
    }
}

/// Open the configured store and load the collection.
fn open_controller(
    config: &Config,
) -> Result<Controller<Box<dyn PersistenceAdapter>>, Box<dyn std::error::Error>> {
    let adapter = open_adapter(&config.storage)?;
    Ok(Controller::load(adapter, config.storage.scope.clone()))
}

#[allow(clippy::too_many_arguments)]
fn run_add(
    config: &Config,
    content: &str,
    note: Option<String>,
    source: Option<String>,
    tags: Vec<String>,
    json: bool,
    quiet: bool,
) -> CliResult {
    use sprout::cli::add::{AddCommand, AddOptions};

    let mut cmd = AddCommand::new(open_controller(config)?);
    let options = AddOptions {
        json,
        quiet,
        note,
        source,
        tags,
    };

    let output = cmd.run(content, &options);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_list(
    config: &Config,
    due: bool,
    mastered: bool,
    limit: Option<usize>,
    json: bool,
    quiet: bool,
) -> CliResult {
    use sprout::cli::list::{ListCommand, ListOptions};

    let cmd = ListCommand::new(open_controller(config)?);
    let options = ListOptions {
        json,
        quiet,
        due,
        mastered,
        limit,
    };

    let output = cmd.run(&options);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_dashboard(config: &Config, json: bool, quiet: bool) -> CliResult {
    use sprout::cli::dashboard_cmd::{DashboardCommand, DashboardOptions};

    let cmd = DashboardCommand::new(open_controller(config)?);
    let options = DashboardOptions { json, quiet };

    let output = cmd.run(&options);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_review(
    config: &Config,
    outcome: Option<ReviewOutcome>,
    json: bool,
    quiet: bool,
) -> CliResult {
    use sprout::cli::review::{ReviewCommand, ReviewOptions};

    let mut cmd = ReviewCommand::new(open_controller(config)?);
    let options = ReviewOptions {
        json,
        quiet,
        outcome,
    };

    let output = cmd.run(&options);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_practice(
    config: &Config,
    id: Option<String>,
    seed: Option<u64>,
    json: bool,
    quiet: bool,
) -> CliResult {
    use sprout::cli::practice::{PracticeCommand, PracticeOptions};

    let generator = generator_for(&config.exercises);
    let mut cmd = PracticeCommand::new(open_controller(config)?, generator);
    let options = PracticeOptions {
        json,
        quiet,
        id,
        seed,
    };

    let mut input = io::stdin().lock();
    let mut prompts = io::stdout();
    let output = cmd.run(&options, &mut input, &mut prompts);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

#[allow(clippy::too_many_arguments)]
fn run_edit(
    config: &Config,
    id: &str,
    content: Option<String>,
    note: Option<String>,
    source: Option<String>,
    tags: Vec<String>,
    json: bool,
    quiet: bool,
) -> CliResult {
    use sprout::cli::edit::{EditCommand, EditOptions};

    let mut cmd = EditCommand::new(open_controller(config)?);
    let options = EditOptions {
        json,
        quiet,
        content,
        note,
        source,
        tags: (!tags.is_empty()).then_some(tags),
    };

    let output = cmd.run(id, &options);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_delete(config: &Config, id: &str, yes: bool, json: bool, quiet: bool) -> CliResult {
    use sprout::cli::delete::{DeleteCommand, DeleteOptions};

    let mut cmd = DeleteCommand::new(open_controller(config)?);
    let options = DeleteOptions { json, quiet, yes };

    let output = cmd.run(id, &options);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_clear(config: &Config, yes: bool, json: bool, quiet: bool) -> CliResult {
    use sprout::cli::clear::{ClearCommand, ClearOptions};

    let mut cmd = ClearCommand::new(open_controller(config)?);
    let options = ClearOptions { json, quiet, yes };

    let output = cmd.run(&options);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_import(config: &Config, file: PathBuf, yes: bool, json: bool, quiet: bool) -> CliResult {
    use sprout::cli::import::{ImportCommand, ImportOptions};

    let mut cmd = ImportCommand::new(open_controller(config)?);
    let options = ImportOptions { json, quiet, yes };

    let output = cmd.run(&file, &options);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_export(config: &Config, output: Option<PathBuf>, json: bool, quiet: bool) -> CliResult {
    use sprout::cli::export::{ExportCommand, ExportOptions};

    let cmd = ExportCommand::new(open_controller(config)?);
    let options = ExportOptions {
        json,
        quiet,
        output,
    };

    let result = cmd.run(&options);
    print_formatted(&cmd.format_output(&result, &options));

    Ok(success_to_exit_code(result.success))
}

fn run_settings(
    generator: Option<GeneratorKind>,
    scope: Option<String>,
    json: bool,
    quiet: bool,
) -> CliResult {
    use sprout::cli::settings::{SettingsCommand, SettingsOptions};

    let cmd = SettingsCommand::new(sprout_home());
    let options = SettingsOptions {
        json,
        quiet,
        generator,
        scope,
    };

    let output = cmd.run(&options);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

// =============================================================================
// Tests
// =============================================================================
