#![forbid(unsafe_code)]

pub mod actions;
pub mod menu;

use std::io::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory as _, Parser, Subcommand};

use crate::cli::actions::App;
use crate::config;
use crate::core::datetime::DateNormalizer;
use crate::error::LisaError;
use crate::logging;
use crate::task::storage::TaskStore;

#[derive(Debug, Parser)]
#[command(
    name = "lisa",
    version,
    about = "Local Intelligent Scheduling Assistant: tasks and due-date reminders"
)]
pub struct Cli {
    /// Task file to use instead of storage.data_file
    #[arg(long = "data-file", global = true)]
    pub data_file: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Add a new task
    Add(AddArgs),
    /// List tasks
    #[command(alias = "ls")]
    List(ListArgs),
    /// Remove a task by ID
    #[command(alias = "rm")]
    Remove(IdArgs),
    /// Remove every task
    Clear,
    /// Mark a task as acknowledged so it stops reminding
    Ack(IdArgs),
    /// Export tasks to JSON or CSV
    Export(ExportArgs),
    /// Import tasks from JSON or CSV
    Import(ImportArgs),
    /// Show reminders for tasks due in a time window
    CheckReminders(CheckRemindersArgs),
    /// Interactive menu
    Menu,
    Config(ConfigArgs),
    Completion(CompletionArgs),
    Version,
}

#[derive(Debug, Clone, Parser)]
pub struct AddArgs {
    /// Task description
    pub text: String,
    /// Task module (work, home, study)
    #[arg(short = 'm', long = "module")]
    pub module: Option<String>,
    /// Due date, e.g. 2024-06-01, "tomorrow 14:30", "in 3 days"
    #[arg(short = 'd', long = "due")]
    pub due: Option<String>,
    /// Priority (low, medium, high)
    #[arg(short = 'p', long = "priority")]
    pub priority: Option<String>,
    /// Add even if the same task already exists in the module
    #[arg(short = 'f', long = "force")]
    pub force: bool,
}

#[derive(Debug, Clone, Default, Parser)]
pub struct ListArgs {
    /// Filter by module
    #[arg(short = 'm', long = "module")]
    pub module: Option<String>,
    /// Output in JSON format
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Debug, Clone, Parser)]
pub struct IdArgs {
    /// Task ID
    pub id: u64,
}

#[derive(Debug, Clone, Default, Parser)]
pub struct ExportArgs {
    /// json or csv (default: from the output extension, else json)
    #[arg(long = "format")]
    pub format: Option<String>,
    /// Output file (default: tasks_export.<format>)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Parser)]
pub struct ImportArgs {
    /// File to import
    #[arg(long = "file")]
    pub file: PathBuf,
    /// json or csv (default: from the file extension)
    #[arg(long = "format")]
    pub format: Option<String>,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Default, Parser)]
pub struct CheckRemindersArgs {
    /// Window start (default: now minus reminders.window_seconds)
    #[arg(long = "since")]
    pub since: Option<String>,
    /// Window end (default: now)
    #[arg(long = "until")]
    pub until: Option<String>,
    /// Cooldown between reminders for the same task, in seconds
    #[arg(long = "interval")]
    pub interval: Option<i64>,
    /// Ignore the cooldown
    #[arg(long = "all")]
    pub all: bool,
    /// Show what would fire without saving anything
    #[arg(long = "dry-run")]
    pub dry_run: bool,
    /// Also show skipped tasks
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
    /// Output outcomes as JSON
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct CompletionArgs {
    pub shell: clap_complete::Shell,
}

#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub cmd: ConfigCmd,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCmd {
    List,
    Set(ConfigSetArgs),
    Get(ConfigGetArgs),
}

#[derive(Debug, Parser)]
pub struct ConfigSetArgs {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Parser)]
pub struct ConfigGetArgs {
    pub key: String,
}

pub fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err:#}");
            eprintln!("{err:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.cmd {
        None => {
            Cli::command().print_help()?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Completion(args)) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "lisa", &mut std::io::stdout());
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Version) => Ok(cmd_version()),
        Some(Commands::Config(args)) => cmd_config(args),
        Some(cmd) => {
            let app = bootstrap(cli.data_file)?;
            let mut out = std::io::stdout().lock();
            let result = match cmd {
                Commands::Add(a) => app.add(&a, &mut out),
                Commands::List(a) => app.list(&a, &mut out),
                Commands::Remove(a) => app.remove(a.id, &mut out),
                Commands::Clear => app.clear(&mut out),
                Commands::Ack(a) => app.acknowledge(a.id, &mut out),
                Commands::Export(a) => app.export(&a, &mut out),
                Commands::Import(a) => app.import(&a, &mut out),
                Commands::CheckReminders(a) => app.check_reminders(&a, &mut out),
                Commands::Menu => {
                    drop(out);
                    return menu::run_interactive(&app).map(|()| ExitCode::SUCCESS);
                }
                Commands::Completion(_) | Commands::Version | Commands::Config(_) => Ok(()),
            };
            report(result, &mut out)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Prints errors the user can act on and swallows them; anything else is
/// passed up.
pub fn report(result: anyhow::Result<()>, out: &mut dyn std::io::Write) -> anyhow::Result<()> {
    let Err(err) = result else {
        return Ok(());
    };
    match err.downcast_ref::<LisaError>() {
        Some(e) if e.is_user_facing() => {
            tracing::info!("rejected: {e}");
            writeln!(out, "[!] {e}")?;
            Ok(())
        }
        _ => Err(err),
    }
}

fn bootstrap(data_file: Option<PathBuf>) -> anyhow::Result<App> {
    // Resolve the local offset first: it is only reliable while the process
    // is still single-threaded.
    let normalizer = DateNormalizer::local();

    let (cfg, _paths) = config::load()?;
    // Without a usable log file the command still runs, just unlogged.
    if let Ok(log_file) = config::expand_path(&cfg.logging.file) {
        let _ = logging::init(&log_file, &cfg.logging.level);
    }

    let data_file = match data_file {
        Some(p) => p,
        None => config::expand_path(&cfg.storage.data_file)?,
    };
    let store = TaskStore::new(data_file);
    tracing::debug!(store = %store.path().display(), "starting");

    Ok(App::new(cfg, store, normalizer)
        .with_env_interval(std::env::var(config::INTERVAL_ENV).ok()))
}

fn cmd_config(args: ConfigArgs) -> anyhow::Result<ExitCode> {
    match args.cmd {
        ConfigCmd::List => {
            print!("{}", config::list_resolved_toml()?);
        }
        ConfigCmd::Set(set) => {
            config::set_value_string(&set.key, &set.value)?;
            println!("Set {} = {}", set.key, set.value);
        }
        ConfigCmd::Get(get) => match config::get_value_string(&get.key)? {
            Some(v) => println!("{v}"),
            None => anyhow::bail!(
                "configuration key '{}' not found - use 'lisa config list' to see available keys",
                get.key
            ),
        },
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_version() -> ExitCode {
    println!("lisa version {}", env!("CARGO_PKG_VERSION"));
    println!("  rust: {}", rustc_version_runtime::version());
    println!(
        "  os/arch: {}/{}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    ExitCode::SUCCESS
}
