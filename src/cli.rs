use std::path::{Path, PathBuf};

mod check;
mod export;
mod list;
mod show;
mod terminal;

use check::Check;
use clap::ArgAction;
use export::Export;
use list::List;
use reqkit::Config;
use show::Show;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The directory containing the requirements documents
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command
            .unwrap_or_else(|| Command::Check(Check::default()))
            .run(&self.root)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Parse every document and report errors (default)
    Check(Check),

    /// Print a document as canonical ReqsML
    Export(Export),

    /// Show the parsed model of a document
    Show(Show),

    /// List example cases and whether a label expression selects them
    List(List),
}

impl Command {
    fn run(self, root: &Path) -> anyhow::Result<()> {
        match self {
            Self::Check(command) => command.run(root),
            Self::Export(command) => command.run(root),
            Self::Show(command) => command.run(root),
            Self::List(command) => command.run(root),
        }
    }
}

/// Loads `<root>/.reqs/config.toml`, falling back to the defaults.
fn load_config(root: &Path) -> Config {
    let path = root.join(".reqs").join("config.toml");
    if !path.exists() {
        tracing::debug!("No config file at {}, using defaults", path.display());
        return Config::default();
    }
    Config::load(&path).unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {e}");
        Config::default()
    })
}

/// The documents named on the command line, or every document under
/// `root` when none are.
fn resolve_paths(root: &Path, paths: &[PathBuf]) -> Vec<PathBuf> {
    if paths.is_empty() {
        reqkit::storage::discover(root)
    } else {
        paths.iter().map(|path| root.join(path)).collect()
    }
}
