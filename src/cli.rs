//! The `reqmap` command surface.

use std::path::{Path, PathBuf};

mod check;
mod render;
mod terminal;
mod validate;

use check::Check;
use clap::ArgAction;
use render::Render;
use reqmap::{
    domain::{Config, ParseMode, RequirementIndex},
    storage::{self, LoadReport},
};
use validate::Validate;

/// Requirements traceability maps from tabular sources.
#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The folder containing the requirement sources (.tsv exports)
    #[arg(short, long, default_value = "sources", global = true)]
    directory: PathBuf,

    /// Path to the YAML configuration (attribute schema and styles)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Be less permissive when parsing requirements. By default the parser
    /// works around bad attribute values using defaults, prefixes and
    /// aliases.
    #[arg(short = 'S', long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    /// Runs the selected command. Rendering is the default.
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let config = load_config(self.config.as_deref())?;
        let mode = if self.strict {
            ParseMode::Strict
        } else {
            ParseMode::Lenient
        };
        let context = Context {
            directory: self.directory,
            config,
            mode,
        };

        self.command
            .unwrap_or_else(|| Command::Render(Render::default()))
            .run(&context)
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
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

/// The available subcommands.
#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Render traceability mind maps (default)
    Render(Render),

    /// Scan requirement texts for semantic duplicates
    Check(Check),

    /// Report orphans, missing links, duplicates and cycles without
    /// rendering
    Validate(Validate),
}

impl Command {
    fn run(self, context: &Context) -> anyhow::Result<()> {
        match self {
            Self::Render(command) => command.run(context)?,
            Self::Check(command) => command.run(context)?,
            Self::Validate(command) => command.run(context)?,
        }
        Ok(())
    }
}

/// Everything the commands share: source location, configuration and parse
/// mode.
#[derive(Debug)]
pub struct Context {
    directory: PathBuf,
    config: Config,
    mode: ParseMode,
}

impl Context {
    /// Loads and merges every source under the configured directory.
    fn load_index(&self) -> anyhow::Result<(RequirementIndex, LoadReport)> {
        let (index, report) =
            storage::load_directory(&self.directory, &self.config.attributes, self.mode)?;
        Ok((index, report))
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        // an explicitly requested configuration must load
        Some(path) => Ok(Config::load(path)?),
        None => {
            let default_path = Path::new("config.yaml");
            if default_path.exists() {
                Ok(Config::load(default_path)?)
            } else {
                tracing::debug!("no config.yaml found, using the built-in configuration");
                Ok(Config::default())
            }
        }
    }
}
