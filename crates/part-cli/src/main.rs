use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

/// Generate printable parts from measure presets.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log more (debug level) unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the part types and the presets available for them
    List {
        /// Also look for preset files in this directory
        #[arg(long)]
        preset_dir: Option<PathBuf>,
    },

    /// Print the default measures of a part as a preset file
    Defaults {
        part: String,
    },

    /// Build a part and optionally export it
    Build(BuildArgs),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum KernelChoice {
    Mock,
    Truck,
}

#[derive(clap::Args, Debug)]
pub struct BuildArgs {
    /// Part type, as printed by `list`
    pub part: String,

    /// Bundled preset name, or a path to a preset file
    #[arg(short, long)]
    pub preset: Option<String>,

    #[arg(short, long, value_enum, default_value = "mock")]
    pub kernel: KernelChoice,

    /// Boolean overlap slack, overriding the preset's settings
    #[arg(short, long)]
    pub tolerance: Option<f64>,

    /// Send intermediate shapes to the log
    #[arg(short, long)]
    pub debug: bool,

    /// Name of an `.stl` file to write
    #[arg(long)]
    pub stl: Option<PathBuf>,

    /// Write ASCII instead of binary STL
    #[arg(long, requires = "stl")]
    pub ascii: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match args.command {
        Command::List { preset_dir } => commands::list(preset_dir.as_deref()),
        Command::Defaults { part } => commands::defaults(&part),
        Command::Build(build) => commands::build(&build),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", commands::describe_failure(&e));
            ExitCode::FAILURE
        }
    }
}
