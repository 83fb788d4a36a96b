use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;

use codeview_lib::config::Config;
use codeview_lib::exit_codes::{SUCCESS, TOOL_ERROR, exit};

mod commands;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path (default: nearest .codeview.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Format a file or stdin and print the result
    Format(commands::format::FormatArgs),

    /// Detect the language of a file, stdin, or a page
    Detect(commands::detect::DetectArgs),

    /// List supported languages and their backends
    Languages {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG applies unless --verbose asks for everything
    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {e:#}", "Error".red().bold());
            TOOL_ERROR
        }
    };

    match code {
        SUCCESS => exit::success(),
        TOOL_ERROR => exit::tool_error(),
        _ => exit::format_unavailable(),
    }
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Commands::Version => {
            commands::version::handle_version();
            Ok(SUCCESS)
        }
        Commands::Detect(args) => commands::detect::handle_detect(args).await,
        Commands::Format(args) => {
            let config = Config::load(cli.config.as_deref())?;
            commands::format::handle_format(args, &config).await
        }
        Commands::Languages { json } => {
            let config = Config::load(cli.config.as_deref())?;
            commands::languages::handle_languages(&config, json)?;
            Ok(SUCCESS)
        }
    }
}
