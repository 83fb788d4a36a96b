//! Handler for the `format` command.

use anyhow::Context;
use colored::*;
use serde_json::{Map, Value};
use std::path::PathBuf;

use codeview_lib::config::Config;
use codeview_lib::detect::LanguageDetector;
use codeview_lib::exit_codes::{FORMAT_UNAVAILABLE, SUCCESS};
use codeview_lib::settings::RawSettings;

/// Options of the `format` subcommand.
#[derive(Debug, Default, clap::Args)]
pub struct FormatArgs {
    /// File to format; reads stdin when omitted
    pub path: Option<PathBuf>,

    /// Language of the input; detected from the file name or content when omitted
    #[arg(short, long)]
    pub language: Option<String>,

    /// Indentation width, or "tab"
    #[arg(long)]
    pub indent: Option<String>,

    /// Prefer single quotes
    #[arg(long)]
    pub single_quote: bool,

    /// Maximum line width, 0 for unlimited
    #[arg(long)]
    pub line_wrap: Option<u64>,

    /// Print the cache statistics to stderr afterwards
    #[arg(long)]
    pub stats: bool,
}

impl FormatArgs {
    /// Settings given on the command line, as the same key-value bag a
    /// request carries.
    fn settings(&self) -> anyhow::Result<RawSettings> {
        let mut bag = Map::new();
        if let Some(indent) = &self.indent {
            bag.insert("indentSize".to_string(), Value::String(indent.clone()));
        }
        if self.single_quote {
            bag.insert("singleQuote".to_string(), Value::Bool(true));
        }
        if let Some(width) = self.line_wrap {
            bag.insert("lineWrap".to_string(), Value::from(width));
        }
        RawSettings::from_value(&Value::Object(bag)).context("Invalid command line settings")
    }
}

/// Format the input and print the result. Returns the exit code.
pub async fn handle_format(args: FormatArgs, config: &Config) -> anyhow::Result<i32> {
    let code = super::read_input(args.path.as_deref()).await?;
    let settings = config.settings.merged_with(&args.settings()?);

    let language = match &args.language {
        Some(language) => language.clone(),
        None => {
            let file_name = args
                .path
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            match LanguageDetector::new().detect_file(&file_name, &code) {
                Some(detection) => {
                    log::debug!("Detected {} via {:?}", detection.language, detection.source);
                    detection.language.to_string()
                }
                None => {
                    print!("{code}");
                    eprintln!(
                        "{}: Could not detect the language; pass --language",
                        "Warning".yellow().bold()
                    );
                    return Ok(FORMAT_UNAVAILABLE);
                }
            }
        }
    };

    let service = codeview_lib::service_from_config(config);
    let result = service.format_code(&code, &language, &settings).await;
    print!("{}", result.code);

    if args.stats {
        let stats = service.cache_stats();
        eprintln!(
            "cache: {} hits, {} misses, {} writes, {} evictions",
            stats.hits, stats.misses, stats.writes, stats.evictions
        );
    }

    match result.error {
        None => Ok(SUCCESS),
        Some(err) => {
            eprintln!("{} [{}]: {}", "Warning".yellow().bold(), err.kind, err);
            Ok(FORMAT_UNAVAILABLE)
        }
    }
}
