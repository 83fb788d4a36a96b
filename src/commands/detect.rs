//! Handler for the `detect` command.

use colored::*;
use std::path::PathBuf;

use codeview_lib::detect::{LanguageDetector, PageInfo, classify_page};
use codeview_lib::exit_codes::{FORMAT_UNAVAILABLE, SUCCESS};

/// Options of the `detect` subcommand.
#[derive(Debug, Default, clap::Args)]
pub struct DetectArgs {
    /// File to inspect; reads stdin when omitted
    pub path: Option<PathBuf>,

    /// Classify the text as a page served from this URL
    #[arg(long)]
    pub url: Option<String>,

    /// Content-Type the page was served with
    #[arg(long)]
    pub content_type: Option<String>,

    /// The page was rendered as a rich document rather than raw text
    #[arg(long)]
    pub rich: bool,

    /// Show the evidence for every matching language
    #[arg(long)]
    pub scores: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Detect the language of the input. Exits 1 when nothing was detected.
pub async fn handle_detect(args: DetectArgs) -> anyhow::Result<i32> {
    let text = super::read_input(args.path.as_deref()).await?;
    let detector = LanguageDetector::new();

    if args.url.is_some() || args.content_type.is_some() {
        let page = PageInfo {
            url: args.url.as_deref().unwrap_or_default(),
            content_type: args.content_type.as_deref(),
            text: &text,
            raw_document: !args.rich,
        };
        let verdict = classify_page(&page, &detector);
        if args.json {
            println!("{}", serde_json::to_string_pretty(&verdict)?);
        } else if let Some(language) = &verdict.language {
            println!("{} ({:?})", language.green().bold(), verdict.reason);
        } else {
            println!("{} ({:?})", "not code".dimmed(), verdict.reason);
        }
        return Ok(if verdict.is_code { SUCCESS } else { FORMAT_UNAVAILABLE });
    }

    if args.scores {
        let scores = detector.scores(&text);
        if args.json {
            println!("{}", serde_json::to_string_pretty(&scores)?);
        } else {
            for detection in &scores {
                let marker = if detection.is_candidate() { "*" } else { " " };
                println!(
                    "{marker} {:<12} score {:>3}  patterns {}",
                    detection.language, detection.score, detection.matched_patterns
                );
            }
        }
    }

    let file_name = args
        .path
        .as_ref()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let detection = detector.detect_file(&file_name, &text);

    if args.json && !args.scores {
        println!("{}", serde_json::to_string_pretty(&detection)?);
    } else if !args.scores {
        match &detection {
            Some(d) => println!("{}", d.language.green().bold()),
            None => println!("{}", "unknown".dimmed()),
        }
    }

    Ok(if detection.is_some() { SUCCESS } else { FORMAT_UNAVAILABLE })
}
