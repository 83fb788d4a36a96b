//! Handler for the `languages` command.

use colored::*;

use codeview_lib::config::Config;

/// List every supported language and the backend bound to it.
pub fn handle_languages(config: &Config, json: bool) -> anyhow::Result<()> {
    let service = codeview_lib::service_from_config(config);
    let registry = service.registry();

    if json {
        let rows: Vec<_> = registry
            .supported_languages()
            .into_iter()
            .filter_map(|language| {
                let backend = registry.get_formatter_for(&language)?;
                Some(serde_json::json!({
                    "language": language,
                    "backend": backend.metadata(),
                    "available": backend.is_available(),
                }))
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for language in registry.supported_languages() {
        let Some(backend) = registry.get_formatter_for(&language) else {
            continue;
        };
        let name = if backend.is_available() {
            backend.metadata().name.normal()
        } else {
            format!("{} (unavailable)", backend.metadata().name).dimmed()
        };
        println!("{:<12} {}", language.bold(), name);
    }
    Ok(())
}
