//! Categorize command - extract issue tags from inspector notes

use anyhow::{Context, Result};
use fleet_inspect_domain::{categorize_observations, observations::max_severity};
use std::io::{self, Read};

use crate::args::CategorizeArgs;

pub async fn execute(args: CategorizeArgs) -> Result<()> {
    let text = get_input_text(&args)?;

    let tags = categorize_observations(&text);
    tracing::debug!(text_length = text.len(), tags = tags.len(), "Categorized text");

    if args.json {
        let json = serde_json::to_string_pretty(&tags).context("Failed to serialize output")?;
        println!("{}", json);
        return Ok(());
    }

    if tags.is_empty() {
        println!("No issues matched.");
        return Ok(());
    }

    println!("Observation Tags");
    println!("================");
    println!();
    for tag in &tags {
        println!(
            "  - {} [{}, {}]: {}",
            tag.category,
            tag.area.as_str(),
            tag.severity,
            tag.description
        );
    }
    if let Some(severity) = max_severity(&tags) {
        println!();
        println!("Highest severity: {}", severity);
    }

    Ok(())
}

fn get_input_text(args: &CategorizeArgs) -> Result<String> {
    if let Some(ref text) = args.text {
        return Ok(text.clone());
    }

    match args.file.as_deref() {
        Some(path) if path.as_os_str() == "-" => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            Ok(buffer)
        }
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display())),
        None => anyhow::bail!("Provide --text or --file"),
    }
}
