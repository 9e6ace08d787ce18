//! `safeguard init`: write a starter configuration file.
//!
//! Creates `.safeguard.yaml` in the current directory (or at `--output`)
//! from one of the built-in templates.

use crate::config::{defaults, Config, PROJECT_FILE_NAME};
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

/// Run the `safeguard init` command.
pub fn run_init(template: &str, output_path: Option<&Path>, force: bool) -> Result<()> {
    let output_file = match output_path {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir()
            .context("Failed to get current directory")?
            .join(PROJECT_FILE_NAME),
    };

    if output_file.exists() && !force {
        println!(
            "{} A configuration file already exists at {}",
            "⚠".yellow(),
            output_file.display()
        );
        println!("  Use --force to overwrite it, or edit it directly.");
        return Ok(());
    }

    let yaml_content = defaults::get_template(template).ok_or_else(|| {
        let available: Vec<String> = defaults::available_templates()
            .iter()
            .map(|(name, desc)| format!("  {} - {}", name.bold(), desc))
            .collect();
        anyhow::anyhow!(
            "Unknown template '{}'. Available templates:\n{}",
            template,
            available.join("\n")
        )
    })?;

    let config = Config::from_yaml(yaml_content)
        .with_context(|| format!("Template '{}' is invalid", template))?;

    write_config(&output_file, yaml_content)?;

    println!();
    println!(
        "  {} Created {}",
        "✓".green().bold(),
        output_file.display().to_string().bold()
    );
    println!();
    println!("  Template: {}", template.cyan());
    println!("  Server:   {}", config.server.base_url.cyan());
    println!(
        "  Fallback: {}",
        if config.demo.fallback {
            "placeholder data when the server is down"
        } else {
            "none, errors are shown as-is"
        }
    );
    println!();
    println!("  {} Next steps:", "→".blue());
    println!(
        "    1. Set the server URL and token: {}",
        format!("$EDITOR {}", output_file.display()).dimmed()
    );
    println!("    2. Validate it: {}", "safeguard check".dimmed());
    println!("    3. Open the console: {}", "safeguard".dimmed());
    println!();

    Ok(())
}

fn write_config(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write configuration file: {}", path.display()))
}
