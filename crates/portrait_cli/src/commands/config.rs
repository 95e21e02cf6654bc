use miette::{IntoDiagnostic, Result};
use owo_colors::OwoColorize;
use portrait_core::config::{self, PortraitConfig};
use std::path::Path;

use crate::output::Output;

/// Show current configuration
pub fn show(config: &PortraitConfig) -> Result<()> {
    let output = Output::new();

    output.section("Current Configuration");
    println!();

    // The token is skipped when empty, so mask it before printing
    let mut shown = config.clone();
    if !shown.telegram.token.is_empty() {
        shown.telegram.token = "********".to_string();
    }
    let toml_str = toml::to_string_pretty(&shown).into_diagnostic()?;
    println!("{}", toml_str);

    Ok(())
}

/// Save current configuration to file
pub async fn save(config: &PortraitConfig, path: &Path) -> Result<()> {
    let output = Output::new();

    output.info(
        "💾",
        &format!("Saving configuration to: {}", path.display()),
    );

    config::save_config(config, path).await?;

    output.success("Configuration saved successfully!");
    if !config.telegram.token.is_empty() {
        output.warning("The file contains the bot token; keep it out of version control");
    }
    println!();
    println!("To use this configuration, run:");
    println!("  {} --config {} run", "portrait".bright_green(), path.display());

    Ok(())
}
