use miette::Result;
use owo_colors::OwoColorize;
use portrait_core::{Store, config::PortraitConfig};

use crate::output::Output;

/// Show database statistics
pub async fn stats(config: &PortraitConfig) -> Result<()> {
    let output = Output::new();
    let store = Store::connect(&config.database).await?;
    let stats = store.stats().await?;

    output.section("Database Statistics");
    output.kv("Endpoint", &config.database.endpoint());
    output.kv("Users", &stats.users.to_string().bright_white().to_string());
    output.kv(
        "Answer sets",
        &stats.answer_sets.to_string().bright_white().to_string(),
    );
    println!();

    Ok(())
}
