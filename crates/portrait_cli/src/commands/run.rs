use std::time::Duration;

use miette::Result;
use owo_colors::OwoColorize;
use portrait_core::{Funnel, GenAiGenerator, PortraitGenerator, Store, config::PortraitConfig};
use portrait_telegram::{TelegramApi, TelegramBot, bot::resolve_links};

use crate::output::Output;

/// Connect everything and poll until Ctrl-C
pub async fn run(config: &PortraitConfig) -> Result<()> {
    let output = Output::new();

    let token = config.telegram.require_token()?;
    let poll_timeout = Duration::from_secs(config.telegram.poll_timeout_secs);
    let api = TelegramApi::new(token, &config.telegram.api_url, poll_timeout)?;
    let links = resolve_links(&config.telegram, &api).await?;

    let store = Store::connect(&config.database).await?;
    let portraits = PortraitGenerator::new(GenAiGenerator::new(&config.model.model), &config.model);

    output.section("Portrait bot");
    output.kv("Model", &config.model.model.bright_yellow().to_string());
    output.kv("Links", links.base());
    output.status("Press Ctrl-C to stop");

    let bot = TelegramBot::new(api, Funnel::new(store, portraits, links), poll_timeout);
    bot.run().await?;

    output.success("Stopped");
    Ok(())
}
