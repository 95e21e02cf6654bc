use miette::Result;
use owo_colors::OwoColorize;
use portrait_core::{
    Funnel, GenAiGenerator, PortraitGenerator, ReferralLinks, Store, UserId,
    config::PortraitConfig, trigger::STATUS_TARGET,
};

use crate::output::Output;

/// Show a user's collected answers
pub async fn status(config: &PortraitConfig, user_id: UserId) -> Result<()> {
    let output = Output::new();
    let store = Store::connect(&config.database).await?;

    output.section(&format!("User {}", user_id));
    let Some(user) = store.get_user(user_id).await? else {
        output.warning("Not registered");
        return Ok(());
    };

    output.kv(
        "Answers",
        &format!("{}/{}", user.answers_count, STATUS_TARGET)
            .bright_white()
            .to_string(),
    );
    output.kv(
        "Referred by",
        &user
            .referrer_id
            .map_or_else(|| "-".to_string(), |id| id.to_string()),
    );
    output.kv(
        "Portrait sent",
        if user.analysis_sent { "yes" } else { "no" },
    );
    if let Some(base) = &config.telegram.link_base {
        output.kv("Link", &ReferralLinks::new(base.as_str()).link_for(user_id));
    }

    let sets = store.answer_sets_for(user_id).await?;
    output.kv("Answer sets", &sets.len().to_string());
    println!();

    Ok(())
}

/// Print the prompt the next portrait would be generated from
pub async fn prompt(config: &PortraitConfig, user_id: UserId) -> Result<()> {
    let store = Store::connect(&config.database).await?;
    let portraits = PortraitGenerator::new(GenAiGenerator::new(&config.model.model), &config.model);
    let links = ReferralLinks::new(config.telegram.link_base.clone().unwrap_or_default());
    let funnel = Funnel::new(store, portraits, links);

    let prompt = funnel.preview_prompt(user_id).await?;
    println!("{}", prompt);

    Ok(())
}
