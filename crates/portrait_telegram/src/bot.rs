//! Long-polling bot loop

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use portrait_core::config::TelegramConfig;
use portrait_core::{Funnel, Inbound, Outgoing, ReferralLinks, TextGenerator, UserId, texts};

use crate::command::{Command, parse_command};
use crate::types::Update;
use crate::{Result, TelegramApi};

const MIN_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Referral links from config, or from the bot's own username
pub async fn resolve_links(config: &TelegramConfig, api: &TelegramApi) -> Result<ReferralLinks> {
    if let Some(base) = config.link_base.as_deref().filter(|b| !b.trim().is_empty()) {
        return Ok(ReferralLinks::new(base));
    }

    let me = api.get_me().await?;
    match me.username {
        Some(username) => {
            tracing::info!("Connected as @{}", username);
            Ok(ReferralLinks::for_bot(&username))
        }
        None => Err(crate::TelegramError::MalformedResponse {
            method: "getMe".to_string(),
        }),
    }
}

/// Translate an update into a funnel event
///
/// Only text messages in private chats with a known sender are dispatched.
pub fn update_to_inbound(update: &Update) -> Option<Inbound> {
    let message = update.message.as_ref()?;
    if !message.chat.is_private() {
        return None;
    }
    let from = UserId::new(message.from.as_ref()?.id);
    let text = message.text.as_deref()?;

    match parse_command(text) {
        Command::Start(argument) => Some(Inbound::Start { from, argument }),
        Command::Status => Some(Inbound::Status { from }),
        Command::Unknown(name) => {
            tracing::debug!("Ignoring unknown command /{} from {}", name, from);
            None
        }
        Command::Text(text) => Some(Inbound::Text { from, text }),
    }
}

pub struct TelegramBot<G> {
    api: TelegramApi,
    funnel: Arc<Funnel<G>>,
    poll_timeout: Duration,
}

impl<G: TextGenerator + 'static> TelegramBot<G> {
    pub fn new(api: TelegramApi, funnel: Funnel<G>, poll_timeout: Duration) -> Self {
        Self {
            api,
            funnel: Arc::new(funnel),
            poll_timeout,
        }
    }

    pub fn funnel(&self) -> &Funnel<G> {
        &self.funnel
    }

    /// Poll until Ctrl-C
    pub async fn run(&self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Poll until `shutdown` resolves
    ///
    /// Authentication failures end the loop; every other polling error is
    /// retried with exponential backoff.
    pub async fn run_until(&self, shutdown: impl Future<Output = ()>) -> Result<()> {
        tokio::pin!(shutdown);
        let mut offset: Option<i64> = None;
        let mut backoff = MIN_BACKOFF;

        tracing::info!("Polling for updates");
        loop {
            let updates = tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutting down");
                    return Ok(());
                }
                polled = self.api.get_updates(offset, self.poll_timeout) => polled,
            };

            let updates = match updates {
                Ok(updates) => {
                    backoff = MIN_BACKOFF;
                    updates
                }
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    tracing::warn!("getUpdates failed, retrying in {:?}: {}", backoff, e);
                    tokio::select! {
                        _ = &mut shutdown => return Ok(()),
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                    continue;
                }
            };

            if let Some(last) = updates.iter().map(|u| u.update_id).max() {
                offset = Some(last + 1);
            }
            self.dispatch(&updates);
        }
    }

    /// Spawn one task per sender so a sender's messages keep their order
    fn dispatch(&self, updates: &[Update]) {
        let mut by_sender: BTreeMap<UserId, Vec<Inbound>> = BTreeMap::new();
        for inbound in updates.iter().filter_map(update_to_inbound) {
            by_sender.entry(inbound.sender()).or_default().push(inbound);
        }

        for (sender, events) in by_sender {
            let funnel = Arc::clone(&self.funnel);
            let api = self.api.clone();
            tokio::spawn(async move {
                for event in events {
                    let replies = match funnel.handle(event).await {
                        Ok(replies) => replies,
                        Err(e) => {
                            tracing::error!("Failed to handle message from {}: {}", sender, e);
                            vec![Outgoing::new(sender, texts::FAILURE_NOTICE)]
                        }
                    };
                    deliver(&api, replies).await;
                }
            });
        }
    }
}

async fn deliver(api: &TelegramApi, replies: Vec<Outgoing>) {
    for reply in replies {
        if let Err(e) = api.send_message(reply.recipient.get(), &reply.text).await {
            tracing::warn!("Could not deliver message to {}: {}", reply.recipient, e);
        }
    }
}
