//! The referral funnel: one inbound event in, the replies to send out
//!
//! Transport crates translate platform updates into [`Inbound`] events and
//! deliver the returned [`Outgoing`] messages in order.

use crate::interview::{AnswerOutcome, CompletedInterview, SessionStore};
use crate::portrait::{PortraitGenerator, TextGenerator};
use crate::referral::{Referral, ReferralLinks};
use crate::trigger::{STATUS_TARGET, should_fire};
use crate::{Result, Store, UserId, texts};

/// An event from the messaging platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Entry command with its optional argument
    Start {
        from: UserId,
        argument: Option<String>,
    },
    /// Status command
    Status { from: UserId },
    /// Any message that is not a command
    Text { from: UserId, text: String },
}

impl Inbound {
    pub fn sender(&self) -> UserId {
        match self {
            Inbound::Start { from, .. } | Inbound::Status { from } | Inbound::Text { from, .. } => {
                *from
            }
        }
    }
}

/// A message to deliver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub recipient: UserId,
    pub text: String,
}

impl Outgoing {
    pub fn new(recipient: UserId, text: impl Into<String>) -> Self {
        Self {
            recipient,
            text: text.into(),
        }
    }
}

pub struct Funnel<G> {
    store: Store,
    sessions: SessionStore,
    portraits: PortraitGenerator<G>,
    links: ReferralLinks,
}

impl<G: TextGenerator> Funnel<G> {
    pub fn new(store: Store, portraits: PortraitGenerator<G>, links: ReferralLinks) -> Self {
        Self {
            store,
            sessions: SessionStore::new(),
            portraits,
            links,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn links(&self) -> &ReferralLinks {
        &self.links
    }

    /// Process one event to completion
    ///
    /// Storage failures abort the event and are returned; writes already made
    /// are not rolled back.
    pub async fn handle(&self, event: Inbound) -> Result<Vec<Outgoing>> {
        match event {
            Inbound::Start { from, argument } => {
                Ok(vec![self.start(from, argument.as_deref()).await?])
            }
            Inbound::Status { from } => Ok(vec![self.status(from).await?]),
            Inbound::Text { from, text } => self.answer(from, text).await,
        }
    }

    async fn start(&self, from: UserId, argument: Option<&str>) -> Result<Outgoing> {
        let referral = Referral::parse(argument);
        self.store.register_user(from, referral.referrer()).await?;

        match referral {
            Referral::Valid(referrer) => {
                tracing::debug!("Friend {} starts interview about {}", from, referrer);
                let first = self.sessions.begin(from, referrer);
                Ok(Outgoing::new(from, texts::interview_intro(first)))
            }
            Referral::NoReferral => {
                Ok(Outgoing::new(from, texts::welcome(&self.links.link_for(from))))
            }
        }
    }

    async fn status(&self, from: UserId) -> Result<Outgoing> {
        let text = match self.store.answers_count(from).await? {
            Some(count) => texts::status(count, STATUS_TARGET),
            None => texts::NOT_REGISTERED.to_string(),
        };
        Ok(Outgoing::new(from, text))
    }

    async fn answer(&self, from: UserId, text: String) -> Result<Vec<Outgoing>> {
        match self.sessions.record_answer(from, text) {
            AnswerOutcome::NoSession => Ok(Vec::new()),
            AnswerOutcome::NextQuestion(question) => Ok(vec![Outgoing::new(from, question)]),
            AnswerOutcome::Complete(interview) => self.complete(interview).await,
        }
    }

    async fn complete(&self, interview: CompletedInterview) -> Result<Vec<Outgoing>> {
        let CompletedInterview {
            referrer, friend, ..
        } = interview;

        self.store.save_answer_set(&interview).await?;
        let count = self.store.increment_answers(referrer).await?;
        tracing::info!(
            "Interview by {} about {} complete, {} answers collected",
            friend,
            referrer,
            count
        );

        let mut outgoing = Vec::with_capacity(2);
        if should_fire(count) {
            outgoing.push(self.analyze(referrer, count).await?);
        }
        outgoing.push(Outgoing::new(
            friend,
            texts::reshare(&self.links.link_for(friend)),
        ));
        Ok(outgoing)
    }

    /// Generate a portrait of `user` from every answer set collected so far
    ///
    /// A generation failure becomes the apology notice; the threshold is not
    /// replayed. `analysis_sent` is set only after a successful generation.
    pub async fn analyze(&self, user: UserId, count: u32) -> Result<Outgoing> {
        let sets = self.store.answer_sets_for(user).await?;
        tracing::info!("Generating portrait for {} at {} answers", user, count);

        match self.portraits.generate(count, &sets).await {
            Ok(portrait) => {
                // The portrait is delivered even if the flag cannot be written
                if let Err(e) = self.store.mark_analysis_sent(user).await {
                    tracing::error!("Failed to flag portrait for {} as sent: {}", user, e);
                }
                Ok(Outgoing::new(user, texts::portrait_ready(&portrait)))
            }
            Err(e) => {
                tracing::error!("Portrait generation for {} failed: {}", user, e);
                Ok(Outgoing::new(user, texts::FAILURE_NOTICE))
            }
        }
    }

    /// The prompt [`Funnel::analyze`] would send right now
    pub async fn preview_prompt(&self, user: UserId) -> Result<String> {
        let count = self
            .store
            .answers_count(user)
            .await?
            .ok_or(crate::CoreError::UserNotFound { user_id: user })?;
        let sets = self.store.answer_sets_for(user).await?;
        Ok(self.portraits.request_for(count, &sets).prompt)
    }
}
