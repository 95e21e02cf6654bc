//! Friend interview state machine
//!
//! Each friend who follows a referral link gets one in-memory session that
//! walks through the five questions. Sessions live only as long as the
//! process: a restart drops every half-finished interview.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::UserId;
use crate::texts::{QUESTION_COUNT, QUESTIONS};

/// Where a friend currently is in the interview
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// Waiting for the answer to question `k` (zero based)
    AwaitingAnswer(usize),
}

/// An in-flight interview
#[derive(Debug, Clone)]
struct FriendSession {
    referrer: UserId,
    answers: Vec<String>,
}

impl FriendSession {
    fn question_index(&self) -> usize {
        self.answers.len()
    }
}

/// All five answers one friend gave about one referring user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedInterview {
    pub referrer: UserId,
    pub friend: UserId,
    pub answers: [String; QUESTION_COUNT],
}

/// What recording a free-text message did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// The sender has no interview running; the message is ignored
    NoSession,
    /// Answer stored, this question comes next
    NextQuestion(&'static str),
    /// That was the last answer; the session is gone
    Complete(CompletedInterview),
}

/// Sessions keyed by the friend answering
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<UserId, FriendSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an interview about `referrer`, replacing any session the friend had
    ///
    /// Returns the first question.
    pub fn begin(&self, friend: UserId, referrer: UserId) -> &'static str {
        let previous = self.sessions.insert(
            friend,
            FriendSession {
                referrer,
                answers: Vec::with_capacity(QUESTION_COUNT),
            },
        );
        if let Some(previous) = previous {
            tracing::debug!(
                "Discarding interview of {} about {} at question {}",
                friend,
                previous.referrer,
                previous.question_index()
            );
        }
        QUESTIONS[0]
    }

    /// Record `text` verbatim as the answer to the friend's current question
    pub fn record_answer(&self, friend: UserId, text: impl Into<String>) -> AnswerOutcome {
        let Entry::Occupied(mut entry) = self.sessions.entry(friend) else {
            return AnswerOutcome::NoSession;
        };

        let session = entry.get_mut();
        session.answers.push(text.into());
        let index = session.question_index();
        if index < QUESTION_COUNT {
            return AnswerOutcome::NextQuestion(QUESTIONS[index]);
        }

        let FriendSession { referrer, answers } = entry.remove();
        match <[String; QUESTION_COUNT]>::try_from(answers) {
            Ok(answers) => AnswerOutcome::Complete(CompletedInterview {
                referrer,
                friend,
                answers,
            }),
            // Unreachable while the index check above holds
            Err(answers) => {
                tracing::warn!(
                    "Dropping interview of {} with {} answers",
                    friend,
                    answers.len()
                );
                AnswerOutcome::NoSession
            }
        }
    }

    pub fn state(&self, friend: UserId) -> SessionState {
        match self.sessions.get(&friend) {
            Some(session) => SessionState::AwaitingAnswer(session.question_index()),
            None => SessionState::Idle,
        }
    }

    /// Referring user of the friend's running interview
    pub fn referrer_of(&self, friend: UserId) -> Option<UserId> {
        self.sessions.get(&friend).map(|session| session.referrer)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
