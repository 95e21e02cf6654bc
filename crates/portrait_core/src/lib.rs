//! Portrait Core - Referral Interview Funnel
//!
//! This crate holds everything the Portrait bot does independently of the
//! messaging platform: the five-question friend interview, the analysis
//! trigger, portrait prompt assembly and generation, and persistent storage.

pub mod config;
pub mod db;
pub mod error;
pub mod funnel;
pub mod id;
pub mod interview;
pub mod portrait;
pub mod referral;
pub mod texts;
pub mod trigger;

pub use db::{FriendAnswerSet, Store, StoreStats, User};
pub use error::{CoreError, Result};
pub use funnel::{Funnel, Inbound, Outgoing};
pub use id::UserId;
pub use interview::{AnswerOutcome, CompletedInterview, SessionState, SessionStore};
pub use portrait::{
    GenAiGenerator, GenerationError, GenerationRequest, PortraitGenerator, TextGenerator,
};
pub use referral::{Referral, ReferralLinks};
pub use trigger::should_fire;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        AnswerOutcome, CompletedInterview, CoreError, Funnel, GenAiGenerator, GenerationError,
        Inbound, Outgoing, PortraitGenerator, Referral, ReferralLinks, Result, SessionStore,
        Store, TextGenerator, UserId, config::PortraitConfig,
    };
}
