//! Referral tokens and shareable links
//!
//! A referral token has the form `ref_<digits>` and travels as the argument
//! of the entry command (`/start ref_42`). Parsing never fails: anything that
//! is not a well-formed token simply means "no referral".

use crate::UserId;

const TOKEN_PREFIX: &str = "ref_";

/// Result of reading the entry command argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Referral {
    /// The argument named a referring user
    Valid(UserId),
    /// No argument, or one that is not a referral token
    NoReferral,
}

impl Referral {
    /// Parse an optional entry command argument
    pub fn parse(argument: Option<&str>) -> Self {
        let Some(digits) = argument.and_then(|arg| arg.strip_prefix(TOKEN_PREFIX)) else {
            return Self::NoReferral;
        };

        // `i64::from_str` accepts a leading sign, the token grammar does not
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Self::NoReferral;
        }

        match digits.parse::<i64>() {
            Ok(id) if id > 0 => Self::Valid(UserId::new(id)),
            _ => Self::NoReferral,
        }
    }

    pub fn referrer(self) -> Option<UserId> {
        match self {
            Self::Valid(id) => Some(id),
            Self::NoReferral => None,
        }
    }
}

/// Encode a user as a referral token
pub fn token_for(user: UserId) -> String {
    format!("{TOKEN_PREFIX}{user}")
}

/// Builds the shareable deep links handed out to users
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferralLinks {
    base: String,
}

impl ReferralLinks {
    pub fn new(base: impl Into<String>) -> Self {
        let base: String = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// Link base for a Telegram bot username
    pub fn for_bot(username: &str) -> Self {
        Self::new(format!("https://t.me/{}", username.trim_start_matches('@')))
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn link_for(&self, user: UserId) -> String {
        format!("{}?start={}", self.base, token_for(user))
    }
}
