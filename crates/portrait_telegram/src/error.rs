use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum TelegramError {
    #[error("Telegram authentication failed")]
    #[diagnostic(
        code(portrait::telegram::auth_failed),
        help("Check that the bot token {token_preview} is valid and has not been revoked via @BotFather")
    )]
    AuthenticationFailed { token_preview: String },

    #[error("Request to {method} failed")]
    #[diagnostic(
        code(portrait::telegram::request_failed),
        help("Could not reach the Bot API; check network access to api.telegram.org")
    )]
    RequestFailed {
        method: String,
        #[source]
        cause: reqwest::Error,
    },

    #[error("Bot API rejected {method}: {description}")]
    #[diagnostic(
        code(portrait::telegram::api_error),
        help("Telegram answered with error code {code}")
    )]
    Api {
        method: String,
        code: i64,
        description: String,
    },

    #[error("Malformed response from {method}")]
    #[diagnostic(
        code(portrait::telegram::malformed_response),
        help("The Bot API answered ok without a result")
    )]
    MalformedResponse { method: String },

    #[error("Message send failed")]
    #[diagnostic(
        code(portrait::telegram::message_send_failed),
        help("Failed to send message to chat {chat_id}")
    )]
    MessageSendFailed {
        chat_id: i64,
        message_length: usize,
        #[source]
        cause: Box<TelegramError>,
    },
}

pub type Result<T> = std::result::Result<T, TelegramError>;

impl TelegramError {
    pub fn auth_failed(token: &str) -> Self {
        // Show the bot id part and the last 4 characters only
        let token_preview = match token.split_once(':') {
            Some((bot_id, secret)) if secret.chars().count() > 8 => {
                let tail_start = secret
                    .char_indices()
                    .rev()
                    .nth(3)
                    .map_or(0, |(index, _)| index);
                format!("{bot_id}:...{}", &secret[tail_start..])
            }
            _ => "***".to_string(),
        };

        Self::AuthenticationFailed { token_preview }
    }

    /// Transient failures worth retrying on the next poll
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RequestFailed { .. } | Self::MalformedResponse { .. } => true,
            Self::Api { code, .. } => *code == 429 || *code >= 500,
            Self::AuthenticationFailed { .. } => false,
            Self::MessageSendFailed { cause, .. } => cause.is_transient(),
        }
    }
}
