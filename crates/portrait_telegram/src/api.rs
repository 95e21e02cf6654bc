//! Minimal Telegram Bot API client

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::types::{ApiResponse, GetUpdates, SendMessage, Update, User};
use crate::{Result, TelegramError};

/// Headroom on top of the long-poll timeout before the HTTP request gives up
const REQUEST_SLACK: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct TelegramApi {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl TelegramApi {
    pub fn new(token: impl Into<String>, api_url: &str, poll_timeout: Duration) -> Result<Self> {
        let token = token.into();
        let http = reqwest::Client::builder()
            .timeout(poll_timeout + REQUEST_SLACK)
            .build()
            .map_err(|cause| TelegramError::RequestFailed {
                method: "client".to_string(),
                cause,
            })?;

        Ok(Self {
            http,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
            token,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    async fn call<P, T>(&self, method: &str, params: &P) -> Result<T>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.method_url(method))
            .json(params)
            .send()
            .await
            .map_err(|cause| TelegramError::RequestFailed {
                method: method.to_string(),
                cause,
            })?;

        // Error replies still carry the JSON envelope, so the status is not checked here
        let envelope: ApiResponse<T> =
            response
                .json()
                .await
                .map_err(|cause| TelegramError::RequestFailed {
                    method: method.to_string(),
                    cause,
                })?;

        unwrap_envelope(method, envelope, &self.token)
    }

    /// The bot's own account
    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// Long-poll for new updates after `offset`
    pub async fn get_updates(&self, offset: Option<i64>, timeout: Duration) -> Result<Vec<Update>> {
        let params = GetUpdates {
            offset,
            timeout: timeout.as_secs(),
            allowed_updates: vec!["message".to_string()],
        };
        self.call("getUpdates", &params).await
    }

    /// Send a plain text message
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let params = SendMessage { chat_id, text };
        let _: serde_json::Value = self.call("sendMessage", &params).await.map_err(|cause| {
            TelegramError::MessageSendFailed {
                chat_id,
                message_length: text.chars().count(),
                cause: Box::new(cause),
            }
        })?;
        Ok(())
    }
}

fn unwrap_envelope<T>(method: &str, envelope: ApiResponse<T>, token: &str) -> Result<T> {
    if !envelope.ok {
        let code = envelope.error_code.unwrap_or_default();
        if code == 401 {
            return Err(TelegramError::auth_failed(token));
        }
        return Err(TelegramError::Api {
            method: method.to_string(),
            code,
            description: envelope.description.unwrap_or_default(),
        });
    }

    envelope.result.ok_or_else(|| TelegramError::MalformedResponse {
        method: method.to_string(),
    })
}
