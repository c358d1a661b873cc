//! Telegram Bot API client.
//!
//! Uses reqwest to call `getUpdates` (long polling) and `sendMessage`.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use thiserror::Error;
use tracing::debug;

use super::types::{ApiResponse, GetUpdates, SendMessage, Update};
use crate::config::BotConfig;

/// Longest text Telegram accepts in one message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Extra time allowed on top of the long-poll timeout before the HTTP
/// request itself is abandoned.
const REQUEST_GRACE: Duration = Duration::from_secs(10);

/// Bot API client errors.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    #[error("Telegram API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BotError {
    /// The token was rejected; polling cannot recover from this.
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401, .. })
    }
}

impl From<reqwest::Error> for BotError {
    fn from(e: reqwest::Error) -> Self {
        // Request URLs embed the bot token.
        Self::Http(e.without_url())
    }
}

pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient").finish_non_exhaustive()
    }
}

impl TelegramClient {
    pub fn new(config: &BotConfig) -> Result<Self, BotError> {
        if config.token.is_empty() {
            return Err(BotError::Config("token is empty".into()));
        }
        if config.api_url.is_empty() {
            return Err(BotError::Config("api_url is empty".into()));
        }

        // Ensure a TLS crypto provider is installed (reqwest uses rustls-no-provider).
        // The `Err` case just means it was already installed.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let http = reqwest::Client::builder()
            .timeout(config.poll_timeout + REQUEST_GRACE)
            .build()?;

        let base_url = format!(
            "{}/bot{}",
            config.api_url.trim_end_matches('/'),
            config.token
        );
        Ok(Self { http, base_url })
    }

    pub(crate) fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, BotError>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
    {
        let resp = self
            .http
            .post(self.method_url(method))
            .json(params)
            .send()
            .await?;
        let status = resp.status();
        let body: ApiResponse<R> = resp.json().await?;
        unwrap_response(method, status.as_u16(), body)
    }

    /// Fetch pending updates, waiting up to `timeout` for new ones.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout: Duration,
    ) -> Result<Vec<Update>, BotError> {
        let params = GetUpdates {
            offset,
            timeout: timeout.as_secs(),
            allowed_updates: &["message"],
        };
        self.call("getUpdates", &params).await
    }

    /// Send `text` to `chat_id`, split into several messages if too long.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), BotError> {
        for chunk in split_message(text, MAX_MESSAGE_CHARS) {
            let _: IgnoredAny = self
                .call(
                    "sendMessage",
                    &SendMessage {
                        chat_id,
                        text: &chunk,
                    },
                )
                .await?;
        }
        debug!(chat_id, "Reply sent");
        Ok(())
    }
}

fn unwrap_response<R>(method: &str, status: u16, body: ApiResponse<R>) -> Result<R, BotError> {
    match body {
        ApiResponse {
            ok: true,
            result: Some(result),
            ..
        } => Ok(result),
        ApiResponse {
            ok: true,
            result: None,
            ..
        } => Err(BotError::Api {
            status,
            message: format!("{method} returned no result"),
        }),
        ApiResponse {
            description,
            error_code,
            ..
        } => Err(BotError::Api {
            status: error_code.unwrap_or(status),
            message: description.unwrap_or_else(|| "unknown error".into()),
        }),
    }
}

/// Split `text` into pieces of at most `max_chars` characters, preferring
/// line boundaries.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split('\n') {
        let line_len = line.chars().count();
        let sep = usize::from(!current.is_empty());
        if current_len + sep + line_len <= max_chars {
            if sep == 1 {
                current.push('\n');
            }
            current.push_str(line);
            current_len += sep + line_len;
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len <= max_chars {
            current.push_str(line);
            current_len = line_len;
        } else {
            // A single line longer than the limit is cut at character boundaries.
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(max_chars) {
                if piece.len() == max_chars {
                    chunks.push(piece.iter().collect());
                } else {
                    current = piece.iter().collect();
                    current_len = piece.len();
                }
            }
        }
    }

    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::Operators;

    fn config(token: &str) -> BotConfig {
        BotConfig {
            token: token.into(),
            api_url: "https://api.telegram.org/".into(),
            poll_timeout: Duration::from_secs(30),
            operators: Operators::default(),
            public_greeting: String::new(),
        }
    }

    #[test]
    fn empty_token_is_config_error() {
        let err = TelegramClient::new(&config("")).unwrap_err();
        assert!(matches!(err, BotError::Config(_)));
    }

    #[test]
    fn method_url_embeds_token() {
        let client = TelegramClient::new(&config("123:abc")).unwrap();
        assert_eq!(
            client.method_url("getUpdates"),
            "https://api.telegram.org/bot123:abc/getUpdates"
        );
    }

    #[test]
    fn debug_hides_token() {
        let client = TelegramClient::new(&config("123:abc")).unwrap();
        assert!(!format!("{client:?}").contains("123:abc"));
    }

    #[test]
    fn unwrap_ok_response() {
        let body: ApiResponse<Vec<i64>> =
            serde_json::from_str(r#"{"ok":true,"result":[1,2]}"#).unwrap();
        assert_eq!(unwrap_response("getUpdates", 200, body).unwrap(), vec![1, 2]);
    }

    #[test]
    fn unwrap_error_response() {
        let body: ApiResponse<Vec<i64>> = serde_json::from_str(
            r#"{"ok":false,"error_code":401,"description":"Unauthorized"}"#,
        )
        .unwrap();
        let err = unwrap_response("getUpdates", 401, body).unwrap_err();
        assert!(err.is_unauthorized());
        assert!(err.to_string().contains("Unauthorized"));
    }

    #[test]
    fn unwrap_error_without_code_uses_status() {
        let body: ApiResponse<Vec<i64>> = serde_json::from_str(r#"{"ok":false}"#).unwrap();
        let err = unwrap_response("sendMessage", 502, body).unwrap_err();
        assert!(matches!(err, BotError::Api { status: 502, .. }));
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn short_message_is_one_chunk() {
        assert_eq!(split_message("a\nb", 10), vec!["a\nb"]);
        assert_eq!(split_message("", 10), vec![""]);
    }

    #[test]
    fn long_message_splits_on_lines() {
        let text = "aaaa\nbbbb\ncccc";
        assert_eq!(split_message(text, 9), vec!["aaaa\nbbbb", "cccc"]);
        assert_eq!(split_message(text, 4), vec!["aaaa", "bbbb", "cccc"]);
    }

    #[test]
    fn overlong_line_is_cut() {
        let chunks = split_message("abcdefghij", 4);
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn chunks_respect_limit() {
        let text: String = (0..500)
            .map(|i| format!("AB-CDEFGH-IJKL-{i:04}: Month, until Never, OK"))
            .collect::<Vec<_>>()
            .join("\n");
        let chunks = split_message(&text, MAX_MESSAGE_CHARS);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= MAX_MESSAGE_CHARS));
        assert_eq!(chunks.join("\n"), text);
    }
}
