//! Long-poll loop feeding updates to the [`CommandHandler`].

use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::client::{BotError, TelegramClient};
use super::handler::CommandHandler;
use super::types::Update;

/// Default pause after a failed `getUpdates` before polling again.
pub const RETRY_DELAY: Duration = Duration::from_secs(5);

pub struct BotPoller {
    client: TelegramClient,
    handler: CommandHandler,
    poll_timeout: Duration,
    retry_delay: Duration,
}

impl BotPoller {
    pub const fn new(client: TelegramClient, handler: CommandHandler, poll_timeout: Duration) -> Self {
        Self {
            client,
            handler,
            poll_timeout,
            retry_delay: RETRY_DELAY,
        }
    }

    #[must_use]
    pub const fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Poll until the token is rejected. Transient failures are logged and
    /// retried after the retry delay ([`RETRY_DELAY`] unless overridden).
    pub async fn run(&self) -> Result<(), BotError> {
        info!(poll_timeout = ?self.poll_timeout, "Telegram bot polling started");
        let mut offset: Option<i64> = None;

        loop {
            let updates = match self.client.get_updates(offset, self.poll_timeout).await {
                Ok(updates) => updates,
                Err(e) if e.is_unauthorized() => {
                    error!(error = %e, "Telegram rejected the bot token");
                    return Err(e);
                }
                Err(e) => {
                    warn!(error = %e, retry_in = ?self.retry_delay, "getUpdates failed");
                    tokio::time::sleep(self.retry_delay).await;
                    continue;
                }
            };

            for update in updates {
                offset = Some(next_offset(offset, &update));
                self.dispatch(update).await;
            }
        }
    }

    async fn dispatch(&self, update: Update) {
        let Some(message) = update.message else {
            debug!(update_id = update.update_id, "Ignoring non-message update");
            return;
        };
        let (Some(from), Some(text)) = (message.from.as_ref(), message.text.as_deref()) else {
            return;
        };

        let Some(reply) = self.handler.handle(from, text).await else {
            return;
        };
        if let Err(e) = self.client.send_message(message.chat.id, &reply).await {
            warn!(chat_id = message.chat.id, error = %e, "Failed to send reply");
        }
    }
}

/// Offset that acknowledges `update` and everything before it.
pub(crate) fn next_offset(current: Option<i64>, update: &Update) -> i64 {
    let candidate = update.update_id + 1;
    current.map_or(candidate, |c| c.max(candidate))
}
