//! Telegram boundary: long-polls updates into the dispatcher and delivers
//! pipeline replies as threaded HTML messages.

use crate::access::AllowList;
use crate::config::{PollingConfig, RelayConfig};
use crate::delivery::ReplySink;
use crate::dispatch::{Dispatcher, FatalErrors, InboundMessage};
use crate::engine::LlamafileEngine;
use crate::error::{DeliveryError, RelayError};
use crate::pipeline::Pipeline;
use crate::request::Destination;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use teloxide::{
    payloads::SendMessageSetters,
    prelude::*,
    types::{AllowedUpdate, ChatId, MessageId, ParseMode, ReplyParameters, UpdateKind},
};
use tracing::{debug, error, info, warn};

/// Command sent when a user opens the bot; never relayed to the models.
pub const START_COMMAND: &str = "/start";

/// Extra HTTP timeout on top of the long-poll timeout so the client does not
/// abort a getUpdates call before Telegram answers.
const HTTP_TIMEOUT_MARGIN_SECS: u64 = 15;

/// [`ReplySink`] backed by the Bot API `sendMessage` call.
#[derive(Clone)]
pub struct TelegramReplySink {
    bot: Bot,
}

impl TelegramReplySink {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ReplySink for TelegramReplySink {
    async fn send_reply(&self, destination: Destination, text: &str) -> Result<(), DeliveryError> {
        self.bot
            .send_message(ChatId(destination.chat_id), text)
            .parse_mode(ParseMode::Html)
            .reply_parameters(ReplyParameters::new(MessageId(destination.message_id)))
            .await
            .map(|_| ())
            .map_err(|e| DeliveryError::Rejected(e.to_string()))
    }
}

/// Decide whether a message is relayed, and build the inbound message if so.
///
/// Messages without text, from senders outside the allow-list, and the
/// `/start` command are skipped.
pub fn screen_message(
    text: Option<&str>,
    sender_username: Option<&str>,
    parent_text: Option<&str>,
    destination: Destination,
    allow: &AllowList,
) -> Option<InboundMessage> {
    let text = text?;

    if !allow.permits(sender_username) {
        debug!(username = ?sender_username, "Skipping message from sender not on allow-list");
        return None;
    }

    if text == START_COMMAND {
        return None;
    }

    Some(InboundMessage {
        text: text.to_string(),
        parent_text: parent_text.map(String::from),
        destination,
    })
}

fn inbound_from_telegram(msg: &Message, allow: &AllowList) -> Option<InboundMessage> {
    let username = msg.from.as_ref().and_then(|user| user.username.as_deref());
    let parent_text = msg.reply_to_message().and_then(|parent| parent.text());

    screen_message(
        msg.text(),
        username,
        parent_text,
        Destination {
            chat_id: msg.chat.id.0,
            message_id: msg.id.0,
        },
        allow,
    )
}

/// Identify the bot, start the pipeline, and relay updates until Ctrl-C or a
/// fatal pipeline error.
///
/// On exit the pipeline is closed and every admitted request is still
/// answered before this returns.
pub async fn run(config: Arc<RelayConfig>) -> Result<(), RelayError> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(
            u64::from(config.polling.timeout_secs) + HTTP_TIMEOUT_MARGIN_SECS,
        ))
        .build()
        .map_err(|e| RelayError::Telegram(format!("Failed to build HTTP client: {}", e)))?;
    let bot = Bot::with_client(config.telegram_bot_token.clone(), client);

    let me = bot
        .get_me()
        .await
        .map_err(|e| RelayError::Identify(e.to_string()))?;
    info!(username = ?me.username, "Telegram bot identified");

    let engine = Arc::new(LlamafileEngine::from_config(&config.engine));
    let sink = Arc::new(TelegramReplySink::new(bot.clone()));
    let pipeline = Pipeline::start(&config.queue, engine, sink);
    let (dispatcher, mut fatal) = Dispatcher::new(pipeline.submitter(), config.shared_models());
    let allow = AllowList::new(&config.allowed_telegram_usernames);

    info!(
        models = dispatcher.enabled_model_count(),
        allow_all = allow.is_open(),
        "Listening for Telegram updates"
    );

    let result = poll_updates(&bot, &config.polling, &allow, &dispatcher, &mut fatal).await;

    drop(dispatcher);
    pipeline.close().await;
    result
}

async fn poll_updates(
    bot: &Bot,
    polling: &PollingConfig,
    allow: &AllowList,
    dispatcher: &Dispatcher,
    fatal: &mut FatalErrors,
) -> Result<(), RelayError> {
    let mut offset: i32 = 0;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let result = tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested, stopping Telegram polling");
                return Ok(());
            }
            Some(err) = fatal.recv() => {
                error!(error = %err, "Pipeline failed, stopping Telegram polling");
                return Err(err);
            }
            result = bot
                .get_updates()
                .offset(offset)
                .timeout(polling.timeout_secs)
                .allowed_updates(vec![AllowedUpdate::Message])
                .send() => result,
        };

        match result {
            Ok(updates) => {
                debug!(count = updates.len(), "Got Telegram updates");
                for update in updates {
                    offset = update.id.as_offset();
                    let UpdateKind::Message(msg) = update.kind else {
                        continue;
                    };
                    if let Some(message) = inbound_from_telegram(&msg, allow) {
                        let fanout = dispatcher.dispatch(&message);
                        debug!(
                            chat_id = message.destination.chat_id,
                            message_id = message.destination.message_id,
                            requests = fanout.len(),
                            "Dispatched message"
                        );
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Telegram getUpdates failed");
                let delay = Duration::from_secs(polling.retry_delay_secs);
                if let Some(exit) = retry_pause(delay, &mut shutdown, fatal).await {
                    return exit;
                }
            }
        }
    }
}

/// Wait out the retry delay. Returns the polling loop's result when shutdown
/// or a fatal pipeline error arrives first.
async fn retry_pause<S>(
    delay: Duration,
    shutdown: &mut S,
    fatal: &mut FatalErrors,
) -> Option<Result<(), RelayError>>
where
    S: Future + Unpin,
{
    tokio::select! {
        _ = shutdown => {
            info!("Shutdown requested, stopping Telegram polling");
            Some(Ok(()))
        }
        Some(err) = fatal.recv() => {
            error!(error = %err, "Pipeline failed, stopping Telegram polling");
            Some(Err(err))
        }
        _ = tokio::time::sleep(delay) => None,
    }
}
