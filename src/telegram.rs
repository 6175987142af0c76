//! Telegram transport
//!
//! Long-polls the Bot API through `teloxide`, answers `/start` and `/help`
//! directly and hands every other text message to the [`Pipeline`]. Replies
//! go back through [`TelegramReply`], the Telegram implementation of
//! [`ReplyChannel`].

use crate::config::Config;
use crate::error::DeliveryError;
use crate::extractor::ExtractorSet;
use crate::pipeline::{HELP_TEXT, Pipeline, START_TEXT};
use crate::reply::{ReplyChannel, SendResult};
use crate::types::{Channel, Event};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use teloxide::dispatching::{HandlerExt, UpdateFilterExt, UpdateHandler};
use teloxide::payloads::setters::*;
use teloxide::prelude::{Bot, Dispatcher, Message, Requester, ResponseResult, Update};
use teloxide::types::{ChatId, InputFile};
use teloxide::utils::command::BotCommands;
use teloxide::{RequestError, dptree};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Telegram's limit on media captions, in characters
pub const MAX_CAPTION_CHARS: usize = 1024;

/// Bot commands that never enter the pipeline
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    /// Introduce the bot
    Start,
    /// List supported platforms
    Help,
}

impl Command {
    /// Fixed reply text for this command
    pub fn reply_text(&self) -> &'static str {
        match self {
            Command::Start => START_TEXT,
            Command::Help => HELP_TEXT,
        }
    }
}

/// Reply channel bound to one Telegram chat
#[derive(Clone, Debug)]
pub struct TelegramReply {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramReply {
    /// Create a reply channel for `chat_id`
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }
}

fn send_error(channel: Channel, e: RequestError) -> DeliveryError {
    DeliveryError::Send {
        channel,
        reason: e.to_string(),
    }
}

async fn ensure_file(path: &Path) -> SendResult {
    match tokio::fs::try_exists(path).await {
        Ok(true) => Ok(()),
        _ => Err(DeliveryError::MissingFile {
            path: path.to_path_buf(),
        }),
    }
}

/// Caption to attach, if any: blank captions are omitted and long ones cut
/// to [`MAX_CAPTION_CHARS`]
pub fn caption_for(caption: &str) -> Option<String> {
    let caption = caption.trim();
    if caption.is_empty() {
        return None;
    }
    if caption.chars().count() <= MAX_CAPTION_CHARS {
        return Some(caption.to_string());
    }
    let mut cut: String = caption.chars().take(MAX_CAPTION_CHARS - 1).collect();
    cut.push('…');
    Some(cut)
}

#[async_trait]
impl ReplyChannel for TelegramReply {
    async fn send_text(&self, text: &str) -> SendResult {
        self.bot
            .send_message(self.chat_id, text)
            .await
            .map(|_| ())
            .map_err(|e| send_error(Channel::Text, e))
    }

    async fn send_video(&self, path: &Path, caption: &str, supports_streaming: bool) -> SendResult {
        ensure_file(path).await?;
        let mut request = self
            .bot
            .send_video(self.chat_id, InputFile::file(path.to_path_buf()))
            .supports_streaming(supports_streaming);
        if let Some(caption) = caption_for(caption) {
            request = request.caption(caption);
        }
        request
            .await
            .map(|_| ())
            .map_err(|e| send_error(Channel::Video, e))
    }

    async fn send_photo(&self, path: &Path, caption: &str) -> SendResult {
        ensure_file(path).await?;
        let mut request = self
            .bot
            .send_photo(self.chat_id, InputFile::file(path.to_path_buf()));
        if let Some(caption) = caption_for(caption) {
            request = request.caption(caption);
        }
        request
            .await
            .map(|_| ())
            .map_err(|e| send_error(Channel::Photo, e))
    }

    async fn send_audio(&self, path: &Path, caption: &str) -> SendResult {
        ensure_file(path).await?;
        let mut request = self
            .bot
            .send_audio(self.chat_id, InputFile::file(path.to_path_buf()));
        if let Some(caption) = caption_for(caption) {
            request = request.caption(caption);
        }
        request
            .await
            .map(|_| ())
            .map_err(|e| send_error(Channel::Audio, e))
    }

    async fn send_document(&self, path: &Path, caption: &str) -> SendResult {
        ensure_file(path).await?;
        let mut request = self
            .bot
            .send_document(self.chat_id, InputFile::file(path.to_path_buf()));
        if let Some(caption) = caption_for(caption) {
            request = request.caption(caption);
        }
        request
            .await
            .map(|_| ())
            .map_err(|e| send_error(Channel::Document, e))
    }
}

/// Whether a text message should go through the pipeline
///
/// Anything starting with `/` is a command; unknown commands are ignored.
pub fn is_pipeline_text(text: &str) -> bool {
    !text.trim_start().starts_with('/')
}

async fn handle_command(bot: Bot, msg: Message, cmd: Command) -> ResponseResult<()> {
    debug!(chat_id = msg.chat.id.0, ?cmd, "answering command");
    bot.send_message(msg.chat.id, cmd.reply_text()).await?;
    Ok(())
}

async fn handle_text(bot: Bot, msg: Message, pipeline: Arc<Pipeline>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let reply = TelegramReply::new(bot, msg.chat.id);
    pipeline.process(&reply, text).await;
    Ok(())
}

/// Update routing: known commands first, then plain text
pub fn schema() -> UpdateHandler<RequestError> {
    Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(
            dptree::filter(|msg: Message| msg.text().is_some_and(is_pipeline_text))
                .endpoint(handle_text),
        )
}

/// Forward pipeline events to the log
async fn log_events(mut rx: broadcast::Receiver<Event>) {
    loop {
        match rx.recv().await {
            Ok(event) => debug!(request_id = event.request_id().0, ?event, "pipeline event"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "event log lagged behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Run the bot until SIGTERM or SIGINT
///
/// # Errors
///
/// Fails before polling starts when the bot token is missing or the HTTP
/// client for the extractors cannot be built.
pub async fn run(config: Config) -> crate::Result<()> {
    let token = config.require_bot_token()?.to_string();
    let extractors = ExtractorSet::from_config(&config)?;
    debug!(?extractors, "extractor bindings");

    let pipeline = Arc::new(Pipeline::new(Arc::new(config), extractors));
    tokio::spawn(log_events(pipeline.subscribe()));

    let bot = Bot::new(token);
    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!(error = %e, "failed to register bot commands");
    }

    info!(
        download_dir = ?pipeline.config().download_dir(),
        max_file_size = pipeline.config().max_file_size(),
        "starting Telegram long polling"
    );

    let mut dispatcher = Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![pipeline])
        .build();

    let shutdown = dispatcher.shutdown_token();
    tokio::spawn(async move {
        crate::wait_for_signal().await;
        match shutdown.shutdown() {
            Ok(stopped) => {
                info!("waiting for in-flight requests to finish");
                stopped.await;
            }
            Err(e) => warn!(error = %e, "dispatcher was not running"),
        }
    });

    dispatcher.dispatch().await;

    info!("bot stopped");
    Ok(())
}
