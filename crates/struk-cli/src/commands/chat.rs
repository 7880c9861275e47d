//! Chat simulator: one message in, the bot's reply out

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use struk_core::chat::{ChatBot, IncomingMessage};
use struk_core::{db::Database, Config, ReceiptIngestor};

use super::{ingestor_from_env, read_image};

pub async fn cmd_chat(
    db: &Database,
    settings: &Config,
    user: &str,
    text: &str,
    image: Option<&Path>,
) -> Result<()> {
    let reply = chat_reply(db, settings, ingestor_from_env(db, settings), user, text, image).await?;
    println!("{}", reply);
    Ok(())
}

/// Build the message, route it through the bot, and return the reply
pub async fn chat_reply(
    db: &Database,
    settings: &Config,
    ingestor: Option<ReceiptIngestor>,
    user: &str,
    text: &str,
    image: Option<&Path>,
) -> Result<String> {
    let message = match image {
        Some(path) => {
            let (data, mime) = read_image(path)?;
            let mut message = IncomingMessage::media(user, mime, data);
            message.text = text.to_string();
            message
        }
        None => IncomingMessage::text(user, text),
    };

    let mut bot = ChatBot::new(Arc::new(db.clone()), settings.week_start);
    if let Some(ingestor) = ingestor {
        bot = bot.with_ingestor(ingestor);
    }

    Ok(bot.handle(&message).await)
}
