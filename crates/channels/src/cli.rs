//! CLI channel — interactive terminal-based chat.
//!
//! Reads from stdin, writes to stdout, and keeps an in-memory transcript so
//! the same history → adapter → loop path used for Discord runs locally.
//! Used for `discord-assist chat`.

use assist_core::channel::{Channel, ChannelMessage, ChatId, History, HistoryOrder};
use assist_core::error::ChannelError;
use async_trait::async_trait;
use chrono::Utc;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio::sync::{Mutex, mpsc};

const CLI_CHAT_ID: &str = "cli_session";

/// Interactive CLI channel for terminal-based chat.
pub struct CliChannel {
    chat_id: ChatId,
    user_name: String,
    transcript: Mutex<Vec<ChannelMessage>>,
    /// Print replies to stdout
    echo: bool,
}

impl CliChannel {
    pub fn new() -> Self {
        Self {
            chat_id: ChatId::from(CLI_CHAT_ID),
            user_name: std::env::var("USER").unwrap_or_else(|_| "you".into()),
            transcript: Mutex::new(Vec::new()),
            echo: true,
        }
    }

    /// Keep replies in the transcript only.
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    pub fn chat_id(&self) -> &ChatId {
        &self.chat_id
    }

    /// Append a message typed by the local user.
    pub async fn record_user(&self, content: &str) -> ChannelMessage {
        let msg = self.message(content, false);
        self.transcript.lock().await.push(msg.clone());
        msg
    }

    /// Forget the conversation so far.
    pub async fn reset(&self) {
        self.transcript.lock().await.clear();
    }

    pub async fn transcript_len(&self) -> usize {
        self.transcript.lock().await.len()
    }

    fn message(&self, content: &str, is_self: bool) -> ChannelMessage {
        let (author_id, author_name) = if is_self {
            ("assistant".to_string(), "Assistant".to_string())
        } else {
            ("local_user".to_string(), self.user_name.clone())
        };

        ChannelMessage {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id: self.chat_id.clone(),
            author_id,
            author_name,
            content: content.to_string(),
            is_self,
            is_bot: is_self,
            timestamp: Utc::now(),
        }
    }

    /// Read user lines from stdin until EOF or an exit command.
    pub fn start(&self) -> mpsc::Receiver<Result<String, ChannelError>> {
        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            let stdin = io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            continue;
                        }

                        // Check for exit commands
                        if matches!(line.as_str(), "exit" | "quit" | "/exit" | "/quit" | ":q") {
                            break;
                        }

                        if tx.send(Ok(line)).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF (Ctrl+D)
                    Err(e) => {
                        let _ = tx.send(Err(ChannelError::ConnectionLost(e.to_string()))).await;
                        break;
                    }
                }
            }
        });

        rx
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn send(&self, chat_id: &ChatId, content: &str) -> Result<(), ChannelError> {
        if chat_id != &self.chat_id {
            return Err(ChannelError::DeliveryFailed {
                channel: "cli".into(),
                reason: format!("unknown chat {chat_id}"),
            });
        }

        if self.echo {
            println!();
            for line in content.lines() {
                println!("  Assistant > {line}");
            }
            println!();
        }

        let msg = self.message(content, true);
        self.transcript.lock().await.push(msg);
        Ok(())
    }

    async fn recent_messages(
        &self,
        chat_id: &ChatId,
        limit: usize,
    ) -> Result<History, ChannelError> {
        if chat_id != &self.chat_id {
            return Ok(History::new(Vec::new(), HistoryOrder::OldestFirst));
        }

        let transcript = self.transcript.lock().await;
        let start = transcript.len().saturating_sub(limit);
        Ok(History::new(
            transcript[start..].to_vec(),
            HistoryOrder::OldestFirst,
        ))
    }
}
