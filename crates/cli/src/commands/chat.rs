//! `discord-assist chat` — Interactive or single-message chat mode.
//!
//! Runs the same history → adapter → loop → sink path as the Discord
//! `reply` command, with the terminal standing in for a channel.

use std::io::Write;
use std::sync::Arc;

use assist_agent::{Responder, ResponderError};
use assist_channels::CliChannel;
use assist_config::{AppConfig, ConfigError};
use assist_core::error::AgentError;
use assist_core::event::{DomainEvent, EventBus};
use tokio_util::sync::CancellationToken;

pub async fn run(
    config: Result<AppConfig, ConfigError>,
    message: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::require_config(config)?;

    // Fail early with setup help
    if let Err(e) = config.require_anthropic_key() {
        super::print_secret_help("ANTHROPIC_API_KEY", "anthropic", "api_key");
        return Err(e.into());
    }

    let event_bus = Arc::new(EventBus::default());
    let agent = super::build_agent(&config, event_bus.clone())?;
    let tool_names: Vec<String> = agent.tools().names().map(str::to_string).collect();
    let model = agent.model().to_string();

    let channel = Arc::new(CliChannel::new());
    let responder = Responder::new(channel.clone(), agent).configured(&config);

    let activity = tokio::spawn(show_tool_activity(event_bus));

    if let Some(msg) = message {
        // Single message mode
        channel.record_user(&msg).await;
        let result = exchange(&responder, &channel).await;
        activity.abort();
        return match result {
            Ok(_) | Err(ResponderError::Agent(AgentError::Cancelled)) => Ok(()),
            Err(e) => Err(e.into()),
        };
    }

    // Interactive mode
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║     discord-assist — Interactive Mode        ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Model:     {model}");
    println!("  Tools:     {}", tool_names.join(", "));
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type '/reset' to start over, 'exit' or Ctrl+C to quit.");
    println!();

    let mut rx = channel.start();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = rx.recv() => line,
            _ = tokio::signal::ctrl_c() => None,
        };

        let text = match line {
            Some(Ok(text)) => text,
            Some(Err(e)) => {
                eprintln!("  [Channel Error] {e}");
                break;
            }
            None => break,
        };

        if text == "/reset" {
            channel.reset().await;
            println!("  🧹 Conversation cleared.");
            println!();
            continue;
        }

        channel.record_user(&text).await;
        match exchange(&responder, &channel).await {
            Ok(_) => {}
            Err(ResponderError::Agent(AgentError::Cancelled)) => {
                println!();
                println!("  ⏹  Cancelled.");
                println!();
            }
            Err(e) => {
                eprintln!("  [Error] {e}");
                println!();
            }
        }
    }

    activity.abort();
    println!();
    println!("  Goodbye! 👋");
    println!();
    Ok(())
}

/// Run one exchange; Ctrl+C cancels it.
async fn exchange(
    responder: &Responder,
    channel: &CliChannel,
) -> Result<Option<assist_agent::RunSummary>, ResponderError> {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let result = responder.handle_chat(channel.chat_id(), &cancel).await;
    interrupt.abort();
    result
}

async fn show_tool_activity(event_bus: Arc<EventBus>) {
    let mut events = event_bus.subscribe();
    loop {
        match events.recv().await {
            Ok(event) => {
                if let DomainEvent::ToolExecuted {
                    tool_name,
                    success,
                    duration_ms,
                    ..
                } = event.as_ref()
                {
                    let mark = if *success { "🔧" } else { "⚠️ " };
                    eprintln!("  {mark} {tool_name} ({duration_ms} ms)");
                }
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        }
    }
}
