use anyhow::Result;
use futures::StreamExt;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio_stream::wrappers::LinesStream;
use tracing::info;

use vigor_agent::{AgentConfig, SessionContext, WellnessAgent};
use vigor_stream::{OutputChunk, SourceAdapter};

use crate::config::Config;

const WELCOME: &str = "\nWelcome to Vigor, your health & wellness planner!\n\n";
const FAREWELL: &str = "\nThank you for using Vigor! Stay healthy!\n";
const HELP: &str = "Commands: /model [name] to show or switch models, /help, /exit\n";
const MIN_NAME_CHARS: usize = 2;

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Exit,
    Help,
    ShowModel,
    SwitchModel(&'a str),
    Say(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        match line.split_once(char::is_whitespace) {
            _ if line == "/exit" || line == "/quit" => Self::Exit,
            _ if line == "/help" => Self::Help,
            _ if line == "/model" => Self::ShowModel,
            Some(("/model", name)) => Self::SwitchModel(name.trim()),
            _ => Self::Say(line),
        }
    }
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Stable id derived from the user's name (64-bit FNV-1a)
fn user_id(name: &str) -> u64 {
    let hash = name
        .bytes()
        .fold(FNV_OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME));
    hash % 10_000
}

fn agent_config(config: &Config) -> AgentConfig {
    AgentConfig::default()
        .with_model(config.llm.model.clone())
        .with_source_options(config.llm.clone().into())
        .with_assembler(config.stream.clone().into())
        .with_features(config.features.clone())
}

async fn say<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> Result<()> {
    out.write_all(text.as_bytes()).await?;
    out.flush().await?;
    Ok(())
}

/// Interactive loop: ask for a name, then answer messages until `/exit` or EOF
pub async fn run<R, W>(config: &Config, source: Arc<dyn SourceAdapter>, input: R, mut out: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = LinesStream::new(input.lines());

    say(&mut out, WELCOME).await?;
    say(&mut out, "What's your name? ").await?;
    let name = loop {
        let Some(line) = lines.next().await else {
            return Ok(());
        };
        let line = line?;
        let name = line.trim();
        if name.chars().count() >= MIN_NAME_CHARS {
            break name.to_string();
        }
        say(&mut out, "Name must be at least 2 characters. What's your name? ").await?;
    };

    let session = SessionContext::new(name.as_str(), user_id(&name));
    info!(user = %name, uid = session.uid, session_id = %session.session_id, "Session started");

    let mut agent = WellnessAgent::builder()
        .session(session)
        .source(source)
        .config(agent_config(config))
        .build()?;

    say(
        &mut out,
        &format!(
            "Hi {}! Tell me your goal (e.g. 'lose 5kg in 2 months'), ask for a meal or workout plan, or just chat.\n{}",
            name, HELP
        ),
    )
    .await?;

    loop {
        say(&mut out, "\n> ").await?;
        let Some(line) = lines.next().await else {
            break;
        };
        let line = line?;
        let message = line.trim();
        if message.is_empty() {
            continue;
        }

        match Command::parse(message) {
            Command::Exit => break,
            Command::Help => say(&mut out, HELP).await?,
            Command::ShowModel => {
                let listing = format!(
                    "Current model: {}\nAvailable: {}\n",
                    agent.model(),
                    config.llm.available_models.join(", ")
                );
                say(&mut out, &listing).await?;
            }
            Command::SwitchModel(model) if config.is_available_model(model) => {
                agent.set_model(model);
                say(&mut out, &format!("Switched to {}\n", model)).await?;
            }
            Command::SwitchModel(model) => {
                say(&mut out, &format!("Unknown model '{}'. Use /model to list options.\n", model)).await?;
            }
            Command::Say(text) => {
                let reply = stream_reply(&mut agent, text, &mut out).await?;
                agent.record_turn(text, &reply).await;
            }
        }
    }

    say(&mut out, FAREWELL).await?;
    Ok(())
}

/// Print chunks as they arrive and return the assistant's own text.
/// Tool markers, tool results and diagnostics are shown but not kept.
async fn stream_reply<W: AsyncWrite + Unpin>(agent: &mut WellnessAgent, message: &str, out: &mut W) -> Result<String> {
    let mut chunks = agent.respond(message).await.into_stream();
    let mut reply = String::new();

    while let Some(chunk) = chunks.next().await {
        if chunk.is_empty() {
            continue;
        }
        say(out, chunk.text()).await?;
        if let OutputChunk::Text(text) = &chunk {
            reply.push_str(text);
        }
    }
    say(out, "\n").await?;

    Ok(reply.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use support::ReplaySource;

    const SAMPLE: &str = r#"
        [provider]
        type = "openrouter"

        [llm]
        model = "openai/gpt-4o-mini"
        available_models = ["openai/gpt-4o-mini", "anthropic/claude-3-haiku"]
        temperature = 0.7
        max_tokens = 500

        [stream]
        max_chunk_chars = 200
        max_idle_ms = 500
        poll_timeout_ms = 150
        queue_capacity = 16

        [logging]
        level = "warn"
        format = "pretty"
    "#;

    mod support {
        use async_trait::async_trait;
        use vigor_llm::Message;
        use vigor_stream::adapter::replay;
        use vigor_stream::{RawEvent, RawEventStream, SourceAdapter, SourceOptions};

        /// Source that always answers with the same sentence
        pub struct ReplaySource;

        #[async_trait]
        impl SourceAdapter for ReplaySource {
            async fn open(
                &self,
                _messages: Vec<Message>,
                _model: &str,
                _options: &SourceOptions,
            ) -> anyhow::Result<RawEventStream> {
                Ok(replay(vec![RawEvent::text("Stay hydrated.")]))
            }
        }
    }

    async fn session_output(input: &str) -> String {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        let mut out = Vec::new();
        run(&config, Arc::new(ReplaySource), input.as_bytes(), &mut out)
            .await
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_command_parsing() {
        assert_eq!(Command::parse("/exit"), Command::Exit);
        assert_eq!(Command::parse("/model"), Command::ShowModel);
        assert_eq!(Command::parse("/model  anthropic/claude-3-haiku"), Command::SwitchModel("anthropic/claude-3-haiku"));
        assert_eq!(Command::parse("how are you"), Command::Say("how are you"));
    }

    #[test]
    fn test_user_id_is_stable() {
        assert_eq!(user_id("Ana"), 9957);
        assert_eq!(user_id(""), 0xcbf2_9ce4_8422_2325 % 10_000);
        assert_ne!(user_id("Ana"), user_id("Bob"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reply_keeps_only_assistant_text() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        let mut agent = WellnessAgent::builder()
            .session(SessionContext::new("Ana", user_id("Ana")))
            .source(Arc::new(ReplaySource))
            .config(agent_config(&config))
            .build()
            .unwrap();
        let mut out = Vec::new();

        let reply = stream_reply(&mut agent, "lose 5kg in 2 months", &mut out).await.unwrap();
        let shown = String::from_utf8(out).unwrap();

        assert!(shown.contains("goal_analyzer"));
        assert!(shown.contains("Results"));
        assert!(reply.starts_with("I've recorded your goal."), "reply: {}", reply);
        assert!(!reply.contains("goal_analyzer"));
        assert!(!reply.contains("Results"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_flow() {
        let output = session_output(
            "A\nAna\nlose 5kg in 2 months\nany tips?\n/model anthropic/claude-3-haiku\n/model made-up\n/exit\nnever read\n",
        )
        .await;

        assert!(output.contains("Name must be at least 2 characters"));
        assert!(output.contains("Hi Ana!"));
        assert!(output.contains("goal_analyzer"));
        assert!(output.contains("Stay hydrated."));
        assert!(output.contains("Switched to anthropic/claude-3-haiku"));
        assert!(output.contains("Unknown model 'made-up'"));
        assert!(output.ends_with(FAREWELL));
        assert!(!output.contains("never read"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_eof_before_name_exits_quietly() {
        let output = session_output("").await;
        assert!(output.contains("What's your name?"));
        assert!(!output.contains(FAREWELL));
    }
}
