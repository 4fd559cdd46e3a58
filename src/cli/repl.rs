use anyhow::Result;
use std::io::{self, Write};

use super::output::render_stream;
use crate::agent::Agent;
use crate::core::config::ProviderKind;

const THREAD_ID: &str = "interactive";

/// A slash command typed at the prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Exit,
    Skills,
    Prompt,
    Temp(Option<String>),
    Model {
        name: Option<String>,
        provider: Option<String>,
    },
    Help,
    Unknown(String),
}

/// Parse a line starting with `/`. Anything else is a chat message.
pub fn parse_command(input: &str) -> Option<ReplCommand> {
    let input = input.trim();
    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input.split_whitespace();
    let head = parts.next().unwrap_or_default().to_lowercase();
    let first = parts.next().map(str::to_string);
    let second = parts.next().map(str::to_string);

    let cmd = match head.as_str() {
        "/exit" | "/quit" | "/q" => ReplCommand::Exit,
        "/skills" => ReplCommand::Skills,
        "/prompt" => ReplCommand::Prompt,
        "/temp" => ReplCommand::Temp(first),
        "/model" => ReplCommand::Model {
            name: first,
            provider: second,
        },
        "/help" | "/h" => ReplCommand::Help,
        _ => ReplCommand::Unknown(input.to_string()),
    };
    Some(cmd)
}

pub async fn run(mut agent: Agent) -> Result<()> {
    print_banner(&agent);

    loop {
        eprint!("\x1b[32;1mYou:\x1b[0m ");
        io::stderr().flush().ok();

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => {
                println!("\nGoodbye!");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(cmd) = parse_command(input) {
            match handle_command(cmd, &mut agent) {
                Ok(true) => continue,
                Ok(false) => break,
                Err(e) => {
                    eprintln!("\x1b[31mCommand error: {e}\x1b[0m");
                    continue;
                }
            }
        }

        run_turn(&agent, input).await?;
    }

    Ok(())
}

async fn run_turn(agent: &Agent, input: &str) -> Result<()> {
    eprintln!("\n\x1b[1;34mAssistant:\x1b[0m");
    let mut handle = agent.run(input, THREAD_ID);
    let cancel = handle.cancel.clone();

    tokio::select! {
        state = render_stream(&mut handle.events, agent.thinking_enabled()) => {
            state?;
        }
        _ = tokio::signal::ctrl_c() => {
            cancel.cancel();
            eprintln!("\n\x1b[33mInterrupted\x1b[0m");
        }
    }

    match handle.task.await {
        Ok(Ok(_)) | Ok(Err(crate::core::error::SkillsError::Cancelled)) => {}
        Ok(Err(e)) => tracing::debug!(error = %e, "turn ended with error"),
        Err(e) => eprintln!("\x1b[31mAgent task failed: {e}\x1b[0m"),
    }
    println!();
    Ok(())
}

fn print_banner(agent: &Agent) {
    println!("\x1b[1;36mSkills Agent\x1b[0m v{}", env!("CARGO_PKG_VERSION"));
    println!(
        "Model: \x1b[36m{}\x1b[0m ({})",
        agent.model_name(),
        agent.provider_kind()
    );

    let skills = agent.get_discovered_skills();
    let names: Vec<&str> = skills.iter().map(|s| s.name.as_str()).collect();
    if names.is_empty() {
        println!("Skills: \x1b[90m(none)\x1b[0m");
    } else {
        println!("Skills: \x1b[32m{}\x1b[0m", names.join(", "));
    }

    if agent.thinking_enabled() {
        println!("Thinking: \x1b[34menabled\x1b[0m");
    } else {
        println!("Thinking: \x1b[90mdisabled\x1b[0m");
    }
    println!("Type \x1b[33m/help\x1b[0m for commands, \x1b[33mCtrl-D\x1b[0m to exit.\n");
}

/// Returns Ok(false) when the loop should stop.
fn handle_command(cmd: ReplCommand, agent: &mut Agent) -> Result<bool> {
    match cmd {
        ReplCommand::Exit => {
            println!("Goodbye!");
            return Ok(false);
        }
        ReplCommand::Skills => {
            let skills = agent.get_discovered_skills();
            if skills.is_empty() {
                println!("No skills found.");
            }
            for skill in skills {
                println!("  \x1b[32m{}\x1b[0m: {}", skill.name, skill.description);
            }
        }
        ReplCommand::Prompt => {
            println!("{}", agent.get_system_prompt());
        }
        ReplCommand::Temp(value) => {
            println!("{}", temp_command(agent, value.as_deref()));
        }
        ReplCommand::Model { name, provider } => {
            println!(
                "{}",
                model_command(agent, name.as_deref(), provider.as_deref(), THREAD_ID)
            );
        }
        ReplCommand::Help => {
            println!("\x1b[1mCommands:\x1b[0m");
            println!("  /skills              List discovered skills");
            println!("  /prompt              Show the system prompt");
            println!("  /temp [value]        Show or set temperature (0.0-1.0)");
            println!("  /model <name> [provider]  Switch model (anthropic, deepseek, openai)");
            println!("  /help                Show this help");
            println!("  /exit                Exit");
        }
        ReplCommand::Unknown(input) => {
            eprintln!("Unknown command: {input}. Type /help for available commands.");
        }
    }
    Ok(true)
}

/// `/temp`: report the current value or set a new one.
pub(crate) fn temp_command(agent: &mut Agent, value: Option<&str>) -> String {
    let Some(raw) = value else {
        let note = if agent.thinking_enabled() {
            " (fixed while thinking is enabled)"
        } else {
            ""
        };
        return format!("Temperature: {}{note}", agent.temperature());
    };

    let Ok(temperature) = raw.parse::<f32>() else {
        return format!("Invalid temperature value: {raw}");
    };
    if !(0.0..=1.0).contains(&temperature) {
        return "Temperature must be between 0.0 and 1.0".to_string();
    }
    if !agent.set_temperature(temperature) {
        return "Cannot change temperature while extended thinking is enabled (fixed at 1.0)"
            .to_string();
    }
    format!("Temperature set to {temperature}")
}

/// `/model`: report the current model or switch to another one.
pub(crate) fn model_command(
    agent: &mut Agent,
    name: Option<&str>,
    provider: Option<&str>,
    thread_id: &str,
) -> String {
    let Some(name) = name else {
        return format!(
            "Model: {} ({})",
            agent.model_name(),
            agent.provider_kind()
        );
    };

    let kind = match provider.map(str::parse::<ProviderKind>) {
        None => None,
        Some(Ok(kind)) => Some(kind),
        Some(Err(_)) => {
            return format!(
                "Unknown provider: {}. Use anthropic, deepseek or openai.",
                provider.unwrap_or_default()
            )
        }
    };

    match agent.switch_model(name, kind, thread_id) {
        Ok(()) => {
            let thinking = if agent.thinking_enabled() {
                "enabled"
            } else {
                "disabled"
            };
            format!(
                "Switched to {} ({}), thinking {thinking}",
                agent.model_name(),
                agent.provider_kind()
            )
        }
        Err(e) => format!("Failed to switch model: {e}"),
    }
}
