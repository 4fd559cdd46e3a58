mod output;
mod repl;

pub use output::{
    format_tool_result_compact, render_final, render_stream, LiveRenderer, StreamState,
    ToolCallView, ToolResultView,
};
pub use repl::{parse_command, ReplCommand};

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::agent::{prompt, Agent};
use crate::core::config::{self, AppConfig};
use crate::skills::SkillLoader;
use crate::stream::display::char_prefix;

#[cfg(test)]
mod tests;

#[derive(Parser, Debug)]
#[command(
    name = "skills-agent",
    version,
    about = "Skills agent with progressive disclosure",
    after_help = "Level 1: skill metadata is injected into the system prompt at startup\n\
                  Level 2: load_skill fetches full instructions when a request matches\n\
                  Level 3: bash runs skill scripts; only their output enters the context"
)]
pub struct Cli {
    /// Request to run (interactive mode when omitted)
    pub prompt: Option<String>,

    /// Interactive conversation mode
    #[arg(short, long)]
    pub interactive: bool,

    /// List discovered skills
    #[arg(long)]
    pub list_skills: bool,

    /// Show the system prompt with the injected skill metadata
    #[arg(long)]
    pub show_prompt: bool,

    /// Disable extended thinking
    #[arg(long)]
    pub no_thinking: bool,

    /// Working directory
    #[arg(long = "cwd")]
    pub working_dir: Option<PathBuf>,

    /// Serve the SSE web bridge
    #[arg(long)]
    pub web: bool,

    /// Output format for a single request
    #[arg(short = 'f', long, default_value = "text")]
    pub output_format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    /// Raw SSE frames on stdout
    Sse,
}

pub async fn run_cli() -> Result<()> {
    // .env wins over the inherited environment.
    dotenvy::dotenv_override().ok();

    let cli = Cli::parse();

    let debug = cli.debug
        || std::env::var("SKILLS_DEBUG").is_ok_and(|v| config::is_truthy(&v));
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Some(dir) = &cli.working_dir {
        std::env::set_current_dir(dir)
            .map_err(|e| anyhow::anyhow!("cannot enter {}: {e}", dir.display()))?;
    }

    let mut config = config::load_config(None).map_err(|e| anyhow::anyhow!("{e}"))?;
    if cli.no_thinking {
        config.enable_thinking = false;
    }
    config.debug |= debug;

    if cli.list_skills {
        list_skills(&config);
        return Ok(());
    }
    if cli.show_prompt {
        show_prompt(&config);
        return Ok(());
    }

    ensure_credentials(&config)?;
    let agent = Agent::from_config(config.clone()).map_err(|e| anyhow::anyhow!("{e}"))?;

    if cli.web {
        crate::web::serve(agent, &config).await
    } else if cli.interactive {
        repl::run(agent).await
    } else if let Some(prompt) = cli.prompt {
        run_once(agent, prompt, cli.output_format).await
    } else {
        repl::run(agent).await
    }
}

fn ensure_credentials(config: &AppConfig) -> Result<()> {
    if !config.has_credentials() {
        anyhow::bail!(
            "API credentials not set for provider '{}'. {}",
            config.provider_kind(),
            crate::providers::missing_key_hint(config.provider_kind())
        );
    }
    Ok(())
}

fn skill_loader(config: &AppConfig) -> SkillLoader {
    SkillLoader::with_defaults(config.skill_paths.clone(), &config.working_dir)
}

fn list_skills(config: &AppConfig) {
    eprintln!("\n\x1b[1;36mDiscovering Skills...\x1b[0m\n");

    let loader = skill_loader(config);
    let skills = loader.scan_skills();

    if skills.is_empty() {
        println!("\x1b[33mNo skills found.\x1b[0m");
        println!("Skills are loaded from:");
        for path in loader.skill_paths() {
            println!("  - {}", path.display());
        }
        return;
    }

    println!("\x1b[1mFound {} Skills\x1b[0m\n", skills.len());
    for skill in &skills {
        let desc = if skill.description.chars().count() > 60 {
            format!("{}...", char_prefix(&skill.description, 57))
        } else {
            skill.description.clone()
        };
        println!(
            "  \x1b[32m{:<20}\x1b[0m {:<60}  \x1b[90m{}\x1b[0m",
            skill.name,
            desc,
            skill.skill_path.display()
        );
    }
}

fn show_prompt(config: &AppConfig) {
    eprintln!("\n\x1b[1;36mBuilding System Prompt (Level 1)...\x1b[0m\n");

    let loader = skill_loader(config);
    let system_prompt = prompt::build_system_prompt(&loader);
    println!("{system_prompt}");

    let skills = loader.scan_skills();
    eprintln!("\n\x1b[90mSkills discovered: {}\x1b[0m", skills.len());
    eprintln!("\x1b[90mEstimated tokens: ~{}\x1b[0m", system_prompt.len() / 4);
}

async fn run_once(agent: Agent, prompt: String, format: OutputFormat) -> Result<()> {
    let mut handle = agent.run(prompt.as_str(), "default");

    match format {
        OutputFormat::Sse => {
            use std::io::Write;
            let mut stdout = std::io::stdout();
            while let Some(event) = handle.events.recv().await {
                write!(stdout, "{}", event.to_sse_frame())?;
                stdout.flush()?;
            }
        }
        OutputFormat::Text => {
            eprintln!("\x1b[1;36mUser Request:\x1b[0m {prompt}\n");
            let state = render_stream(&mut handle.events, agent.thinking_enabled()).await?;
            render_final(&state, true);
        }
    }

    match handle.task.await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => Err(anyhow::anyhow!("{e}")),
        Err(e) => Err(anyhow::anyhow!("agent task failed: {e}")),
    }
}
