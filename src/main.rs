use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    skills_agent::cli::run_cli().await
}
