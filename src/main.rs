mod cli;
mod composer;
mod config;
mod history;
mod input;
mod llm;
mod prompts;
mod recorder;
mod session;
mod theme;
mod thinking;
mod tools;

use anyhow::Result;
use termimad::MadSkin;

/// Render markdown (the explanation text) nicely in the terminal.
pub fn render_markdown(text: &str) -> Result<()> {
    let skin = MadSkin::default();
    skin.print_text(text);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load_or_create_config(None)?;
    cli::run(config).await
}
