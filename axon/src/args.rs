use std::path::PathBuf;

use clap::Parser;

/// Axon completion client
#[derive(Debug, Parser)]
#[command(name = "axon", about = "Stream a chat completion from an OpenAI-compatible endpoint")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "axon.toml", env = "AXON_CONFIG")]
    pub config: PathBuf,

    /// Override the configured system prompt
    #[arg(short, long)]
    pub system: Option<String>,

    /// Print events as newline-delimited JSON instead of plain text
    #[arg(long)]
    pub json: bool,

    /// Print the selected model and its metadata, then exit
    #[arg(long)]
    pub show_model: bool,

    /// Prompt text; words are joined with spaces
    #[arg(required_unless_present = "show_model")]
    pub prompt: Vec<String>,
}
