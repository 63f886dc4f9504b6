use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "trajex")]
#[command(author, version, about = "Finger and mouse trajectory experiments", long_about = None)]
pub struct Cli {
    /// Experiment configuration (JSON)
    pub config: PathBuf,

    /// Font used for text stimuli
    #[arg(short, long)]
    pub font: Option<PathBuf>,

    /// Window icon (PNG)
    #[arg(long)]
    pub icon: Option<PathBuf>,

    /// Run in a window instead of fullscreen
    #[arg(short, long)]
    pub windowed: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}
