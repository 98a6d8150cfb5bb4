use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use zimtohrli::config::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "zimtohrli", about = "Perceptual audio similarity between a reference and test files")]
pub struct Cli {
    /// Reference audio file (WAV, MP3, FLAC, OGG)
    pub reference: PathBuf,

    /// One or more test files compared against the reference
    #[arg(required = true)]
    pub distorted: Vec<PathBuf>,

    /// Report the raw distance alongside the MOS
    #[arg(long)]
    pub distance: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Fail when any test scores below this MOS
    #[arg(long)]
    pub min_mos: Option<f64>,

    /// Fail when any test is further than this distance
    #[arg(long)]
    pub max_distance: Option<f64>,

    /// Config file (default: zimtohrli.toml, then ~/.config/zimtohrli/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

impl From<OutputFormat> for Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => Format::Text,
            OutputFormat::Json => Format::Json,
        }
    }
}
