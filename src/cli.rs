use std::path::PathBuf;

use clap::Parser;

use humility_settings::HumilitySettings;

/// Chat with a curious bot, then get an intellectual humility assessment.
#[derive(Debug, Parser)]
#[command(name = "humility", version)]
pub struct Cli {
    /// Model for chat turns.
    #[arg(long)]
    pub model: Option<String>,

    /// Model for the assessment call.
    #[arg(long)]
    pub analysis_model: Option<String>,

    /// Root URL of an OpenAI-compatible API.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Settings file (defaults to ~/.humility/settings.json).
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long)]
    pub json_logs: bool,
}

impl Cli {
    /// Flags are the highest-priority layer, above env and file.
    pub fn apply(&self, settings: &mut HumilitySettings) {
        if let Some(model) = &self.model {
            settings.chat.model.clone_from(model);
        }
        if let Some(model) = &self.analysis_model {
            settings.analysis.model.clone_from(model);
        }
        if let Some(url) = &self.base_url {
            settings.api.base_url.clone_from(url);
        }
        if let Some(level) = &self.log_level {
            settings.logging.level.clone_from(level);
        }
        if self.json_logs {
            settings.logging.json = true;
        }
    }
}
