mod cli;
mod repl;

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::io::BufReader;
use tracing::{info, Instrument, Level};

use humility_engine::{ModelChoice, Session, SessionConfig};
use humility_llm::{OpenAiConfig, OpenAiProvider};
use humility_settings::HumilitySettings;
use humility_telemetry::{LogFormat, TelemetryConfig};

use crate::cli::Cli;
use crate::repl::Repl;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings_path = cli.settings.clone().unwrap_or_else(humility_settings::settings_path);
    let mut settings = humility_settings::load_settings_from_path(&settings_path)
        .with_context(|| format!("loading settings from {}", settings_path.display()))?;
    cli.apply(&mut settings);
    settings.validate()?;

    humility_telemetry::init_telemetry(&telemetry_config(&settings));

    // Without a credential the session cannot start.
    let api_key = humility_settings::resolve_api_key(&settings_path, |name| std::env::var(name).ok())?;

    let provider = OpenAiProvider::new(OpenAiConfig {
        api_key,
        base_url: settings.api.base_url.clone(),
        connect_timeout: Duration::from_secs(settings.api.connect_timeout_secs),
        request_timeout: Duration::from_secs(settings.api.request_timeout_secs),
    })?;

    let session = Session::new(provider, session_config(&settings));
    let span = tracing::info_span!("session", session_id = %session.id());
    info!(parent: &span, chat_model = %settings.chat.model, analysis_model = %settings.analysis.model, "session started");

    let mut repl = Repl::new(session, BufReader::new(tokio::io::stdin()), tokio::io::stdout());
    repl.run().instrument(span).await?;

    Ok(())
}

fn telemetry_config(settings: &HumilitySettings) -> TelemetryConfig {
    TelemetryConfig {
        log_level: humility_telemetry::parse_level(&settings.logging.level).unwrap_or(Level::WARN),
        module_levels: Vec::new(),
        format: if settings.logging.json {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        },
    }
}

fn session_config(settings: &HumilitySettings) -> SessionConfig {
    let choice = |section: &humility_settings::ModelSettings| ModelChoice {
        model: section.model.clone(),
        max_tokens: section.max_tokens,
    };
    SessionConfig {
        chat: choice(&settings.chat),
        analysis: choice(&settings.analysis),
        ..SessionConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_config_follows_settings() {
        let mut settings = HumilitySettings::default();
        settings.chat.model = "gpt-4o-mini".into();
        settings.analysis.max_tokens = Some(512);

        let config = session_config(&settings);

        assert_eq!(config.chat, ModelChoice::new("gpt-4o-mini"));
        assert_eq!(config.analysis.model, "gpt-3.5-turbo");
        assert_eq!(config.analysis.max_tokens, Some(512));
        assert_eq!(config.persona, humility_engine::prompts::PERSONA_PROMPT);
    }

    #[test]
    fn telemetry_config_falls_back_to_warn() {
        let mut settings = HumilitySettings::default();
        settings.logging.level = "chatty".into();
        settings.logging.json = true;

        let config = telemetry_config(&settings);

        assert_eq!(config.log_level, Level::WARN);
        assert_eq!(config.format, LogFormat::Json);
    }
}
