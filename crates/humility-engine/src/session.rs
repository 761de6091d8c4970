use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use humility_core::conversation::Conversation;
use humility_core::ids::SessionId;
use humility_core::messages::Message;
use humility_core::provider::{CompletionClient, CompletionOptions};

use crate::error::SessionError;
use crate::prompts::{self, PERSONA_PROMPT};

/// Default model for both call types.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
/// User turns required before the assessment is offered.
pub const ANALYSIS_THRESHOLD: usize = 5;
/// Sampling temperature for chat turns.
pub const CHAT_TEMPERATURE: f64 = 0.9;
/// Sampling temperature for the assessment call.
pub const ANALYSIS_TEMPERATURE: f64 = 0.0;

/// Model selection for one kind of call. Temperature is not part of it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelChoice {
    pub model: String,
    pub max_tokens: Option<u32>,
}

impl ModelChoice {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_tokens: None,
        }
    }

    fn options(&self, temperature: f64) -> CompletionOptions {
        CompletionOptions {
            model: self.model.clone(),
            temperature,
            max_tokens: self.max_tokens,
        }
    }
}

/// Fixed per-session parameters.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub persona: String,
    pub chat: ModelChoice,
    pub analysis: ModelChoice,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            persona: PERSONA_PROMPT.to_string(),
            chat: ModelChoice::new(DEFAULT_MODEL),
            analysis: ModelChoice::new(DEFAULT_MODEL),
        }
    }
}

/// Where a session stands with respect to the assessment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Fewer user turns than the threshold.
    Chatting,
    AnalysisAvailable,
    /// At least one assessment has been produced. Chatting and re-running
    /// the assessment remain allowed.
    AnalysisComplete,
}

impl Phase {
    pub fn allows_analysis(self) -> bool {
        !matches!(self, Self::Chatting)
    }
}

/// Result of one assessment call.
#[derive(Clone, Debug, PartialEq)]
pub struct Analysis {
    /// Model output with surrounding whitespace removed.
    pub text: String,
    /// User turns in the transcript that was assessed.
    pub user_turns: usize,
    /// Messages in the transcript that was assessed, persona included.
    pub transcript_len: usize,
    pub completed_at: DateTime<Utc>,
}

/// One chat session: the transcript plus the controller that is its only writer.
///
/// Every mutating operation takes `&mut self`, so two submissions can never
/// interleave on the same session.
pub struct Session<C> {
    id: SessionId,
    client: C,
    config: SessionConfig,
    chat_options: CompletionOptions,
    analysis_options: CompletionOptions,
    conversation: Conversation,
    last_analysis: Option<Analysis>,
}

impl<C: CompletionClient> Session<C> {
    pub fn new(client: C, config: SessionConfig) -> Self {
        let conversation = Conversation::seeded(config.persona.clone());
        Self {
            id: SessionId::new(),
            client,
            chat_options: config.chat.options(CHAT_TEMPERATURE),
            analysis_options: config.analysis.options(ANALYSIS_TEMPERATURE),
            config,
            conversation,
            last_analysis: None,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn user_turns(&self) -> usize {
        self.conversation.count_user_turns()
    }

    /// User turns still needed before the assessment unlocks (0 once available).
    pub fn turns_until_analysis(&self) -> usize {
        ANALYSIS_THRESHOLD.saturating_sub(self.user_turns())
    }

    pub fn last_analysis(&self) -> Option<&Analysis> {
        self.last_analysis.as_ref()
    }

    pub fn phase(&self) -> Phase {
        if self.user_turns() < ANALYSIS_THRESHOLD {
            Phase::Chatting
        } else if self.last_analysis.is_some() {
            Phase::AnalysisComplete
        } else {
            Phase::AnalysisAvailable
        }
    }

    /// Record a user message and the assistant's reply to it.
    ///
    /// The user message is committed together with the reply: if the
    /// completion call fails the transcript is left exactly as it was and the
    /// text comes back in [`SessionError::Transport`].
    #[instrument(skip(self, text), fields(session_id = %self.id, user_turn = self.user_turns() + 1))]
    pub async fn submit_user_message(&mut self, text: &str) -> Result<String, SessionError> {
        if text.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        let mut staged = self.conversation.clone();
        staged.append(Message::user(text));

        let reply = self
            .client
            .complete(prompts::build_chat_prompt(&staged), &self.chat_options)
            .await
            .map_err(|source| {
                warn!(error_kind = source.error_kind(), error = %source, "chat turn failed, transcript unchanged");
                SessionError::Transport {
                    source,
                    unsent: Some(text.to_string()),
                }
            })?;

        staged.append(Message::assistant(reply.clone()));
        let was_chatting = self.phase() == Phase::Chatting;
        self.conversation = staged;

        if was_chatting && self.phase().allows_analysis() {
            info!(user_turns = self.user_turns(), "analysis now available");
        }
        Ok(reply)
    }

    /// Run the humility assessment over the full transcript.
    ///
    /// Rejected without calling the client while fewer than
    /// [`ANALYSIS_THRESHOLD`] user turns exist. Never modifies the transcript.
    #[instrument(skip(self), fields(session_id = %self.id, user_turns = self.user_turns()))]
    pub async fn request_analysis(&mut self) -> Result<&Analysis, SessionError> {
        let user_turns = self.user_turns();
        if !self.phase().allows_analysis() {
            return Err(SessionError::AnalysisUnavailable {
                user_turns,
                required: ANALYSIS_THRESHOLD,
            });
        }

        let prompt = prompts::build_analysis_prompt(&self.conversation);
        let raw = self
            .client
            .complete(&prompt, &self.analysis_options)
            .await
            .map_err(|source| {
                warn!(error_kind = source.error_kind(), error = %source, "analysis failed");
                SessionError::Transport { source, unsent: None }
            })?;

        info!(rerun = self.last_analysis.is_some(), "analysis complete");
        Ok(self.last_analysis.insert(Analysis {
            text: raw.trim().to_string(),
            user_turns,
            transcript_len: self.conversation.len(),
            completed_at: Utc::now(),
        }))
    }
}
