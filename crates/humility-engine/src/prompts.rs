//! Prompt assembly for the two kinds of completion call.
//!
//! Both builders are pure: the same transcript always yields the same messages.

use humility_core::conversation::Conversation;
use humility_core::messages::Message;

/// Seed instruction for every session.
pub const PERSONA_PROMPT: &str = "You are a fun, inquisitive chatbot. \
Your personality is playful, curious, and friendly. \
You love asking about what the user likes to talk about with friends, \
how they react to disagreements on mundane topics (sports, art, restaurants) \
and heavier topics (politics), etc. \
After about 5–10 user messages, you will politely wrap up and attempt to end \
the conversation so that an 'intellectual humility' analysis can be performed. \
Try to keep the conversation going for at least 5 user messages before ending.";

/// System instruction for the assessment call.
pub const ANALYSIS_SYSTEM_PROMPT: &str = "You are an expert psychologist asked to analyze a conversation. \
You will be given the entire conversation between the user and the assistant. \
Please produce an 'intellectual humility' assessment of the user, \
from 1 (low humility) to 10 (high humility), along with a short explanation.";

const ANALYSIS_PREAMBLE: &str = "Here is the conversation:";
const ANALYSIS_CLOSING: &str = "Please provide your analysis now.";

/// Context for the next assistant reply: the whole transcript, persona first.
pub fn build_chat_prompt(conversation: &Conversation) -> &[Message] {
    conversation.all()
}

/// Exactly two messages: the assessment instruction and the flattened transcript.
pub fn build_analysis_prompt(conversation: &Conversation) -> Vec<Message> {
    let content = format!(
        "{ANALYSIS_PREAMBLE}\n\n{}\n\n{ANALYSIS_CLOSING}",
        render_transcript(conversation)
    );
    vec![Message::system(ANALYSIS_SYSTEM_PROMPT), Message::user(content)]
}

/// Flatten a transcript into `ROLE:\ncontent` blocks separated by blank lines.
pub fn render_transcript(conversation: &Conversation) -> String {
    conversation
        .all()
        .iter()
        .map(|m| format!("{}:\n{}\n", m.role().label(), m.content()))
        .collect::<Vec<_>>()
        .join("\n")
}
