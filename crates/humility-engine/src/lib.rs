pub mod error;
pub mod prompts;
pub mod session;

pub use error::SessionError;
pub use prompts::{build_analysis_prompt, build_chat_prompt};
pub use session::{
    Analysis, ModelChoice, Phase, Session, SessionConfig, ANALYSIS_TEMPERATURE, ANALYSIS_THRESHOLD,
    CHAT_TEMPERATURE,
};
