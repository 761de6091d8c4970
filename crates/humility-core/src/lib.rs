pub mod conversation;
pub mod errors;
pub mod ids;
pub mod messages;
pub mod provider;
pub mod security;

pub use conversation::Conversation;
pub use errors::GatewayError;
pub use messages::{Message, Role};
pub use provider::{CompletionClient, CompletionOptions};
