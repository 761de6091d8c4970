pub mod converter;
pub mod mock;
pub mod provider;

pub use mock::{MockProvider, MockResponse, RecordedCall};
pub use provider::{OpenAiConfig, OpenAiProvider};
