//! Outbound adapters: the social scheduling platform and the chat-completion backend.

pub mod error;
pub mod llm;
pub mod mock;
pub mod social;

pub use error::{ConnectError, Result};
pub use llm::ChatCompletionClient;
pub use mock::{CannedTextGenerator, FailingTextGenerator, MockSocialPlatform, SocialCall};
pub use social::{HttpSocialPlatform, SocialClientConfig};
