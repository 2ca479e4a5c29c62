pub mod ai_provider;
pub mod ai_service;
pub mod error;
pub mod http;
pub mod json;
pub mod prompts;
pub mod providers;
pub mod roast;
pub mod verdict;

pub use ai_provider::{create_provider, AiProviderTrait};
pub use ai_service::AiService;
pub use error::ClassifierError;
pub use verdict::{ClassificationVerdict, Decision, VideoMetadata};
