use std::sync::Arc;
use std::time::Duration;

pub mod keys;
pub mod models;
pub mod prompts;
pub mod reply;

pub use keys::{KeyRing, RotationPolicy, Sequential};

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

#[derive(Debug, Clone)]
pub struct Config {
    pub keys: KeyRing,
    pub model_name: String,
    pub base_url: String,
    pub temperature: f32,
    pub timeout: Duration,
    pub rotation: Arc<dyn RotationPolicy>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keys: KeyRing::default(),
            model_name: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.7,
            timeout: Duration::from_secs(60),
            rotation: Arc::new(Sequential),
        }
    }
}

impl Config {
    pub fn with_keys(keys: KeyRing) -> Self {
        Self {
            keys,
            ..Self::default()
        }
    }
}

pub mod prelude {
    pub use super::models::{create_model, dummy::DummyModel, groq::GroqModel};
    pub use super::prompts::{Persona, Prompt, PromptTemplate, StructureVariant};
    pub use super::reply::parse_json_reply;
    pub use super::{Config, KeyRing, RotationPolicy, Sequential};
    pub use bp_core::{ChatMessage, Error, LanguageModel, Result};
}

pub use models::create_model;
