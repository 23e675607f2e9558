use std::sync::Arc;

use bp_core::{Error, LanguageModel, Result};

use crate::Config;

pub mod dummy;
pub mod groq;

/// Build a chat model by provider name.
pub fn create_model(name: &str, config: Config) -> Result<Arc<dyn LanguageModel>> {
    match name.to_ascii_lowercase().as_str() {
        "groq" | "llama" => Ok(Arc::new(groq::GroqModel::new(config)?)),
        "dummy" => Ok(Arc::new(dummy::DummyModel::new())),
        other => Err(Error::Config(format!("Unknown model provider: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyRing;

    #[test]
    fn test_create_model() {
        let config = Config::with_keys(KeyRing::new([Some("key".to_string())]));
        assert_eq!(create_model("groq", config.clone()).unwrap().name(), "Groq");
        assert_eq!(create_model("dummy", config.clone()).unwrap().name(), "Dummy");
        assert!(create_model("gpt", config).is_err());
        assert!(matches!(create_model("groq", Config::default()), Err(Error::Config(_))));
    }
}
