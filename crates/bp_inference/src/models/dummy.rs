use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bp_core::{ApiError, ChatMessage, Error, LanguageModel, Result};

/// Replays scripted replies in order and records every request it receives.
#[derive(Debug, Default)]
pub struct DummyModel {
    replies: Mutex<VecDeque<std::result::Result<String, ApiError>>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
    calls: AtomicUsize,
}

impl DummyModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let model = Self::new();
        for reply in replies {
            model.push_reply(reply);
        }
        model
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Ok(reply.into()));
    }

    pub fn push_error(&self, error: ApiError) {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Err(error));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl LanguageModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn chat(&self, messages: &[ChatMessage], _json_reply: bool) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(messages.to_vec());

        let next = self.replies.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
        match next {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(error)) => Err(error.into()),
            None => Err(Error::Inference("dummy model has no scripted reply left".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dummy_model_replays_script() {
        let model = DummyModel::with_replies(["first", "second"]);
        model.push_error(ApiError::Timeout);

        let messages = vec![ChatMessage::user("hi")];
        assert_eq!(model.chat(&messages, false).await.unwrap(), "first");
        assert_eq!(model.chat(&messages, true).await.unwrap(), "second");
        assert!(matches!(
            model.chat(&messages, false).await,
            Err(Error::Api(ApiError::Timeout))
        ));
        assert!(matches!(model.chat(&messages, false).await, Err(Error::Inference(_))));
        assert_eq!(model.calls(), 4);
        assert_eq!(model.requests()[0], messages);
    }
}
