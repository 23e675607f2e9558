use bp_core::{Error, Result};
use serde::de::DeserializeOwned;

/// Parse the JSON object out of a model reply, tolerating code fences and chatter around it.
pub fn parse_json_reply<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let trimmed = raw.trim();
    let start = trimmed.find('{');
    let end = trimmed.rfind('}');
    let candidate = match (start, end) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    };
    serde_json::from_str(candidate)
        .map_err(|e| Error::Inference(format!("malformed JSON reply: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Debug, PartialEq)]
    struct Reply {
        title: String,
    }

    #[test]
    fn test_parse_plain_and_fenced_replies() {
        let plain: Reply = parse_json_reply(r#"{"title":"a"}"#).unwrap();
        assert_eq!(plain.title, "a");

        let fenced: Reply = parse_json_reply("```json\n{\"title\": \"b\"}\n```").unwrap();
        assert_eq!(fenced.title, "b");

        let chatty: Reply = parse_json_reply("Sure! {\"title\": \"c\"} Hope this helps.").unwrap();
        assert_eq!(chatty.title, "c");
    }

    #[test]
    fn test_malformed_reply_is_an_inference_error() {
        let result: Result<Reply> = parse_json_reply("no json here");
        assert!(matches!(result, Err(Error::Inference(_))));
    }
}
