//! Story generation: prompt the provider, then check and unwrap its reply
use crate::errors::StoryError;
use crate::models::StoryResult;
use crate::prompt::build_story_prompt;
use crate::provider::TextProvider;
use crate::schema::{REQUIRED_SECTIONS, story_schema};
use crate::validation::BirthRequest;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

/// Runs one generation for a validated request. All-or-nothing: no partial story is returned.
#[instrument(skip_all, fields(baby_name = %request.baby_name))]
pub async fn generate_story<P: TextProvider + ?Sized>(
    provider: &P,
    request: &BirthRequest,
) -> Result<StoryResult, StoryError> {
    let schema = story_schema();
    let prompt = build_story_prompt(request, &schema);
    debug!(prompt_len = prompt.len(), "Built story prompt");

    let reply = provider.complete(&prompt, true).await?;
    let story = parse_story_reply(reply.as_deref())?;

    let gaps = schema.missing_paths(story.sections());
    if !gaps.is_empty() {
        warn!(missing = ?gaps, "Story is missing optional fields, passing through as-is");
    }

    info!("Story generated");
    Ok(story)
}

/// Parses the provider's reply text into a story.
///
/// The reply must be a JSON object carrying every section in [`REQUIRED_SECTIONS`]; nothing
/// below the top level is checked.
pub fn parse_story_reply(reply: Option<&str>) -> Result<StoryResult, StoryError> {
    let text = match reply {
        Some(text) if !text.trim().is_empty() => text,
        _ => {
            error!("Story provider returned no content");
            return Err(StoryError::EmptyProviderResponse);
        }
    };

    let parsed: Value = serde_json::from_str(text).map_err(|e| {
        error!(error = %e, raw_reply = %text, "Failed to parse story JSON from provider");
        StoryError::MalformedProviderJson(e)
    })?;

    let Value::Object(sections) = parsed else {
        error!(raw_reply = %text, "Story reply is not a JSON object");
        return Err(StoryError::IncompleteStoryStructure(REQUIRED_SECTIONS.to_vec()));
    };

    let missing: Vec<&'static str> = REQUIRED_SECTIONS
        .into_iter()
        .filter(|section| sections.get(*section).is_none_or(Value::is_null))
        .collect();
    if !missing.is_empty() {
        error!(?missing, "Story reply is missing required sections");
        return Err(StoryError::IncompleteStoryStructure(missing));
    }

    Ok(StoryResult::new(sections))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct RecordingProvider {
        reply: Option<String>,
        calls: Arc<Mutex<Vec<(String, bool)>>>,
    }

    #[async_trait]
    impl TextProvider for RecordingProvider {
        async fn complete(
            &self,
            prompt: &str,
            json_mode: bool,
        ) -> Result<Option<String>, StoryError> {
            self.calls
                .lock()
                .unwrap()
                .push((prompt.to_string(), json_mode));
            Ok(self.reply.clone())
        }
    }

    fn mia() -> BirthRequest {
        BirthRequest {
            baby_name: "Mia".into(),
            birth_date: "2023-05-10".into(),
            birth_time: "14:30".into(),
            birth_city: "Austin".into(),
            approximate_time: false,
        }
    }

    #[test]
    fn test_empty_replies_are_rejected() {
        for reply in [None, Some(""), Some("  \n")] {
            assert!(matches!(
                parse_story_reply(reply),
                Err(StoryError::EmptyProviderResponse)
            ));
        }
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        for reply in ["{\"introduction\": ", "Sure! Here is your story", "```json\n{}\n```"] {
            assert!(matches!(
                parse_story_reply(Some(reply)),
                Err(StoryError::MalformedProviderJson(_))
            ));
        }
    }

    #[test]
    fn test_non_objects_are_incomplete() {
        for reply in ["[]", "null", "\"story\"", "42"] {
            assert!(matches!(
                parse_story_reply(Some(reply)),
                Err(StoryError::IncompleteStoryStructure(missing)) if missing == REQUIRED_SECTIONS
            ));
        }
    }

    #[test]
    fn test_missing_or_null_required_sections_are_incomplete() {
        let reply = json!({"introduction": {"title": "Hi"}, "milestones": {}}).to_string();
        assert!(matches!(
            parse_story_reply(Some(&reply)),
            Err(StoryError::IncompleteStoryStructure(missing)) if missing == ["cosmicBlueprint"]
        ));

        let reply = json!({"introduction": null, "cosmicBlueprint": {}}).to_string();
        assert!(matches!(
            parse_story_reply(Some(&reply)),
            Err(StoryError::IncompleteStoryStructure(missing)) if missing == ["introduction"]
        ));
    }

    #[test]
    fn test_reply_is_passed_through_verbatim() {
        let reply = json!({
            "introduction": {"title": "Hello Mia 👶", "text": "Welcome"},
            "cosmicBlueprint": {"sun": {"sign": "Taurus", "icon": "♉"}},
            "extra": [1, 2, 3]
        });

        let story = parse_story_reply(Some(&reply.to_string())).unwrap();
        assert_eq!(story.into_value(), reply);
    }

    #[tokio::test]
    async fn test_generate_story_prompts_once_in_json_mode() {
        let story = story_schema().example();
        let provider = RecordingProvider {
            reply: Some(story.to_string()),
            ..Default::default()
        };

        let result = generate_story(&provider, &mia()).await.unwrap();
        assert_eq!(result.into_value(), story);

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (prompt, json_mode) = &calls[0];
        assert!(*json_mode);
        assert!(prompt.contains("Mia"));
        assert!(prompt.contains("Austin"));
    }

    #[tokio::test]
    async fn test_generate_story_accepts_partial_optional_sections() {
        let provider = RecordingProvider {
            reply: Some(json!({"introduction": {}, "cosmicBlueprint": {}}).to_string()),
            ..Default::default()
        };

        let result = generate_story(&provider, &mia()).await.unwrap();
        assert_eq!(result.sections().len(), 2);
    }
}
