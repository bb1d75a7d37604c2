/// Response bodies returned by the /generate-story endpoint.
///
/// All envelopes are camelCase on the wire to match what browser clients send.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub(crate) const SUCCESS_MESSAGE: &str = "Story generated successfully.";
pub(crate) const FAILURE_MESSAGE: &str = "An error occurred while generating the story.";
pub(crate) const VALIDATION_MESSAGE: &str = "Validation failed";

/// The generated story, exactly as the provider produced it.
///
/// Only the presence of the required top-level sections is checked before one of these is built;
/// nested content is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryResult(Map<String, Value>);

impl StoryResult {
    pub(crate) fn new(sections: Map<String, Value>) -> Self {
        Self(sections)
    }

    pub fn sections(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Body of a 200 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryResponse {
    pub message: String,
    pub story_result: Option<StoryResult>,
    pub error: Option<String>,
}

impl StoryResponse {
    pub(crate) fn success(story: StoryResult) -> Self {
        Self {
            message: SUCCESS_MESSAGE.to_string(),
            story_result: Some(story),
            error: None,
        }
    }
}

/// Body of a 400 response: one message per failing field plus a combined summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub message: String,
    pub errors: Vec<String>,
    pub error: String,
}

impl ValidationFailure {
    pub(crate) fn new(errors: Vec<String>, combined: String) -> Self {
        Self {
            message: VALIDATION_MESSAGE.to_string(),
            errors,
            error: combined,
        }
    }
}

/// Body of a 500 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    pub error: String,
}

impl ErrorResponse {
    pub(crate) fn generation_failed(error: String) -> Self {
        Self {
            message: FAILURE_MESSAGE.to_string(),
            error,
        }
    }
}
