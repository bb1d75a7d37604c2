//! Error taxonomy for the story service and how each error is presented over HTTP
use crate::models::{ErrorResponse, ValidationFailure};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Failures while turning a validated request into a story.
///
/// The `Display` text of every variant is safe to hand back to callers: upstream bodies, raw
/// replies and transport details are carried in the variant (and logged) but never rendered.
#[derive(Debug, thiserror::Error)]
pub enum StoryError {
    #[error("Failed to reach the story provider")]
    ProviderInvocation(String),

    #[error("The story provider responded with status {0}")]
    ProviderStatus(StatusCode),

    #[error("The story provider returned an empty response")]
    EmptyProviderResponse,

    #[error("The story provider returned malformed JSON")]
    MalformedProviderJson(#[source] serde_json::Error),

    #[error("The generated story is missing required sections: {}", .0.join(", "))]
    IncompleteStoryStructure(Vec<&'static str>),
}

impl IntoResponse for StoryError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::generation_failed(self.to_string())),
        )
            .into_response()
    }
}

/// Every field-level problem found in a request body, in check order. Always answered with 400.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Validation failed: {}", .messages.join(", "))]
pub struct ValidationErrors {
    pub messages: Vec<String>,
}

impl ValidationErrors {
    pub fn new(messages: Vec<String>) -> Self {
        Self { messages }
    }
}

impl IntoResponse for ValidationErrors {
    fn into_response(self) -> Response {
        let combined = self.to_string();
        (
            StatusCode::BAD_REQUEST,
            Json(ValidationFailure::new(self.messages, combined)),
        )
            .into_response()
    }
}

/// Conditions that stop the process before it serves anything.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be set to a non-empty provider API key")]
    MissingCredential { var: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_story_error_maps_to_500_without_story_result() {
        let response = StoryError::EmptyProviderResponse.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(
            body["message"],
            "An error occurred while generating the story."
        );
        assert_eq!(
            body["error"],
            "The story provider returned an empty response"
        );
        assert!(body.get("storyResult").is_none());
    }

    #[tokio::test]
    async fn test_provider_details_are_not_rendered() {
        let err = StoryError::ProviderInvocation("connection refused: 10.0.0.7:443".into());
        let body = body_json(err.into_response()).await;
        assert_eq!(body["error"], "Failed to reach the story provider");
    }

    #[test]
    fn test_incomplete_structure_names_missing_sections() {
        let err = StoryError::IncompleteStoryStructure(vec!["introduction", "cosmicBlueprint"]);
        assert_eq!(
            err.to_string(),
            "The generated story is missing required sections: introduction, cosmicBlueprint"
        );
    }

    #[tokio::test]
    async fn test_validation_errors_render_itemised_envelope() {
        let errors = ValidationErrors::new(vec![
            "Missing or invalid babyName".to_string(),
            "Missing or invalid birthCity".to_string(),
        ]);
        let response = errors.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Validation failed");
        assert_eq!(body["errors"].as_array().unwrap().len(), 2);
        assert_eq!(
            body["error"],
            "Validation failed: Missing or invalid babyName, Missing or invalid birthCity"
        );
    }
}
