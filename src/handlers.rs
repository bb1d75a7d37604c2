/// Axum handlers for the story server
use crate::AppState;
use crate::errors::ValidationErrors;
use crate::models::StoryResponse;
use crate::provider::TextProvider;
use crate::story::generate_story;
use crate::validation::validate_birth_request;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};
use tracing::{debug, error, info, instrument, warn};

/// Handler for POST /generate-story
///
/// Always answers with a JSON body: 200 with the story, 400 with the validation messages, or 500
/// when generation fails. A body sent without a JSON content type is not parsed and validates as
/// an empty object.
#[instrument(skip(state, payload))]
pub async fn generate_story_handler<P: TextProvider + 'static>(
    State(state): State<AppState<P>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    info!("Received request on /generate-story");

    let body = match payload {
        Ok(Json(body)) => body,
        Err(JsonRejection::MissingJsonContentType(rejection)) => {
            warn!(error = %rejection.body_text(), "Ignoring body without a JSON content type");
            Value::Object(Map::new())
        }
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected unreadable request body");
            return ValidationErrors::new(vec![rejection_message(&rejection).to_string()])
                .into_response();
        }
    };
    debug!(body = %body, "Request body");

    let request = match validate_birth_request(&body) {
        Ok(request) => request,
        Err(errors) => {
            error!(errors = ?errors.messages, "Validation failed");
            return errors.into_response();
        }
    };
    info!(baby_name = %request.baby_name, "Validation successful");

    match generate_story(state.provider.as_ref(), &request).await {
        Ok(story) => (StatusCode::OK, Json(StoryResponse::success(story))).into_response(),
        Err(e) => {
            error!(error = %e, "Story generation failed");
            e.into_response()
        }
    }
}

fn rejection_message(rejection: &JsonRejection) -> &'static str {
    match rejection {
        JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON",
        JsonRejection::BytesRejection(_) => "Failed to read request body",
        _ => "Invalid request body",
    }
}
