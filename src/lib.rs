//! birth-story - personalised birth stories written by an LLM
//!
//! This library validates birth details posted to `/generate-story`, turns them into a prompt,
//! asks a text-generation provider for a story in JSON mode and relays the parsed story back.

use axum::Router;
use axum::routing::post;
use axum_prometheus::{
    GenericMetricLayer, Handle, PrometheusMetricLayerBuilder,
    metrics_exporter_prometheus::PrometheusHandle,
};
use std::borrow::Cow;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

pub mod client;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod prompt;
pub mod provider;
pub mod schema;
pub mod story;
pub mod validation;

use client::HyperClient;
use handlers::generate_story_handler;
use provider::{OpenAiProvider, TextProvider};

/// The main application state: the provider every request is sent to.
///
/// The provider is built once at startup and shared by all in-flight requests.
#[derive(Debug)]
pub struct AppState<P: TextProvider> {
    pub provider: Arc<P>,
}

impl<P: TextProvider> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
        }
    }
}

impl<P: TextProvider> AppState<P> {
    /// Create a new AppState around any provider (useful for testing)
    pub fn new(provider: P) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }
}

/// State used by the binary: the OpenAI-compatible provider over the pooled hyper client.
pub type DefaultAppState = AppState<OpenAiProvider<HyperClient>>;

/// Build the main router
/// This creates routes for:
/// - `/generate-story` - Validates birth details and returns a generated story
///
/// Any origin may call it.
#[instrument(skip(state))]
pub fn build_router<P: TextProvider + 'static>(state: AppState<P>) -> Router {
    info!("Building router");
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/generate-story", post(generate_story_handler::<P>))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Builds a router for the metrics endpoint.
#[instrument(skip(handle))]
pub fn build_metrics_router(handle: PrometheusHandle) -> Router {
    info!("Building metrics router");
    Router::new().route(
        "/metrics",
        axum::routing::get(move || async move { handle.render() }),
    )
}

type MetricsLayerAndHandle = (
    GenericMetricLayer<'static, PrometheusHandle, Handle>,
    PrometheusHandle,
);

/// Builds a layer and handle for prometheus metrics collection.
///
/// `prefix` is prepended to every metric name; it must live for the whole program, which the
/// `Cow<'static, str>` bound allows for both literals and owned strings.
pub fn build_metrics_layer_and_handle(
    prefix: impl Into<Cow<'static, str>>,
) -> MetricsLayerAndHandle {
    info!("Building metrics layer");
    PrometheusMetricLayerBuilder::new()
        .with_prefix(prefix)
        .enable_response_body_size(true)
        .with_endpoint_label_type(axum_prometheus::EndpointLabel::Exact)
        .with_default_metrics()
        .build_pair()
}
