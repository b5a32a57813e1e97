use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::analysis::segmenter::SectionParser;
use crate::config::Config;
use crate::llm_client::ModelGateway;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable model backend. Default: `GeminiClient`.
    pub gateway: Arc<dyn ModelGateway>,
    /// Reply protocol. Default: `DelimitedSectionParser` (`|||`-separated sections).
    pub parser: Arc<dyn SectionParser>,
    pub config: Config,
    /// Cancelled on shutdown; each analysis runs under a child token.
    pub shutdown: CancellationToken,
}
