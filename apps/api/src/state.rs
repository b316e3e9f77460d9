use std::sync::Arc;

use crate::config::Config;
use crate::conversation::store::SessionStore;
use crate::extraction::parser::FieldParser;
use crate::fetch::SourceFetcher;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Scraping backend. Default: HttpFetcher.
    pub fetcher: Arc<dyn SourceFetcher>,
    /// AI parsing backend. LlmFieldParser when ANTHROPIC_API_KEY is set,
    /// HeuristicFieldParser otherwise.
    pub parser: Arc<dyn FieldParser>,
    /// In-memory conversation sessions; nothing outlives the process.
    pub sessions: SessionStore,
}

#[cfg(test)]
impl AppState {
    /// State with the given fetcher, the heuristic parser, and default config.
    pub fn for_tests(fetcher: Arc<dyn SourceFetcher>) -> Self {
        Self {
            config: Config::default(),
            fetcher,
            parser: Arc::new(crate::extraction::parser::HeuristicFieldParser),
            sessions: SessionStore::default(),
        }
    }
}
