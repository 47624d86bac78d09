use std::sync::Arc;

use anyhow::Result;
use extract::{
    AugmentError, Augmenter, DependencyParser, EventPipeline, HttpDependencyParser, NoAugmenter, OllamaClient,
    ParsedDocument, TriggerLexicon,
};
use tracing::info;

use crate::cache::{CachedAugmenter, ResponseCache};
use crate::config::AppConfig;
use crate::metrics::Metrics;

/// Parser collaborator selected by configuration.
pub enum ServiceParser {
    Http(HttpDependencyParser),
    Disabled,
}

impl DependencyParser for ServiceParser {
    async fn parse(&self, text: &str) -> Result<ParsedDocument> {
        match self {
            ServiceParser::Http(parser) => parser.parse(text).await,
            ServiceParser::Disabled => anyhow::bail!("no parser service configured"),
        }
    }
}

/// Augmentation collaborator selected by configuration.
pub enum ServiceAugmenter {
    Ollama(OllamaClient),
    Disabled(NoAugmenter),
}

impl Augmenter for ServiceAugmenter {
    async fn augment(&self, prompt: &str) -> Result<String, AugmentError> {
        match self {
            ServiceAugmenter::Ollama(client) => client.augment(prompt).await,
            ServiceAugmenter::Disabled(none) => none.augment(prompt).await,
        }
    }
}

pub struct AppState {
    pub config: AppConfig,
    pub parser: ServiceParser,
    pub augmenter: CachedAugmenter<ServiceAugmenter>,
    pub lexicon: TriggerLexicon,
    pub cache: Arc<ResponseCache>,
    pub metrics: Arc<Metrics>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let parser = match &config.parser.base_url {
            Some(url) => ServiceParser::Http(HttpDependencyParser::new(url.clone())),
            None => ServiceParser::Disabled,
        };

        let augmenter = match &config.ollama.base_url {
            Some(url) => ServiceAugmenter::Ollama(
                OllamaClient::new(url.clone(), config.ollama.model.clone()).with_retry(config.retry.policy()),
            ),
            None => ServiceAugmenter::Disabled(NoAugmenter),
        };

        let max_entries = if config.cache.enabled { config.cache.max_entries } else { 0 };
        let cache = ResponseCache::new(max_entries);

        info!(
            mode = ?config.mode,
            parser = ?config.parser.base_url,
            ollama = ?config.ollama.base_url,
            model = %config.ollama.model,
            cache_entries = max_entries,
            "Application state ready"
        );

        Self {
            parser,
            augmenter: CachedAugmenter::new(augmenter, cache.clone()),
            lexicon: TriggerLexicon::new(),
            cache,
            metrics: Metrics::new(),
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Pipeline over the configured collaborators.
    pub fn pipeline(&self) -> EventPipeline<&ServiceParser, &CachedAugmenter<ServiceAugmenter>> {
        EventPipeline::new(&self.parser, &self.augmenter, self.config.pipeline.clone())
    }

    /// Pipeline with a caller-supplied parser in place of the configured one.
    pub fn pipeline_with<P: DependencyParser + Send + Sync>(
        &self,
        parser: P,
    ) -> EventPipeline<P, &CachedAugmenter<ServiceAugmenter>> {
        EventPipeline::new(parser, &self.augmenter, self.config.pipeline.clone())
    }

    pub fn shared(config: AppConfig) -> Arc<Self> {
        Arc::new(Self::new(config))
    }
}
