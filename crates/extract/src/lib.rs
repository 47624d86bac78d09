pub mod error;
pub mod ids;
pub mod lexicon;
pub mod llm;
pub mod matcher;
pub mod parse;
pub mod pipeline;
pub mod prompt;
pub mod reconcile;
pub mod relation;
pub mod retry;
pub mod schema;
pub mod span;
pub mod srl;

pub use error::AugmentError;
pub use lexicon::TriggerLexicon;
pub use llm::{Augmenter, NoAugmenter, OllamaClient};
pub use matcher::{EntityMatcher, MatchStrategy};
pub use parse::{DependencyParser, HttpDependencyParser, ParsedDocument, PrecomputedParse};
pub use pipeline::{
    DocumentInput, EventPipeline, PipelineConfig, PipelineOutput, PipelineReport, ReconcileOrder, StageStatus,
};
pub use reconcile::{Reconciled, Reconciler};
pub use relation::RelationLinker;
pub use retry::RetryPolicy;
pub use schema::{Entity, EntityType, Event, EventDocument, ExtractionResult, Trigger};
pub use span::SpanResolver;
pub use srl::ArgumentExtractor;
