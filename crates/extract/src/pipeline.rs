use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn, Instrument};

use crate::error::AugmentError;
use crate::lexicon::TriggerLexicon;
use crate::llm::Augmenter;
use crate::parse::DependencyParser;
use crate::prompt;
use crate::reconcile::{Reconciled, Reconciler};
use crate::relation::RelationLinker;
use crate::schema::{Entity, Event, EventDocument, ExtractionResult, Trigger};
use crate::srl::ArgumentExtractor;

/// When entity/trigger reconciliation happens relative to argument extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOrder {
    /// Merge model entities/triggers first, then extract arguments over the
    /// merged sets.
    #[default]
    EntitiesFirst,
    /// Extract arguments over the rule-based sets, then merge.
    EventsFirst,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub order: ReconcileOrder,
    pub augment_entities: bool,
    pub augment_events: bool,
    pub augment_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            order: ReconcileOrder::EntitiesFirst,
            augment_entities: true,
            augment_events: true,
            augment_timeout_secs: 60,
        }
    }
}

/// Rule-based inputs for one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentInput {
    pub document_id: String,
    pub text: String,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum StageStatus {
    #[default]
    Skipped,
    Applied,
    FellBack(String),
}

impl StageStatus {
    fn from_reconciled<T>(reconciled: &Reconciled<T>) -> Self {
        match &reconciled.issue {
            Some(err) => StageStatus::FellBack(err.to_string()),
            None => StageStatus::Applied,
        }
    }

    pub fn fell_back(&self) -> bool {
        matches!(self, StageStatus::FellBack(_))
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    pub entities_added: usize,
    pub triggers_added: usize,
    pub basic_events: usize,
    pub events_added: usize,
    pub relations: usize,
    pub parse_failed: bool,
    pub entity_augmentation: StageStatus,
    pub event_augmentation: StageStatus,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub document: EventDocument,
    pub report: PipelineReport,
}

impl DocumentInput {
    /// Fill trigger candidates from the lexicon when none were supplied.
    pub fn with_lexicon_triggers(mut self, lexicon: &TriggerLexicon) -> Self {
        if self.triggers.is_empty() {
            self.triggers = lexicon.extract_triggers(&self.text);
        }
        self
    }
}

/// Per-document event extraction: SRL, augmentation, reconciliation and
/// relation linking.
pub struct EventPipeline<P, A> {
    parser: P,
    augmenter: A,
    extractor: ArgumentExtractor,
    linker: RelationLinker,
    config: PipelineConfig,
}

impl<P, A> EventPipeline<P, A>
where
    P: DependencyParser + Send + Sync,
    A: Augmenter + Send + Sync,
{
    pub fn new(parser: P, augmenter: A, config: PipelineConfig) -> Self {
        Self {
            parser,
            augmenter,
            extractor: ArgumentExtractor::new(),
            linker: RelationLinker::new(),
            config,
        }
    }

    /// Run one document start to finish. Never fails: every stage either
    /// extends the previous stage's output or passes it through unchanged.
    pub async fn process(&self, input: DocumentInput) -> PipelineOutput {
        let span = info_span!("document", document_id = %input.document_id);
        self.process_inner(input).instrument(span).await
    }

    async fn process_inner(&self, input: DocumentInput) -> PipelineOutput {
        let mut report = PipelineReport::default();

        if input.text.trim().is_empty() {
            info!("Empty text, nothing to extract");
            return PipelineOutput {
                document: EventDocument::empty(input.document_id),
                report,
            };
        }

        let mut reconciler = Reconciler::new();
        let mut rule_based = ExtractionResult {
            entities: input.entities,
            event_triggers: input.triggers,
        };
        reconciler.assign_base_ids(&mut rule_based);

        let (extraction, basic_events) = match self.config.order {
            ReconcileOrder::EntitiesFirst => {
                let extraction = self.reconcile_extraction(&mut reconciler, &input.text, &rule_based, &mut report).await;
                let events = self.extract_arguments(&input.text, &extraction, &mut report).await;
                (extraction, events)
            }
            ReconcileOrder::EventsFirst => {
                let events = self.extract_arguments(&input.text, &rule_based, &mut report).await;
                let extraction = self.reconcile_extraction(&mut reconciler, &input.text, &rule_based, &mut report).await;
                (extraction, events)
            }
        };

        if extraction.event_triggers.is_empty() {
            info!("No triggers, skipping event construction");
            return PipelineOutput {
                document: EventDocument {
                    document_id: input.document_id,
                    events: Vec::new(),
                    entities: extraction.entities,
                },
                report,
            };
        }

        let mut events = if self.config.augment_events {
            let prompt = prompt::build_event_prompt(
                &input.text,
                &extraction.entities,
                &extraction.event_triggers,
                &basic_events,
            );
            let response = self.call_augmenter(&prompt).await;
            let reconciled = reconciler.reconcile_events(&basic_events, response, &extraction.entities);
            report.event_augmentation = StageStatus::from_reconciled(&reconciled);
            reconciled.value
        } else {
            basic_events
        };
        report.events_added = events.len().saturating_sub(report.basic_events);

        self.linker.link(&mut events);
        report.relations = events.iter().map(|e| e.relations.len()).sum();

        info!(
            events = events.len(),
            entities = extraction.entities.len(),
            relations = report.relations,
            "Document processed"
        );

        PipelineOutput {
            document: EventDocument {
                document_id: input.document_id,
                events,
                entities: extraction.entities,
            },
            report,
        }
    }

    async fn reconcile_extraction(
        &self,
        reconciler: &mut Reconciler,
        text: &str,
        rule_based: &ExtractionResult,
        report: &mut PipelineReport,
    ) -> ExtractionResult {
        if !self.config.augment_entities {
            return rule_based.clone();
        }

        let prompt = prompt::build_entity_prompt(text, rule_based);
        let response = self.call_augmenter(&prompt).await;
        let reconciled = reconciler.reconcile_extraction(rule_based, response);

        report.entity_augmentation = StageStatus::from_reconciled(&reconciled);
        report.entities_added = reconciled.value.entities.len().saturating_sub(rule_based.entities.len());
        report.triggers_added = reconciled.value.event_triggers.len().saturating_sub(rule_based.event_triggers.len());
        reconciled.value
    }

    async fn extract_arguments(
        &self,
        text: &str,
        extraction: &ExtractionResult,
        report: &mut PipelineReport,
    ) -> Vec<Event> {
        if extraction.event_triggers.is_empty() {
            return Vec::new();
        }

        let events = match self.parser.parse(text).await {
            Ok(doc) => self.extractor.extract(&doc, &extraction.event_triggers, &extraction.entities),
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Dependency parse failed, no basic events");
                report.parse_failed = true;
                Vec::new()
            }
        };
        report.basic_events = events.len();
        events
    }

    async fn call_augmenter(&self, prompt: &str) -> Result<String, AugmentError> {
        let timeout = Duration::from_secs(self.config.augment_timeout_secs);
        match tokio::time::timeout(timeout, self.augmenter.augment(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(AugmentError::Timeout(self.config.augment_timeout_secs)),
        }
    }
}
