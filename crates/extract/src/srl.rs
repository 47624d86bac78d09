use tracing::{debug, info};

use crate::ids::IdSequence;
use crate::matcher::{ArgumentQuery, EntityMatcher, MatchStrategy, DEFAULT_CHAIN};
use crate::parse::{ParsedDocument, Token};
use crate::schema::{
    Entity, EntityType, Event, EventElements, Participant, Place, Role, Trigger, TriggerRef,
};
use crate::span::SpanResolver;

pub const SUBJECT_DEPS: &[&str] = &["nsubj", "nsubjpass"];
pub const OBJECT_DEPS: &[&str] = &["dobj", "pobj", "attr"];
pub const TEMPORAL_DEPS: &[&str] = &["npadvmod", "advmod", "tmod"];
pub const PREP_DEPS: &[&str] = &["prep"];
pub const PREP_OBJECT_DEPS: &[&str] = &["pobj"];

/// Builds basic event skeletons (who/whom/when/where) from the dependency
/// structure around each trigger.
pub struct ArgumentExtractor {
    chain: Vec<MatchStrategy>,
}

impl ArgumentExtractor {
    pub fn new() -> Self {
        Self {
            chain: DEFAULT_CHAIN.to_vec(),
        }
    }

    pub fn with_chain(chain: Vec<MatchStrategy>) -> Self {
        Self { chain }
    }

    /// One event per trigger that sits inside a sentence and a token.
    /// Triggers outside any sentence or token are skipped.
    pub fn extract(&self, doc: &ParsedDocument, triggers: &[Trigger], entities: &[Entity]) -> Vec<Event> {
        info!(triggers = triggers.len(), entities = entities.len(), "Extracting event arguments");

        let matcher = EntityMatcher::with_chain(entities, &self.chain);
        let resolver = SpanResolver::new(doc);
        let mut ids = IdSequence::new("EV");
        let mut events = Vec::new();

        for trigger in triggers {
            let (start, end) = trigger.position;

            let Some(sentence) = doc.sentence_containing(start, end) else {
                debug!(trigger = %trigger.text, start, end, "No sentence contains trigger");
                continue;
            };
            let tokens = doc.sentence_tokens(sentence);

            let Some(trigger_token) = tokens.iter().find(|t| t.idx <= start && t.end() >= end) else {
                debug!(trigger = %trigger.text, start, end, "No token covers trigger");
                continue;
            };

            let args = ArgumentScan {
                doc,
                resolver: &resolver,
                matcher: &matcher,
                trigger: trigger_token,
            };
            let elements = args.collect(tokens);

            events.push(Event {
                event_id: ids.next_id(),
                event_type: trigger.candidate_type.clone(),
                trigger: TriggerRef {
                    trigger_id: trigger.trigger_id.clone(),
                    text: trigger.text.clone(),
                },
                elements,
                relations: Vec::new(),
                source_text: doc.sentence_text(sentence),
                summary: None,
                sentiment: None,
                importance: None,
                confidence: None,
            });
        }

        info!(events = events.len(), "Extracted basic events");
        events
    }
}

impl Default for ArgumentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

struct ArgumentScan<'a> {
    doc: &'a ParsedDocument,
    resolver: &'a SpanResolver<'a>,
    matcher: &'a EntityMatcher<'a>,
    trigger: &'a Token,
}

impl<'a> ArgumentScan<'a> {
    fn collect(&self, tokens: &[Token]) -> EventElements {
        let mut elements = EventElements::default();

        for token in tokens {
            if token.i == self.trigger.i {
                continue;
            }

            if self.is_dependent(token) {
                if token.has_dep(SUBJECT_DEPS) {
                    if let Some(entity) = self.resolve(token) {
                        push_participant(&mut elements.who, entity, Role::Agent);
                    }
                } else if token.has_dep(OBJECT_DEPS) {
                    if let Some(entity) = self.resolve(token) {
                        push_participant(&mut elements.whom, entity, Role::Patient);
                    }
                } else if token.has_dep(TEMPORAL_DEPS) {
                    if let Some(entity) = self.resolve(token) {
                        self.add_adjunct(&mut elements, entity);
                    }
                }
            } else if token.has_dep(PREP_OBJECT_DEPS) && self.is_prepositional_adjunct(token) {
                if let Some(entity) = self.resolve(token) {
                    self.add_adjunct(&mut elements, entity);
                }
            }
        }

        elements
    }

    fn is_dependent(&self, token: &Token) -> bool {
        token.head == self.trigger.i && token.i != token.head
    }

    /// `pobj` under a `prep` that attaches to the trigger.
    fn is_prepositional_adjunct(&self, token: &Token) -> bool {
        self.doc
            .head_of(token)
            .is_some_and(|prep| prep.has_dep(PREP_DEPS) && prep.head == self.trigger.i && prep.i != prep.head)
    }

    fn resolve(&self, token: &Token) -> Option<&'a Entity> {
        let span = self.resolver.resolve(token);
        let query = ArgumentQuery {
            text: span.text(self.doc),
            position: span.position(self.doc),
        };
        self.matcher.resolve(&query)
    }

    fn add_adjunct(&self, elements: &mut EventElements, entity: &Entity) {
        match entity.entity_type {
            EntityType::Date | EntityType::Time => {
                if elements.when.is_empty() {
                    elements.when = entity.text.clone();
                }
            }
            EntityType::Location => {
                if !elements.where_.iter().any(|p| p.entity_id == entity.entity_id) {
                    elements.where_.push(Place {
                        entity_id: entity.entity_id.clone(),
                    });
                }
            }
            _ => {}
        }
    }
}

fn push_participant(list: &mut Vec<Participant>, entity: &Entity, role: Role) {
    if !list.iter().any(|p| p.entity_id == entity.entity_id) {
        list.push(Participant {
            entity_id: entity.entity_id.clone(),
            role,
        });
    }
}
