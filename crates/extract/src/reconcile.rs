use std::collections::HashSet;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::AugmentError;
use crate::ids::{IdAllocator, IdSequence};
use crate::schema::{
    Entity, Event, EventElements, ExtractionResult, Participant, Place, Sentiment, Trigger, TriggerRef,
};

pub const DEFAULT_IMPORTANCE: u8 = 3;
pub const DEFAULT_CONFIDENCE: f64 = 0.8;

/// Entity/trigger payload from the augmentation collaborator. At least one
/// of the two keys must be present.
#[derive(Debug, Deserialize)]
struct ExtractionPayload {
    entities: Option<Vec<Entity>>,
    event_triggers: Option<Vec<Trigger>>,
}

#[derive(Debug, Deserialize)]
struct EventPayload {
    events: Vec<ModelEvent>,
}

/// An event as the model reports it. Only the trigger is required.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelEvent {
    #[serde(default, rename = "type")]
    pub event_type: Option<String>,
    pub trigger: TriggerRef,
    #[serde(default)]
    pub elements: EventElements,
    #[serde(default)]
    pub source_text: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub sentiment: Option<Sentiment>,
    #[serde(default)]
    pub importance: Option<u8>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Changes a model event makes to an existing event with the same trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct EventPatch {
    pub event_type: Option<String>,
    pub summary: String,
    pub sentiment: Sentiment,
    pub importance: u8,
    pub confidence: f64,
    pub why: String,
    pub how: String,
    pub when: String,
    pub who: Vec<Participant>,
    pub whom: Vec<Participant>,
    pub where_: Vec<Place>,
}

impl EventPatch {
    /// Participants are limited to entities in `known`.
    pub fn from_model(model: &ModelEvent, known: &HashSet<&str>) -> Self {
        let elements = retain_known(&model.elements, known);
        Self {
            event_type: model
                .event_type
                .as_ref()
                .filter(|t| !t.trim().is_empty())
                .cloned(),
            summary: model.summary.clone().unwrap_or_default(),
            sentiment: model.sentiment.clone().unwrap_or_default(),
            importance: model.importance.unwrap_or(DEFAULT_IMPORTANCE),
            confidence: model.confidence.unwrap_or(DEFAULT_CONFIDENCE),
            why: elements.why,
            how: elements.how,
            when: elements.when,
            who: elements.who,
            whom: elements.whom,
            where_: elements.where_,
        }
    }
}

impl Event {
    /// Return a copy of this event with `patch` applied. Populated
    /// participant lists, `when`, `why` and `how` are never blanked.
    pub fn apply_patch(&self, patch: &EventPatch) -> Event {
        let mut event = self.clone();

        if let Some(event_type) = &patch.event_type {
            event.event_type = event_type.clone();
        }
        event.summary = Some(patch.summary.clone());
        event.sentiment = Some(patch.sentiment.clone());
        event.importance = Some(patch.importance);
        event.confidence = Some(patch.confidence);

        let elements = &mut event.elements;
        if !patch.why.trim().is_empty() {
            elements.why = patch.why.clone();
        }
        if !patch.how.trim().is_empty() {
            elements.how = patch.how.clone();
        }
        if elements.when.trim().is_empty() && !patch.when.trim().is_empty() {
            elements.when = patch.when.clone();
        }
        union_participants(&mut elements.who, &patch.who);
        union_participants(&mut elements.whom, &patch.whom);
        for place in &patch.where_ {
            if !elements.where_.iter().any(|p| p.entity_id == place.entity_id) {
                elements.where_.push(place.clone());
            }
        }

        event
    }
}

fn union_participants(existing: &mut Vec<Participant>, incoming: &[Participant]) {
    for participant in incoming {
        if !existing.iter().any(|p| p.entity_id == participant.entity_id) {
            existing.push(participant.clone());
        }
    }
}

/// Copy of `elements` with references to unknown entities dropped and
/// duplicate references collapsed.
fn retain_known(elements: &EventElements, known: &HashSet<&str>) -> EventElements {
    let mut out = EventElements {
        when: elements.when.clone(),
        why: elements.why.clone(),
        how: elements.how.clone(),
        ..Default::default()
    };
    let keep = |id: &str| known.contains(id);

    for p in elements.who.iter().filter(|p| keep(&p.entity_id)) {
        union_participants(&mut out.who, std::slice::from_ref(p));
    }
    for p in elements.whom.iter().filter(|p| keep(&p.entity_id)) {
        union_participants(&mut out.whom, std::slice::from_ref(p));
    }
    for p in elements.where_.iter().filter(|p| keep(&p.entity_id)) {
        if !out.where_.iter().any(|w| w.entity_id == p.entity_id) {
            out.where_.push(p.clone());
        }
    }
    out
}

fn trigger_key(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Result of a reconciliation stage plus the problem that forced a
/// fallback, if any.
#[derive(Debug, Clone)]
pub struct Reconciled<T> {
    pub value: T,
    pub issue: Option<AugmentError>,
}

impl<T> Reconciled<T> {
    pub fn fell_back(&self) -> bool {
        self.issue.is_some()
    }
}

/// Merges rule-based and model-produced records for one document.
///
/// Owns the document's id allocator, so ids issued across the entity, trigger
/// and event stages never collide.
pub struct Reconciler {
    ids: IdAllocator,
}

impl Reconciler {
    pub fn new() -> Self {
        Self {
            ids: IdAllocator::new(),
        }
    }

    /// Give every caller-supplied entity and trigger a usable id. Records
    /// with an empty id, or one already taken earlier in the list, get a
    /// fresh id; everything else keeps the id it came with.
    pub fn assign_base_ids(&mut self, base: &mut ExtractionResult) {
        let entities = reissue_ids(&mut base.entities, &mut self.ids.entities, |e| &mut e.entity_id);
        let triggers = reissue_ids(&mut base.event_triggers, &mut self.ids.triggers, |t| &mut t.trigger_id);
        if entities + triggers > 0 {
            warn!(entities, triggers, "Reissued empty or duplicate input ids");
        }
    }

    /// Merge a raw entity/trigger response into `base`. Any failure returns
    /// `base` unchanged.
    pub fn reconcile_extraction(
        &mut self,
        base: &ExtractionResult,
        response: Result<String, AugmentError>,
    ) -> Reconciled<ExtractionResult> {
        let parsed = response.and_then(|raw| parse_extraction(&raw));

        match parsed {
            Ok(model) => {
                let entities = merge_entities(&base.entities, &model.entities, &mut self.ids.entities);
                let event_triggers =
                    merge_triggers(&base.event_triggers, &model.event_triggers, &mut self.ids.triggers);
                info!(
                    entities = entities.len(),
                    new_entities = entities.len() - base.entities.len(),
                    triggers = event_triggers.len(),
                    new_triggers = event_triggers.len() - base.event_triggers.len(),
                    "Merged entity and trigger augmentation"
                );
                Reconciled {
                    value: ExtractionResult { entities, event_triggers },
                    issue: None,
                }
            }
            Err(err) => {
                warn!(error = %err, "Entity/trigger augmentation unusable, keeping rule-based result");
                Reconciled {
                    value: base.clone(),
                    issue: Some(err),
                }
            }
        }
    }

    /// Merge a raw event response into `base`. Any failure returns `base`
    /// unchanged.
    pub fn reconcile_events(
        &mut self,
        base: &[Event],
        response: Result<String, AugmentError>,
        entities: &[Entity],
    ) -> Reconciled<Vec<Event>> {
        match response.and_then(|raw| parse_events(&raw)) {
            Ok(model) => {
                let events = merge_events(base, &model, entities, &mut self.ids.events);
                info!(
                    events = events.len(),
                    new_events = events.len() - base.len(),
                    "Merged event augmentation"
                );
                Reconciled { value: events, issue: None }
            }
            Err(err) => {
                warn!(error = %err, "Event augmentation unusable, keeping basic events");
                Reconciled {
                    value: base.to_vec(),
                    issue: Some(err),
                }
            }
        }
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

/// Replace empty and repeated ids in `records` with fresh ones from `seq`.
/// Returns how many ids were replaced.
fn reissue_ids<T>(records: &mut [T], seq: &mut IdSequence, id_of: fn(&mut T) -> &mut String) -> usize {
    for record in records.iter_mut() {
        seq.observe(id_of(record));
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut reissued = 0;
    for record in records.iter_mut() {
        let id = id_of(record);
        if id.trim().is_empty() || seen.contains(id.as_str()) {
            *id = seq.next_id();
            reissued += 1;
        }
        seen.insert(id.clone());
    }
    reissued
}

/// Append model entities whose text (case-insensitive) is not yet present,
/// each under a fresh id. Existing entities are untouched.
pub fn merge_entities(base: &[Entity], model: &[Entity], ids: &mut IdSequence) -> Vec<Entity> {
    ids.observe_all(base.iter().map(|e| e.entity_id.as_str()));

    let mut merged = base.to_vec();
    let mut seen: HashSet<String> = base.iter().map(|e| e.text.trim().to_lowercase()).collect();

    for entity in model {
        let key = entity.text.trim().to_lowercase();
        if key.is_empty() || seen.contains(&key) {
            continue;
        }
        let mut entity = entity.clone();
        entity.entity_id = ids.next_id();
        debug!(entity_id = %entity.entity_id, text = %entity.text, "Adding model entity");
        seen.insert(key);
        merged.push(entity);
    }
    merged
}

/// Append model triggers whose (text, start, end) key is not yet present,
/// each under a fresh id.
pub fn merge_triggers(base: &[Trigger], model: &[Trigger], ids: &mut IdSequence) -> Vec<Trigger> {
    ids.observe_all(base.iter().map(|t| t.trigger_id.as_str()));

    let mut merged = base.to_vec();
    let mut seen: HashSet<(String, usize, usize)> = base.iter().map(Trigger::dedup_key).collect();

    for trigger in model {
        let key = trigger.dedup_key();
        if key.0.trim().is_empty() || seen.contains(&key) {
            continue;
        }
        let mut trigger = trigger.clone();
        trigger.trigger_id = ids.next_id();
        seen.insert(key);
        merged.push(trigger);
    }
    merged
}

/// Fold model events into `base`, matching on trigger text (case-insensitive).
///
/// A match is patched in place of the original record and keeps its id; an
/// unmatched model event is appended under a fresh id. Matching also sees
/// events appended earlier in the same merge. References to entities outside
/// `entities` are dropped from every event.
pub fn merge_events(base: &[Event], model: &[ModelEvent], entities: &[Entity], ids: &mut IdSequence) -> Vec<Event> {
    ids.observe_all(base.iter().map(|e| e.event_id.as_str()));

    let known: HashSet<&str> = entities.iter().map(|e| e.entity_id.as_str()).collect();
    let mut merged: Vec<Event> = base.to_vec();

    for model_event in model {
        let key = trigger_key(&model_event.trigger.text);
        if key.is_empty() {
            debug!("Skipping model event without trigger text");
            continue;
        }

        match merged.iter().position(|e| trigger_key(&e.trigger.text) == key) {
            Some(pos) => {
                let patch = EventPatch::from_model(model_event, &known);
                merged[pos] = merged[pos].apply_patch(&patch);
            }
            None => {
                let event = new_event(model_event, &known, ids.next_id());
                debug!(event_id = %event.event_id, trigger = %event.trigger.text, "Adding model event");
                merged.push(event);
            }
        }
    }

    for event in &mut merged {
        event.elements = retain_known(&event.elements, &known);
    }
    merged
}

fn new_event(model: &ModelEvent, known: &HashSet<&str>, event_id: String) -> Event {
    Event {
        event_id,
        event_type: model
            .event_type
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "OTHER".to_string()),
        trigger: model.trigger.clone(),
        elements: retain_known(&model.elements, known),
        relations: Vec::new(),
        source_text: model.source_text.clone(),
        summary: model.summary.clone(),
        sentiment: Some(model.sentiment.clone().unwrap_or_default()),
        importance: Some(model.importance.unwrap_or(DEFAULT_IMPORTANCE)),
        confidence: Some(model.confidence.unwrap_or(DEFAULT_CONFIDENCE)),
    }
}

/// Remove a surrounding markdown code fence, which models often add.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn parse_payload<T: DeserializeOwned>(raw: &str) -> Result<T, AugmentError> {
    let value: Value =
        serde_json::from_str(strip_code_fence(raw)).map_err(|e| AugmentError::InvalidJson(e.to_string()))?;
    if !value.is_object() {
        return Err(AugmentError::schema("top-level value is not an object"));
    }
    serde_json::from_value(value).map_err(|e| AugmentError::schema(e.to_string()))
}

/// Parse an entity/trigger response. Missing lists are treated as empty as
/// long as one of `entities` / `event_triggers` is present.
pub fn parse_extraction(raw: &str) -> Result<ExtractionResult, AugmentError> {
    let payload: ExtractionPayload = parse_payload(raw)?;
    if payload.entities.is_none() && payload.event_triggers.is_none() {
        return Err(AugmentError::schema("missing both `entities` and `event_triggers`"));
    }
    Ok(ExtractionResult {
        entities: payload.entities.unwrap_or_default(),
        event_triggers: payload.event_triggers.unwrap_or_default(),
    })
}

pub fn parse_events(raw: &str) -> Result<Vec<ModelEvent>, AugmentError> {
    let payload: EventPayload = parse_payload(raw)?;
    Ok(payload.events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EntityType, Polarity, Role};
    use serde_json::json;

    fn base_entities() -> Vec<Entity> {
        vec![
            Entity::new("E1", "Alice", EntityType::Person).with_mention("Alice", (0, 5)),
            Entity::new("E2", "Bob", EntityType::Person).with_mention("Bob", (10, 13)),
        ]
    }

    fn base_triggers() -> Vec<Trigger> {
        vec![Trigger::new("T1", "met", (6, 9), "CONTACT")]
    }

    fn base_event() -> Event {
        serde_json::from_value(json!({
            "event_id": "EV1",
            "type": "CONTACT",
            "trigger": {"trigger_id": "T1", "text": "met"},
            "elements": {
                "who": [{"entity_id": "E1", "role": "AGENT"}],
                "whom": [{"entity_id": "E2", "role": "PATIENT"}],
                "when": "",
                "where": [],
                "why": "",
                "how": ""
            },
            "source_text": "Alice met Bob."
        }))
        .unwrap()
    }

    fn base_extraction() -> ExtractionResult {
        ExtractionResult {
            entities: base_entities(),
            event_triggers: base_triggers(),
        }
    }

    #[test]
    fn test_entity_merge_appends_new_with_fresh_ids() {
        let mut ids = IdSequence::new("E");
        let model = vec![
            Entity::new("E1", "ALICE", EntityType::Person),
            Entity::new("E1", "Paris", EntityType::Location),
            Entity::new("E9", "paris", EntityType::Location),
        ];

        let merged = merge_entities(&base_entities(), &model, &mut ids);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[2].entity_id, "E3");
        assert_eq!(merged[2].text, "Paris");
        let ids: HashSet<&str> = merged.iter().map(|e| e.entity_id.as_str()).collect();
        assert_eq!(ids.len(), merged.len());
    }

    #[test]
    fn test_entity_ids_avoid_gaps_in_base() {
        let base = vec![
            Entity::new("E5", "Alice", EntityType::Person),
            Entity::new("E2", "Bob", EntityType::Person),
        ];
        let mut ids = IdSequence::new("E");
        let merged = merge_entities(&base, &[Entity::new("", "Carol", EntityType::Person)], &mut ids);
        assert_eq!(merged[2].entity_id, "E6");
    }

    #[test]
    fn test_trigger_merge_uses_text_and_span() {
        let mut ids = IdSequence::new("T");
        let model = vec![
            Trigger::new("T1", "MET", (6, 9), "CONTACT"),
            Trigger::new("T1", "met", (40, 43), "CONTACT"),
        ];
        let merged = merge_triggers(&base_triggers(), &model, &mut ids);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].trigger_id, "T2");
        assert_eq!(merged[1].position, (40, 43));
    }

    #[test]
    fn test_empty_model_is_identity() {
        let mut reconciler = Reconciler::new();
        let base = base_extraction();
        let out = reconciler.reconcile_extraction(&base, Ok(r#"{"entities": [], "event_triggers": []}"#.into()));
        assert!(!out.fell_back());
        assert_eq!(out.value, base);

        let events = vec![base_event()];
        let out = reconciler.reconcile_events(&events, Ok(r#"{"events": []}"#.into()), &base_entities());
        assert_eq!(out.value, events);
    }

    #[test]
    fn test_self_merge_adds_nothing() {
        let mut reconciler = Reconciler::new();
        let base = base_extraction();
        let raw = serde_json::to_string(&base).unwrap();
        let out = reconciler.reconcile_extraction(&base, Ok(raw));
        assert_eq!(out.value.entities.len(), base.entities.len());
        assert_eq!(out.value.event_triggers.len(), base.event_triggers.len());

        let events = vec![base_event()];
        let raw = serde_json::to_string(&json!({ "events": events })).unwrap();
        let out = reconciler.reconcile_events(&events, Ok(raw), &base_entities());
        assert_eq!(out.value.len(), 1);
        assert_eq!(out.value[0].event_id, "EV1");
        assert_eq!(out.value[0].elements, events[0].elements);
    }

    #[test]
    fn test_matching_event_is_patched_not_duplicated() {
        let mut reconciler = Reconciler::new();
        let raw = json!({
            "events": [{
                "trigger": {"text": "Met"},
                "elements": {"why": "a planned reunion", "how": ""}
            }]
        })
        .to_string();

        let out = reconciler.reconcile_events(&[base_event()], Ok(raw), &base_entities());

        assert_eq!(out.value.len(), 1);
        let event = &out.value[0];
        assert_eq!(event.event_id, "EV1");
        assert_eq!(event.elements.why, "a planned reunion");
        assert!(event.elements.how.is_empty());
        assert_eq!(event.event_type, "CONTACT");
        assert_eq!(event.sentiment, Some(Sentiment { polarity: Polarity::Neutral, intensity: 0.5 }));
        assert_eq!(event.importance, Some(DEFAULT_IMPORTANCE));
        assert_eq!(event.confidence, Some(DEFAULT_CONFIDENCE));
        assert_eq!(event.elements.who.len(), 1);
    }

    #[test]
    fn test_patch_never_blanks_populated_fields() {
        let mut original = base_event();
        original.elements.why = "business".into();
        original.elements.when = "2024-01-01".into();

        let model: ModelEvent = serde_json::from_value(json!({
            "type": "MEETING",
            "trigger": {"text": "met"},
            "summary": "Alice met Bob",
            "importance": 5,
            "elements": {
                "who": [{"entity_id": "E1", "role": "AGENT"}, {"entity_id": "E2", "role": "AGENT"}],
                "whom": [{"entity_id": "E404", "role": "PATIENT"}],
                "when": "2023-12-31",
                "why": ""
            }
        }))
        .unwrap();
        let known: HashSet<&str> = ["E1", "E2"].into_iter().collect();

        let patched = original.apply_patch(&EventPatch::from_model(&model, &known));

        assert_eq!(patched.event_type, "MEETING");
        assert_eq!(patched.summary.as_deref(), Some("Alice met Bob"));
        assert_eq!(patched.importance, Some(5));
        assert_eq!(patched.elements.why, "business");
        assert_eq!(patched.elements.when, "2024-01-01");
        assert_eq!(patched.elements.who.len(), 2);
        assert_eq!(patched.elements.who[1].role, Role::Agent);
        assert_eq!(patched.elements.whom.len(), 1);
        // Input record is not modified.
        assert!(original.summary.is_none());
    }

    #[test]
    fn test_unmatched_model_event_appended_without_dangling_refs() {
        let mut reconciler = Reconciler::new();
        let raw = json!({
            "events": [
                {
                    "event_id": "EV1",
                    "type": "MOVEMENT",
                    "trigger": {"trigger_id": "T7", "text": "left"},
                    "elements": {
                        "who": [{"entity_id": "E2", "role": "AGENT"}, {"entity_id": "E77", "role": "AGENT"}],
                        "where": [{"entity_id": "E78"}]
                    },
                    "relations": [{"related_event_id": "EV9", "relation_type": "BEFORE"}]
                },
                {"trigger": {"text": "LEFT"}, "elements": {"how": "by train"}}
            ]
        })
        .to_string();

        let out = reconciler.reconcile_events(&[base_event()], Ok(raw), &base_entities());

        assert_eq!(out.value.len(), 2);
        let added = &out.value[1];
        assert_eq!(added.event_id, "EV2");
        assert_eq!(added.event_type, "MOVEMENT");
        assert_eq!(added.elements.who.len(), 1);
        assert!(added.elements.where_.is_empty());
        assert!(added.relations.is_empty());
        assert_eq!(added.elements.how, "by train");
    }

    #[test]
    fn test_malformed_responses_fall_back() {
        let mut reconciler = Reconciler::new();
        let base = base_extraction();
        let events = vec![base_event()];

        for raw in ["not json at all", "[1, 2]", r#"{"foo": 1}"#, r#"{"entities": [{"type": "PERSON"}]}"#] {
            let out = reconciler.reconcile_extraction(&base, Ok(raw.to_string()));
            assert!(out.fell_back(), "expected fallback for {raw}");
            assert_eq!(out.value, base);
        }

        for raw in ["", r#"{"entities": []}"#, r#"{"events": [{"type": "X"}]}"#] {
            let out = reconciler.reconcile_events(&events, Ok(raw.to_string()), &base_entities());
            assert!(out.fell_back(), "expected fallback for {raw}");
            assert_eq!(out.value, events);
        }

        let out = reconciler.reconcile_events(&events, Err(AugmentError::Timeout(30)), &base_entities());
        assert_eq!(out.issue, Some(AugmentError::Timeout(30)));
        assert_eq!(out.value, events);
    }

    #[test]
    fn test_code_fenced_response_is_accepted() {
        let raw = "```json\n{\"entities\": [{\"text\": \"Paris\", \"type\": \"GPE\"}]}\n```";
        let parsed = parse_extraction(raw).unwrap();
        assert_eq!(parsed.entities[0].entity_type, EntityType::Other);
        assert!(parsed.event_triggers.is_empty());
    }

    #[test]
    fn test_missing_and_repeated_base_ids_are_reissued() {
        let mut reconciler = Reconciler::new();
        let mut base = ExtractionResult {
            entities: vec![
                Entity::new("", "Alice", EntityType::Person),
                Entity::new("E1", "Bob", EntityType::Person),
                Entity::new("E1", "Paris", EntityType::Location),
                Entity::new("E4", "Rome", EntityType::Location),
            ],
            event_triggers: vec![Trigger::new("", "met", (6, 9), "CONTACT"), Trigger::new("T2", "left", (20, 24), "MOVEMENT")],
        };

        reconciler.assign_base_ids(&mut base);

        let ids: Vec<&str> = base.entities.iter().map(|e| e.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["E5", "E1", "E6", "E4"]);
        let ids: Vec<&str> = base.event_triggers.iter().map(|t| t.trigger_id.as_str()).collect();
        assert_eq!(ids, vec!["T3", "T2"]);

        // Later merges keep allocating past the reissued ids.
        let raw = json!({"entities": [{"text": "Carol", "type": "PERSON"}]}).to_string();
        let out = reconciler.reconcile_extraction(&base, Ok(raw));
        assert_eq!(out.value.entities[4].entity_id, "E7");
    }

    #[test]
    fn test_unique_base_ids_are_left_alone() {
        let mut reconciler = Reconciler::new();
        let mut base = base_extraction();
        reconciler.assign_base_ids(&mut base);
        assert_eq!(base, base_extraction());
    }

    #[test]
    fn test_ids_do_not_collide_across_reconciler_stages() {
        let mut reconciler = Reconciler::new();
        let base = ExtractionResult::default();
        let raw = json!({
            "entities": [{"entity_id": "E1", "text": "Alice", "type": "PERSON"}, {"entity_id": "E1", "text": "Bob", "type": "PERSON"}],
        })
        .to_string();
        let out = reconciler.reconcile_extraction(&base, Ok(raw));
        let ids: Vec<&str> = out.value.entities.iter().map(|e| e.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["E1", "E2"]);
    }
}
