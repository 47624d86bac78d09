use serde::{Deserialize, Serialize};

/// Byte span `[start, end)` into the document text.
pub type Position = (usize, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityType {
    Person,
    Organization,
    Location,
    Date,
    Time,
    #[serde(other)]
    Other,
}

impl EntityType {
    pub fn is_temporal(self) -> bool {
        matches!(self, EntityType::Date | EntityType::Time)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    pub text: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(default)]
    pub entity_id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    #[serde(default)]
    pub mentions: Vec<Mention>,
}

impl Entity {
    pub fn new(entity_id: impl Into<String>, text: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            entity_id: entity_id.into(),
            text: text.into(),
            entity_type,
            mentions: Vec::new(),
        }
    }

    pub fn with_mention(mut self, text: impl Into<String>, position: Position) -> Self {
        self.mentions.push(Mention {
            text: text.into(),
            position,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(default)]
    pub trigger_id: String,
    pub text: String,
    pub position: Position,
    #[serde(
        rename = "potential_type",
        alias = "candidate_type",
        alias = "type",
        default = "default_trigger_type"
    )]
    pub candidate_type: String,
}

fn default_trigger_type() -> String {
    "OTHER".to_string()
}

impl Trigger {
    pub fn new(
        trigger_id: impl Into<String>,
        text: impl Into<String>,
        position: Position,
        candidate_type: impl Into<String>,
    ) -> Self {
        Self {
            trigger_id: trigger_id.into(),
            text: text.into(),
            position,
            candidate_type: candidate_type.into(),
        }
    }

    /// Deduplication key: lowercased text plus span bounds.
    pub fn dedup_key(&self) -> (String, usize, usize) {
        (self.text.to_lowercase(), self.position.0, self.position.1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Agent,
    Patient,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub entity_id: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub entity_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventElements {
    #[serde(default)]
    pub who: Vec<Participant>,
    #[serde(default)]
    pub whom: Vec<Participant>,
    #[serde(default)]
    pub when: String,
    #[serde(default, rename = "where")]
    pub where_: Vec<Place>,
    #[serde(default)]
    pub why: String,
    #[serde(default)]
    pub how: String,
}

impl EventElements {
    /// Every entity id referenced by the participant lists.
    pub fn entity_ids(&self) -> impl Iterator<Item = &str> {
        self.who
            .iter()
            .chain(self.whom.iter())
            .map(|p| p.entity_id.as_str())
            .chain(self.where_.iter().map(|p| p.entity_id.as_str()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationType {
    Before,
    After,
    SharedAgent,
    ObjectToSubject,
}

impl RelationType {
    pub fn is_participant(self) -> bool {
        matches!(self, RelationType::SharedAgent | RelationType::ObjectToSubject)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRelation {
    pub related_event_id: String,
    pub relation_type: RelationType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerRef {
    #[serde(default)]
    pub trigger_id: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Polarity {
    Positive,
    Negative,
    #[default]
    #[serde(other)]
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    #[serde(default)]
    pub polarity: Polarity,
    #[serde(default = "default_intensity")]
    pub intensity: f64,
}

fn default_intensity() -> f64 {
    0.5
}

impl Default for Sentiment {
    fn default() -> Self {
        Self {
            polarity: Polarity::Neutral,
            intensity: default_intensity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub event_id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub trigger: TriggerRef,
    #[serde(default)]
    pub elements: EventElements,
    #[serde(default)]
    pub relations: Vec<EventRelation>,
    #[serde(default)]
    pub source_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Event {
    pub fn has_relation(&self, related_event_id: &str, relation_type: RelationType) -> bool {
        self.relations
            .iter()
            .any(|r| r.related_event_id == related_event_id && r.relation_type == relation_type)
    }

    /// Append a relation unless the same (target, type) edge is already present.
    /// Returns whether an edge was added.
    pub fn add_relation(&mut self, related_event_id: &str, relation_type: RelationType) -> bool {
        if self.has_relation(related_event_id, relation_type) {
            return false;
        }
        self.relations.push(EventRelation {
            related_event_id: related_event_id.to_string(),
            relation_type,
        });
        true
    }

    /// Append a participant-overlap edge unless this event already has one
    /// (of either participant type) pointing at `related_event_id`.
    pub fn add_participant_relation(&mut self, related_event_id: &str, relation_type: RelationType) -> bool {
        let exists = self
            .relations
            .iter()
            .any(|r| r.related_event_id == related_event_id && r.relation_type.is_participant());
        if exists {
            return false;
        }
        self.add_relation(related_event_id, relation_type)
    }
}

/// Rule-based or model-produced entities and triggers for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub entities: Vec<Entity>,
    pub event_triggers: Vec<Trigger>,
}

/// Final per-document output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventDocument {
    pub document_id: String,
    pub events: Vec<Event>,
    pub entities: Vec<Entity>,
}

impl EventDocument {
    pub fn empty(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            ..Default::default()
        }
    }
}
