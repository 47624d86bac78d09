use serde::Serialize;

use crate::schema::{Entity, Event, ExtractionResult, Trigger};

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "[]".to_string())
}

/// Ask the model to supplement rule-based entities and trigger words.
pub fn build_entity_prompt(text: &str, rule_based: &ExtractionResult) -> String {
    format!(
        r#"Extract named entities and event trigger words from the following text.
A rule-based extractor already found the entities and triggers listed below.
Return the complete lists, adding anything it missed.

INSTRUCTIONS:
1. Entity types must be one of: PERSON, ORGANIZATION, LOCATION, DATE, TIME, OTHER
2. A trigger is the word that signals an event happened (a verb or an event noun)
3. "position" is [start, end] as byte offsets into the text
4. Output ONLY valid JSON, nothing else

SCHEMA:
{{
  "entities": [
    {{"entity_id": "E1", "text": "Alice", "type": "PERSON", "mentions": [{{"text": "Alice", "position": [0, 5]}}]}}
  ],
  "event_triggers": [
    {{"trigger_id": "T1", "text": "met", "position": [6, 9], "potential_type": "CONTACT"}}
  ]
}}

RULE-BASED ENTITIES:
{}

RULE-BASED TRIGGERS:
{}

TEXT:
{}

JSON OUTPUT:"#,
        to_json(&rule_based.entities),
        to_json(&rule_based.event_triggers),
        text
    )
}

/// Ask the model to complete event structures built from the parse.
pub fn build_event_prompt(text: &str, entities: &[Entity], triggers: &[Trigger], events: &[Event]) -> String {
    format!(
        r#"Build event structures for the following text.
Basic events were derived from the sentence structure; complete them and add missing events.

INSTRUCTIONS:
1. Use one event per trigger word; keep the trigger text exactly as written
2. Refer to participants only by the entity_id values listed below
3. Fill "why" and "how" when the text states them, otherwise leave them empty
4. sentiment.polarity is POSITIVE, NEGATIVE or NEUTRAL; intensity is 0.0-1.0
5. importance is an integer 1-5; confidence is 0.0-1.0
6. Output ONLY valid JSON, nothing else

SCHEMA:
{{
  "events": [
    {{
      "type": "CONTACT",
      "trigger": {{"trigger_id": "T1", "text": "met"}},
      "summary": "one sentence summary",
      "elements": {{
        "who": [{{"entity_id": "E1", "role": "AGENT"}}],
        "whom": [{{"entity_id": "E2", "role": "PATIENT"}}],
        "when": "",
        "where": [{{"entity_id": "E3"}}],
        "why": "",
        "how": ""
      }},
      "sentiment": {{"polarity": "NEUTRAL", "intensity": 0.5}},
      "importance": 3,
      "confidence": 0.8
    }}
  ]
}}

ENTITIES:
{}

TRIGGERS:
{}

BASIC EVENTS:
{}

TEXT:
{}

JSON OUTPUT:"#,
        to_json(entities),
        to_json(triggers),
        to_json(events),
        text
    )
}

pub fn build_retry_prompt(invalid_json: &str) -> String {
    format!(
        r#"The following JSON is invalid:

{}

Fix this JSON. Output only valid JSON with no markdown formatting, no code blocks, no explanations. Just the raw JSON object."#,
        invalid_json
    )
}
