use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::info;

use crate::schema::{Event, RelationType};

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%d %b %Y"];

/// Sort key for an event's `when` text. Parsed timestamps order before
/// free text; free text orders lexically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum TemporalKey {
    Timestamp(NaiveDateTime),
    Text(String),
}

impl TemporalKey {
    pub fn parse(when: &str) -> Self {
        let when = when.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(when) {
            return TemporalKey::Timestamp(dt.naive_utc());
        }
        for format in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(when, format) {
                return TemporalKey::Timestamp(dt);
            }
        }
        for format in DATE_FORMATS {
            if let Some(dt) = start_of_day(when, format) {
                return TemporalKey::Timestamp(dt);
            }
        }
        // Month and year only, e.g. "March 2024".
        if let Some(dt) = start_of_day(&format!("1 {}", when), "%d %B %Y") {
            return TemporalKey::Timestamp(dt);
        }

        TemporalKey::Text(when.to_string())
    }
}

fn start_of_day(text: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDate::parse_from_str(text, format).ok()?.and_hms_opt(0, 0, 0)
}

/// Computes temporal and participant-overlap edges between events.
pub struct RelationLinker;

impl RelationLinker {
    pub fn new() -> Self {
        Self
    }

    /// Append relation edges in place. Existing edges are never removed and
    /// an edge with the same target and type is never added twice.
    pub fn link(&self, events: &mut [Event]) {
        if events.len() < 2 {
            info!(events = events.len(), "Fewer than two events, skipping relation linking");
            return;
        }

        let temporal = self.link_temporal(events);
        let participant = self.link_participants(events);

        info!(temporal, participant, "Linked event relations");
    }

    /// Chain events with a `when` value in time order: BEFORE on the earlier,
    /// AFTER on the later, for each adjacent pair only.
    fn link_temporal(&self, events: &mut [Event]) -> usize {
        let mut timed: Vec<(TemporalKey, usize)> = events
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.elements.when.trim().is_empty())
            .map(|(i, e)| (TemporalKey::parse(&e.elements.when), i))
            .collect();
        // Stable, so equal keys keep document order.
        timed.sort_by(|a, b| a.0.cmp(&b.0));

        let mut added = 0;
        for pair in timed.windows(2) {
            let (earlier, later) = (pair[0].1, pair[1].1);
            let earlier_id = events[earlier].event_id.clone();
            let later_id = events[later].event_id.clone();

            if events[earlier].add_relation(&later_id, RelationType::Before) {
                added += 1;
            }
            if events[later].add_relation(&earlier_id, RelationType::After) {
                added += 1;
            }
        }
        added
    }

    fn link_participants(&self, events: &mut [Event]) -> usize {
        let who: Vec<HashSet<String>> = events
            .iter()
            .map(|e| e.elements.who.iter().map(|p| p.entity_id.clone()).collect())
            .collect();
        let whom: Vec<HashSet<String>> = events
            .iter()
            .map(|e| e.elements.whom.iter().map(|p| p.entity_id.clone()).collect())
            .collect();
        let ids: Vec<String> = events.iter().map(|e| e.event_id.clone()).collect();

        let mut added = 0;
        for i in 0..events.len() {
            for j in 0..events.len() {
                if i == j {
                    continue;
                }

                // At most one participant edge per ordered pair; shared agents first.
                let relation_type = if !who[i].is_disjoint(&who[j]) {
                    RelationType::SharedAgent
                } else if !whom[i].is_disjoint(&who[j]) {
                    RelationType::ObjectToSubject
                } else {
                    continue;
                };
                if events[i].add_participant_relation(&ids[j], relation_type) {
                    added += 1;
                }
            }
        }
        added
    }
}

impl Default for RelationLinker {
    fn default() -> Self {
        Self::new()
    }
}

/// Compare two `when` values with the linker's ordering.
pub fn compare_when(a: &str, b: &str) -> Ordering {
    TemporalKey::parse(a).cmp(&TemporalKey::parse(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EventRelation, Participant, Role};

    fn participants(ids: &[&str], role: Role) -> Vec<Participant> {
        ids.iter()
            .map(|id| Participant { entity_id: id.to_string(), role })
            .collect()
    }

    fn event(id: &str, when: &str, who: &[&str], whom: &[&str]) -> Event {
        let mut event: Event = serde_json::from_value(serde_json::json!({
            "event_id": id,
            "type": "CONTACT",
            "trigger": {"trigger_id": "T1", "text": "met"},
        }))
        .unwrap();
        event.elements.when = when.to_string();
        event.elements.who = participants(who, Role::Agent);
        event.elements.whom = participants(whom, Role::Patient);
        event
    }

    fn relations_of(event: &Event, relation_type: RelationType) -> Vec<&str> {
        event.relations
            .iter()
            .filter(|r| r.relation_type == relation_type)
            .map(|r| r.related_event_id.as_str())
            .collect()
    }

    #[test]
    fn test_single_event_is_noop() {
        let mut events = vec![event("EV1", "2024-01-01", &["E1"], &[])];
        RelationLinker::new().link(&mut events);
        assert!(events[0].relations.is_empty());
    }

    #[test]
    fn test_temporal_chain_follows_time_not_input_order() {
        let mut events = vec![
            event("EV1", "2024-03-05", &[], &[]),
            event("EV2", "", &[], &[]),
            event("EV3", "January 2, 2024", &[], &[]),
            event("EV4", "2024-02-10", &[], &[]),
        ];
        RelationLinker::new().link(&mut events);

        // Chain: EV3 -> EV4 -> EV1
        assert_eq!(relations_of(&events[2], RelationType::Before), vec!["EV4"]);
        assert_eq!(relations_of(&events[3], RelationType::After), vec!["EV3"]);
        assert_eq!(relations_of(&events[3], RelationType::Before), vec!["EV1"]);
        assert_eq!(relations_of(&events[0], RelationType::After), vec!["EV4"]);
        // Adjacent pairs only.
        assert!(!events[2].has_relation("EV1", RelationType::Before));
        assert!(events[1].relations.is_empty());
    }

    #[test]
    fn test_unparsed_times_sort_after_parsed_then_lexically() {
        assert_eq!(compare_when("2024-01-01", "yesterday"), Ordering::Less);
        assert_eq!(compare_when("last week", "yesterday"), Ordering::Less);
        assert_eq!(compare_when("March 2024", "2024-02-28"), Ordering::Greater);
        assert_eq!(
            TemporalKey::parse("2024-05-01T10:00:00Z"),
            TemporalKey::parse("2024-05-01 10:00:00")
        );
    }

    #[test]
    fn test_shared_agent_added_once_across_calls() {
        let mut events = vec![
            event("EV1", "", &["E1"], &[]),
            event("EV2", "", &["E1", "E2"], &[]),
        ];
        let linker = RelationLinker::new();
        linker.link(&mut events);
        linker.link(&mut events);

        assert_eq!(
            events[0].relations,
            vec![EventRelation { related_event_id: "EV2".into(), relation_type: RelationType::SharedAgent }]
        );
        assert_eq!(relations_of(&events[1], RelationType::SharedAgent), vec!["EV1"]);
    }

    #[test]
    fn test_object_to_subject_is_one_directional() {
        let mut events = vec![
            event("EV1", "", &["E1"], &["E2"]),
            event("EV2", "", &["E2"], &[]),
        ];
        RelationLinker::new().link(&mut events);

        assert_eq!(relations_of(&events[0], RelationType::ObjectToSubject), vec!["EV2"]);
        assert!(relations_of(&events[1], RelationType::ObjectToSubject).is_empty());
        assert!(relations_of(&events[0], RelationType::SharedAgent).is_empty());
    }

    #[test]
    fn test_one_participant_edge_per_pair() {
        // EV1's patient is also EV2's agent, and they share agent E1.
        let mut events = vec![
            event("EV1", "", &["E1"], &["E2"]),
            event("EV2", "", &["E1", "E2"], &[]),
        ];
        let linker = RelationLinker::new();
        linker.link(&mut events);
        linker.link(&mut events);

        assert_eq!(
            events[0].relations,
            vec![EventRelation { related_event_id: "EV2".into(), relation_type: RelationType::SharedAgent }]
        );
    }

    #[test]
    fn test_temporal_edges_not_duplicated_on_relink() {
        let mut events = vec![
            event("EV1", "2024-01-01", &[], &[]),
            event("EV2", "2024-01-02", &[], &[]),
        ];
        let linker = RelationLinker::new();
        linker.link(&mut events);
        linker.link(&mut events);
        assert_eq!(events[0].relations.len(), 1);
        assert_eq!(events[1].relations.len(), 1);
    }
}
