use crate::schema::{Entity, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Case-insensitive equality with the entity text or one of its mentions.
    ExactText,
    /// The argument span contains a mention span, or the other way round.
    SpanOverlap,
    /// One lowercased text contains the other.
    TextContainment,
}

/// Default resolution order: exact text, then span, then substring.
pub const DEFAULT_CHAIN: &[MatchStrategy] = &[
    MatchStrategy::ExactText,
    MatchStrategy::SpanOverlap,
    MatchStrategy::TextContainment,
];

/// A syntactic argument to resolve against the entity set.
#[derive(Debug, Clone)]
pub struct ArgumentQuery {
    pub text: String,
    pub position: Option<Position>,
}

/// Resolves argument text/spans to known entities with an ordered strategy chain.
pub struct EntityMatcher<'a> {
    entities: &'a [Entity],
    chain: &'a [MatchStrategy],
}

impl<'a> EntityMatcher<'a> {
    pub fn new(entities: &'a [Entity]) -> Self {
        Self::with_chain(entities, DEFAULT_CHAIN)
    }

    pub fn with_chain(entities: &'a [Entity], chain: &'a [MatchStrategy]) -> Self {
        Self { entities, chain }
    }

    pub fn resolve(&self, query: &ArgumentQuery) -> Option<&'a Entity> {
        let needle = query.text.trim().to_lowercase();
        self.chain
            .iter()
            .find_map(|strategy| self.apply(*strategy, &needle, query.position))
    }

    fn apply(&self, strategy: MatchStrategy, needle: &str, position: Option<Position>) -> Option<&'a Entity> {
        match strategy {
            MatchStrategy::ExactText => {
                if needle.is_empty() {
                    return None;
                }
                self.entities.iter().find(|e| {
                    e.text.to_lowercase() == needle
                        || e.mentions.iter().any(|m| m.text.to_lowercase() == needle)
                })
            }
            MatchStrategy::SpanOverlap => {
                let (start, end) = position?;
                self.entities.iter().find(|e| {
                    e.mentions.iter().any(|m| {
                        let (m_start, m_end) = m.position;
                        (m_start <= start && m_end >= end) || (start <= m_start && end >= m_end)
                    })
                })
            }
            MatchStrategy::TextContainment => {
                if needle.is_empty() {
                    return None;
                }
                self.entities.iter().find(|e| {
                    let text = e.text.to_lowercase();
                    !text.is_empty() && (text.contains(needle) || needle.contains(&text))
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EntityType;

    fn entities() -> Vec<Entity> {
        vec![
            Entity::new("E1", "Alice Smith", EntityType::Person).with_mention("Alice Smith", (0, 11)),
            Entity::new("E2", "Alice", EntityType::Person).with_mention("Alice", (40, 45)),
            Entity::new("E3", "Paris", EntityType::Location).with_mention("Paris", (60, 65)),
        ]
    }

    fn query(text: &str, position: Option<Position>) -> ArgumentQuery {
        ArgumentQuery {
            text: text.to_string(),
            position,
        }
    }

    #[test]
    fn test_exact_match_beats_containment() {
        let entities = entities();
        let matcher = EntityMatcher::new(&entities);
        // "alice" is contained in "Alice Smith" (E1), but equals E2 exactly.
        let found = matcher.resolve(&query("ALICE", None)).unwrap();
        assert_eq!(found.entity_id, "E2");
    }

    #[test]
    fn test_span_overlap_before_text_containment() {
        let entities = entities();
        let matcher = EntityMatcher::new(&entities);
        let found = matcher.resolve(&query("Ms. Alice", Some((40, 45)))).unwrap();
        assert_eq!(found.entity_id, "E2");
    }

    #[test]
    fn test_text_containment_fallback() {
        let entities = entities();
        let matcher = EntityMatcher::new(&entities);
        let found = matcher.resolve(&query("downtown Paris", None)).unwrap();
        assert_eq!(found.entity_id, "E3");
    }

    #[test]
    fn test_no_match_and_empty_query() {
        let entities = entities();
        let matcher = EntityMatcher::new(&entities);
        assert!(matcher.resolve(&query("Bob", Some((100, 103)))).is_none());
        assert!(matcher.resolve(&query("   ", None)).is_none());
    }

    #[test]
    fn test_custom_chain() {
        let entities = entities();
        let matcher = EntityMatcher::with_chain(&entities, &[MatchStrategy::ExactText]);
        assert!(matcher.resolve(&query("downtown Paris", None)).is_none());
    }
}
