/// Monotonic id sequence for one namespace (`E`, `T`, `EV`) within a document.
///
/// Ids look like `<prefix><n>`. Observing an existing id moves the sequence past
/// it, so issued ids never collide with anything already seen.
#[derive(Debug, Clone)]
pub struct IdSequence {
    prefix: &'static str,
    next: u64,
}

impl IdSequence {
    pub fn new(prefix: &'static str) -> Self {
        Self { prefix, next: 1 }
    }

    /// Record an id that already exists in the collection.
    pub fn observe(&mut self, id: &str) {
        if let Some(n) = self.numeric_suffix(id) {
            self.next = self.next.max(n.saturating_add(1));
        }
    }

    pub fn observe_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        for id in ids {
            self.observe(id);
        }
    }

    pub fn next_id(&mut self) -> String {
        let id = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        id
    }

    fn numeric_suffix(&self, id: &str) -> Option<u64> {
        id.strip_prefix(self.prefix)?.parse().ok()
    }
}

/// Per-document allocator for entity, trigger and event ids.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    pub entities: IdSequence,
    pub triggers: IdSequence,
    pub events: IdSequence,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            entities: IdSequence::new("E"),
            triggers: IdSequence::new("T"),
            events: IdSequence::new("EV"),
        }
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids() {
        let mut seq = IdSequence::new("EV");
        assert_eq!(seq.next_id(), "EV1");
        assert_eq!(seq.next_id(), "EV2");
    }

    #[test]
    fn test_observe_skips_past_existing() {
        let mut seq = IdSequence::new("E");
        seq.observe_all(["E7", "E2", "E3"]);
        assert_eq!(seq.next_id(), "E8");
    }

    #[test]
    fn test_observe_ignores_foreign_ids() {
        // "EV4" must not be read as entity 4 with a stray "V".
        let mut seq = IdSequence::new("E");
        seq.observe_all(["EV4", "person-1", ""]);
        assert_eq!(seq.next_id(), "E1");
    }
}
