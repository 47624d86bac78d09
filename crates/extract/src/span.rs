use crate::parse::{ParsedDocument, Token};

/// Dependency labels that attach a modifier inside a noun phrase.
pub const MODIFIER_DEPS: &[&str] = &["compound", "amod", "det", "nummod"];

/// Inclusive token range `first..=last` of a noun phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSpan {
    pub first: usize,
    pub last: usize,
}

impl TokenSpan {
    pub fn single(i: usize) -> Self {
        Self { first: i, last: i }
    }

    pub fn text(&self, doc: &ParsedDocument) -> String {
        doc.span_text(self.first, self.last)
    }

    pub fn position(&self, doc: &ParsedDocument) -> Option<(usize, usize)> {
        doc.span_position(self.first, self.last)
    }
}

/// Expands a token to the noun phrase it belongs to.
pub struct SpanResolver<'a> {
    doc: &'a ParsedDocument,
}

impl<'a> SpanResolver<'a> {
    pub fn new(doc: &'a ParsedDocument) -> Self {
        Self { doc }
    }

    pub fn resolve(&self, token: &Token) -> TokenSpan {
        // A modifier is resolved through its phrase head.
        if token.has_dep(MODIFIER_DEPS) {
            let span = self.collect(self.phrase_head(token));
            if span.first != span.last {
                return span;
            }
        }

        self.collect(token.i)
    }

    /// Walk up through heads that are themselves modifiers.
    fn phrase_head(&self, token: &Token) -> usize {
        let mut head = token.head;
        let mut steps = 0;
        while let Some(t) = self.doc.token(head) {
            if !t.has_dep(MODIFIER_DEPS) || t.head == t.i || steps >= self.doc.tokens.len() {
                break;
            }
            head = t.head;
            steps += 1;
        }
        head
    }

    /// The head plus its direct modifier children, first to last by position.
    fn collect(&self, head: usize) -> TokenSpan {
        let mut indices: Vec<usize> = std::iter::once(head)
            .chain(
                self.doc
                    .children(head)
                    .filter(|child| child.has_dep(MODIFIER_DEPS))
                    .map(|child| child.i),
            )
            .collect();
        indices.sort_unstable();

        match (indices.first(), indices.last()) {
            (Some(&first), Some(&last)) => TokenSpan { first, last },
            _ => TokenSpan::single(head),
        }
    }
}
