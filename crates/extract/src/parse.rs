use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Index of the token in the document.
    pub i: usize,
    pub text: String,
    /// Byte offset of the token in the document text.
    pub idx: usize,
    pub dep: String,
    /// Index of the syntactic head. A root token is its own head.
    pub head: usize,
}

impl Token {
    pub fn end(&self) -> usize {
        self.idx + self.text.len()
    }

    pub fn has_dep(&self, labels: &[&str]) -> bool {
        labels.contains(&self.dep.as_str())
    }
}

/// Sentence boundary. `start..end` are token indices, `start_char..end_char`
/// byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub start: usize,
    pub end: usize,
    pub start_char: usize,
    pub end_char: usize,
}

impl Sentence {
    pub fn contains_span(&self, start: usize, end: usize) -> bool {
        self.start_char <= start && self.end_char >= end
    }

    pub fn token_range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

/// Dependency parse of one document, as produced by the external parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub text: String,
    pub tokens: Vec<Token>,
    pub sentences: Vec<Sentence>,
}

impl ParsedDocument {
    /// Check that every head and sentence index points inside the token list
    /// and every byte offset stays inside the text.
    pub fn validate(&self) -> Result<()> {
        let n = self.tokens.len();
        for (pos, token) in self.tokens.iter().enumerate() {
            if token.i != pos {
                anyhow::bail!("token at position {} has index {}", pos, token.i);
            }
            if token.head >= n {
                anyhow::bail!("token {} has head {} outside document of {} tokens", pos, token.head, n);
            }
            match token.idx.checked_add(token.text.len()) {
                Some(end) if end <= self.text.len() => {}
                _ => anyhow::bail!(
                    "token {} at byte {} runs past text of {} bytes",
                    pos,
                    token.idx,
                    self.text.len()
                ),
            }
        }
        for sentence in &self.sentences {
            if sentence.start > sentence.end || sentence.end > n {
                anyhow::bail!("sentence {}..{} outside document of {} tokens", sentence.start, sentence.end, n);
            }
            if sentence.start_char > sentence.end_char || sentence.end_char > self.text.len() {
                anyhow::bail!(
                    "sentence bytes {}..{} outside text of {} bytes",
                    sentence.start_char,
                    sentence.end_char,
                    self.text.len()
                );
            }
        }
        Ok(())
    }

    pub fn token(&self, i: usize) -> Option<&Token> {
        self.tokens.get(i)
    }

    /// The token's syntactic head, or `None` for a root.
    pub fn head_of(&self, token: &Token) -> Option<&Token> {
        if token.head == token.i {
            None
        } else {
            self.tokens.get(token.head)
        }
    }

    /// Direct dependents of `head`, in surface order.
    pub fn children(&self, head: usize) -> impl Iterator<Item = &Token> {
        self.tokens
            .iter()
            .filter(move |t| t.head == head && t.i != head)
    }

    pub fn sentence_containing(&self, start: usize, end: usize) -> Option<&Sentence> {
        self.sentences.iter().find(|s| s.contains_span(start, end))
    }

    pub fn sentence_tokens(&self, sentence: &Sentence) -> &[Token] {
        self.tokens.get(sentence.token_range()).unwrap_or(&[])
    }

    pub fn sentence_text(&self, sentence: &Sentence) -> String {
        self.text
            .get(sentence.start_char..sentence.end_char)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| self.join_tokens(sentence.start, sentence.end))
    }

    /// Surface text covering tokens `first..=last`.
    pub fn span_text(&self, first: usize, last: usize) -> String {
        let (Some(a), Some(b)) = (self.tokens.get(first), self.tokens.get(last)) else {
            return String::new();
        };
        self.text
            .get(a.idx..b.end())
            .map(str::to_string)
            .unwrap_or_else(|| self.join_tokens(first, last + 1))
    }

    /// Byte span covering tokens `first..=last`.
    pub fn span_position(&self, first: usize, last: usize) -> Option<(usize, usize)> {
        Some((self.tokens.get(first)?.idx, self.tokens.get(last)?.end()))
    }

    fn join_tokens(&self, start: usize, end: usize) -> String {
        self.tokens
            .get(start..end)
            .unwrap_or(&[])
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// External dependency parser.
pub trait DependencyParser {
    fn parse(&self, text: &str) -> impl std::future::Future<Output = Result<ParsedDocument>> + Send;
}

impl<P: DependencyParser + Sync> DependencyParser for &P {
    fn parse(&self, text: &str) -> impl std::future::Future<Output = Result<ParsedDocument>> + Send {
        (**self).parse(text)
    }
}

/// Client for a parser microservice (spaCy-compatible) that answers
/// `POST {base_url}/parse` with a [`ParsedDocument`].
#[derive(Clone)]
pub struct HttpDependencyParser {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ParseRequest<'a> {
    text: &'a str,
}

impl HttpDependencyParser {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl DependencyParser for HttpDependencyParser {
    async fn parse(&self, text: &str) -> Result<ParsedDocument> {
        let url = format!("{}/parse", self.base_url);

        let response = self.client
            .post(&url)
            .json(&ParseRequest { text })
            .send()
            .await
            .context("Failed to send request to parser service")?;

        if !response.status().is_success() {
            anyhow::bail!("Parser request failed: {}", response.status());
        }

        let parsed: ParsedDocument = response
            .json()
            .await
            .context("Failed to decode parser response")?;
        parsed.validate()?;

        Ok(parsed)
    }
}

/// Parser that hands back a parse supplied up front, e.g. with an API request.
#[derive(Clone)]
pub struct PrecomputedParse(pub ParsedDocument);

impl DependencyParser for PrecomputedParse {
    async fn parse(&self, _text: &str) -> Result<ParsedDocument> {
        self.0.validate()?;
        Ok(self.0.clone())
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_fixture_offsets_match_text() {
        let doc = alice_met_bob();
        assert_eq!(doc.text, "Alice met Bob in Paris yesterday.");
        for token in &doc.tokens {
            assert_eq!(&doc.text[token.idx..token.end()], token.text);
        }
        doc.validate().unwrap();
    }

    #[test]
    fn test_children_skip_root_self_loop() {
        let doc = alice_met_bob();
        let children: Vec<&str> = doc.children(1).map(|t| t.text.as_str()).collect();
        assert_eq!(children, vec!["Alice", "Bob", "in", "yesterday", "."]);
    }

    #[test]
    fn test_validate_rejects_bad_head() {
        let mut doc = alice_met_bob();
        doc.tokens[0].head = 42;
        assert!(doc.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_offsets_past_text() {
        let mut doc = alice_met_bob();
        doc.tokens[2].idx = usize::MAX - 1;
        assert!(doc.validate().is_err());

        let mut doc = alice_met_bob();
        doc.tokens[6].idx = doc.text.len();
        assert!(doc.validate().is_err());

        let mut doc = alice_met_bob();
        doc.sentences[0].end_char = doc.text.len() + 1;
        assert!(doc.validate().is_err());

        let mut doc = alice_met_bob();
        doc.sentences[0].start_char = 20;
        doc.sentences[0].end_char = 10;
        assert!(doc.validate().is_err());
    }

    #[tokio::test]
    async fn test_precomputed_parse_with_bad_offsets_is_rejected() {
        let mut doc = alice_met_bob();
        doc.tokens[2].idx = usize::MAX - 1;
        assert!(PrecomputedParse(doc).parse("Alice met Bob in Paris yesterday.").await.is_err());
    }

    #[test]
    fn test_span_text_and_sentence_lookup() {
        let doc = alice_met_bob();
        assert_eq!(doc.span_text(2, 4), "Bob in Paris");
        assert!(doc.sentence_containing(6, 9).is_some());
        assert!(doc.sentence_containing(6, 400).is_none());
    }
}
