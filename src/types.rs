//! Annotated text containers.
//!
//! [`Document`], [`Span`] and [`Token`] are produced by an external linguistic
//! annotator (tokenizer, sentence segmenter, POS tagger, lemmatizer). This
//! crate never changes their intrinsic fields; stages only attach extension
//! attributes through the [`ExtensionRegistry`](crate::extension::ExtensionRegistry).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// JSON-compatible value produced by extension attributes.
pub type Value = serde_json::Value;

/// A single annotated token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Surface text
    pub text: String,
    /// Lemma, if the annotator produced one
    #[serde(default)]
    pub lemma: Option<String>,
    /// Coarse (universal) part-of-speech tag, e.g. `NOUN`
    #[serde(default)]
    pub pos: String,
    /// Fine-grained tag, e.g. `VB`
    #[serde(default)]
    pub tag: String,
    /// Whether every character of the text is alphabetic
    #[serde(default)]
    pub is_alpha: bool,
    /// Whether this token opens a sentence
    #[serde(default)]
    pub is_sent_start: bool,
    /// Whitespace following the token in the source text
    #[serde(default)]
    pub whitespace: String,
}

impl Token {
    /// Create a token followed by a single space.
    ///
    /// `is_alpha` is derived from the text: non-empty and alphabetic only.
    pub fn new(
        text: impl Into<String>,
        lemma: impl Into<String>,
        pos: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        let text = text.into();
        let is_alpha = !text.is_empty() && text.chars().all(char::is_alphabetic);
        Self {
            text,
            lemma: Some(lemma.into()),
            pos: pos.into(),
            tag: tag.into(),
            is_alpha,
            is_sent_start: false,
            whitespace: " ".to_string(),
        }
    }

    /// Set the trailing whitespace.
    pub fn with_whitespace(mut self, whitespace: impl Into<String>) -> Self {
        self.whitespace = whitespace.into();
        self
    }

    /// Mark the token as the first of a sentence.
    pub fn with_sent_start(mut self, is_sent_start: bool) -> Self {
        self.is_sent_start = is_sent_start;
        self
    }

    /// Drop the lemma (partially annotated input).
    pub fn without_lemma(mut self) -> Self {
        self.lemma = None;
        self
    }

    /// Lemma as a string slice, if present.
    pub fn lemma(&self) -> Option<&str> {
        self.lemma.as_deref()
    }
}

/// Half-open token range `[start, end)` within a [`Document`].
///
/// Sentence spans are ordinary spans; arbitrary sub-ranges can be taken with
/// [`Document::span`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tokens covered by this span. Out-of-range spans yield an empty slice.
    pub fn tokens<'d>(&self, doc: &'d Document) -> &'d [Token] {
        doc.tokens.get(self.start..self.end).unwrap_or(&[])
    }

    /// Span text, rebuilt from token text and inner whitespace.
    pub fn text(&self, doc: &Document) -> String {
        let tokens = self.tokens(doc);
        let mut out = String::new();
        for (i, token) in tokens.iter().enumerate() {
            out.push_str(&token.text);
            if i + 1 < tokens.len() {
                out.push_str(&token.whitespace);
            }
        }
        out
    }
}

/// A fully annotated document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "DocumentInput")]
pub struct Document {
    pub text: String,
    pub tokens: Vec<Token>,
    pub sentences: Vec<Span>,
    /// Values of stored extensions, written by stages during processing.
    #[serde(skip)]
    attached: IndexMap<String, Value>,
}

impl Document {
    /// Build a document from tokens, rebuilding the text and deriving
    /// sentence spans from the sentence-start flags.
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        let mut text = String::new();
        for token in &tokens {
            text.push_str(&token.text);
            text.push_str(&token.whitespace);
        }
        text.truncate(text.trim_end().len());
        let sentences = sentence_spans(&tokens);
        Self {
            text,
            tokens,
            sentences,
            attached: IndexMap::new(),
        }
    }

    /// Build a document with explicit text and sentence boundaries.
    pub fn with_sentences(text: impl Into<String>, tokens: Vec<Token>, sentences: Vec<Span>) -> Self {
        Self {
            text: text.into(),
            tokens,
            sentences,
            attached: IndexMap::new(),
        }
    }

    /// Parse annotator output (`{"text": ..., "tokens": [...], "sentences": [...]}`).
    ///
    /// `text` and `sentences` are optional and derived from the tokens when absent.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Sub-range of tokens, `None` when out of bounds or reversed.
    pub fn span(&self, start: usize, end: usize) -> Option<Span> {
        (start <= end && end <= self.tokens.len()).then(|| Span::new(start, end))
    }

    /// Value attached by a stored extension, if a stage has written one.
    pub fn attached_value(&self, name: &str) -> Option<&Value> {
        self.attached.get(name)
    }

    /// Attach (or overwrite) a stored extension value.
    pub fn attach_value(&mut self, name: impl Into<String>, value: Value) {
        self.attached.insert(name.into(), value);
    }
}

fn sentence_spans(tokens: &[Token]) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate().skip(1) {
        if token.is_sent_start {
            spans.push(Span::new(start, i));
            start = i;
        }
    }
    if !tokens.is_empty() {
        spans.push(Span::new(start, tokens.len()));
    }
    spans
}

/// Wire shape of annotator output.
#[derive(Deserialize)]
struct DocumentInput {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    tokens: Vec<Token>,
    #[serde(default)]
    sentences: Option<Vec<Span>>,
}

impl From<DocumentInput> for Document {
    fn from(input: DocumentInput) -> Self {
        let mut doc = Document::from_tokens(input.tokens);
        if let Some(text) = input.text {
            doc.text = text;
        }
        if let Some(sentences) = input.sentences {
            doc.sentences = sentences;
        }
        doc
    }
}
