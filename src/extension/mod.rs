//! Extension attributes on annotated containers.
//!
//! An extension attribute is a named, read-only value attached to one
//! container kind ([`Document`], [`Span`] or [`Token`]). Stages register
//! attributes on an [`ExtensionRegistry`] when a pipeline is built; consumers
//! read them through [`ExtensionRegistry::resolve`] or a [`Resolver`].
//!
//! Each pipeline owns its own registry, so two pipelines in one process never
//! see each other's attributes.

mod registry;

pub use registry::{Extension, ExtensionRegistry, ExtensionTable, Getter, Registration};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Document, Span, Token, Value};

/// The container kinds that can carry extension attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    Doc,
    Span,
    Token,
}

impl ContainerKind {
    /// Returns the user-facing name used in logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Doc => "doc",
            Self::Span => "span",
            Self::Token => "token",
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for crate::types::Document {}
    impl Sealed for crate::types::Span {}
    impl Sealed for crate::types::Token {}
}

/// A container type with its own extension table in the registry.
///
/// Sealed: implemented for [`Document`], [`Span`] and [`Token`] only.
pub trait Container: sealed::Sealed + Sized + Send + Sync + 'static {
    const KIND: ContainerKind;

    #[doc(hidden)]
    fn table(registry: &ExtensionRegistry) -> &ExtensionTable<Self>;

    #[doc(hidden)]
    fn table_mut(registry: &mut ExtensionRegistry) -> &mut ExtensionTable<Self>;

    /// Value written to this instance for a stored extension, if any.
    fn attached_value<'a>(&'a self, _name: &str) -> Option<&'a Value> {
        None
    }
}

impl Container for Document {
    const KIND: ContainerKind = ContainerKind::Doc;

    fn table(registry: &ExtensionRegistry) -> &ExtensionTable<Self> {
        &registry.docs
    }

    fn table_mut(registry: &mut ExtensionRegistry) -> &mut ExtensionTable<Self> {
        &mut registry.docs
    }

    fn attached_value<'a>(&'a self, name: &str) -> Option<&'a Value> {
        Document::attached_value(self, name)
    }
}

impl Container for Span {
    const KIND: ContainerKind = ContainerKind::Span;

    fn table(registry: &ExtensionRegistry) -> &ExtensionTable<Self> {
        &registry.spans
    }

    fn table_mut(registry: &mut ExtensionRegistry) -> &mut ExtensionTable<Self> {
        &mut registry.spans
    }
}

impl Container for Token {
    const KIND: ContainerKind = ContainerKind::Token;

    fn table(registry: &ExtensionRegistry) -> &ExtensionTable<Self> {
        &registry.tokens
    }

    fn table_mut(registry: &mut ExtensionRegistry) -> &mut ExtensionTable<Self> {
        &mut registry.tokens
    }
}

// ============================================================================
// Resolver: read access scoped to one document
// ============================================================================

/// Read-only view of a registry bound to the document being processed.
///
/// Getters receive a resolver so that document-level attributes can be
/// computed from token-level ones (and spans can reach their tokens).
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    registry: &'a ExtensionRegistry,
    doc: &'a Document,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a ExtensionRegistry, doc: &'a Document) -> Self {
        Self { registry, doc }
    }

    pub fn doc(&self) -> &'a Document {
        self.doc
    }

    pub fn registry(&self) -> &'a ExtensionRegistry {
        self.registry
    }

    /// Resolve `name` on any container of this document.
    pub fn get<C: Container>(&self, name: &str, instance: &C) -> Option<Value> {
        self.registry.resolve(name, instance, self.doc)
    }

    /// Resolve a document-level attribute.
    pub fn doc_attr(&self, name: &str) -> Option<Value> {
        self.get(name, self.doc)
    }

    /// Resolve a token-level attribute by token index.
    pub fn token_attr(&self, name: &str, index: usize) -> Option<Value> {
        self.doc.tokens.get(index).and_then(|t| self.get(name, t))
    }

    /// Boolean attribute; anything other than `true` (including a missing
    /// definition) reads as `false`.
    pub fn flag<C: Container>(&self, name: &str, instance: &C) -> bool {
        matches!(self.get(name, instance), Some(Value::Bool(true)))
    }

    /// Number of tokens in `tokens` whose boolean attribute `name` is `true`.
    pub fn count_flagged(&self, name: &str, tokens: &[Token]) -> usize {
        tokens.iter().filter(|t| self.flag(name, *t)).count()
    }
}

impl fmt::Debug for Resolver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("registry", self.registry)
            .field("tokens", &self.doc.tokens.len())
            .finish()
    }
}
