//! Per-pipeline registry of extension definitions.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::{Container, ContainerKind, Resolver};
use crate::pipeline::observer::{PipelineObserver, TracingObserver};
use crate::types::{Document, Span, Token, Value};

/// Shared, thread-safe getter computing an attribute for one container.
pub type Getter<C> = Arc<dyn Fn(&C, &Resolver<'_>) -> Value + Send + Sync>;

/// How an extension attribute obtains its value.
pub enum Extension<C> {
    /// Computed on every access from the container's current state.
    Getter(Getter<C>),
    /// Written once per document by a stage; reads `default` until then.
    Stored { default: Value },
}

impl<C> Clone for Extension<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Getter(g) => Self::Getter(Arc::clone(g)),
            Self::Stored { default } => Self::Stored {
                default: default.clone(),
            },
        }
    }
}

impl<C> fmt::Debug for Extension<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Getter(_) => f.write_str("Getter(..)"),
            Self::Stored { default } => f.debug_struct("Stored").field("default", default).finish(),
        }
    }
}

/// Outcome of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The name was free.
    Added,
    /// An earlier definition under the same name was dropped.
    Replaced,
}

/// Insertion-ordered definitions for one container kind.
pub struct ExtensionTable<C> {
    entries: IndexMap<String, Extension<C>>,
}

impl<C> ExtensionTable<C> {
    fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Extension<C>> {
        self.entries.get(name)
    }

    /// Names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    // Order-preserving removal keeps `names()` equal to registration order.
    fn remove(&mut self, name: &str) -> Option<Extension<C>> {
        self.entries.shift_remove(name)
    }

    fn insert(&mut self, name: String, ext: Extension<C>) {
        self.entries.insert(name, ext);
    }
}

/// Maps `(container kind, name)` to an extension definition.
///
/// Writes (`register*`, `remove`) happen while a pipeline is being built;
/// during processing the registry is only read, so `resolve` can be called
/// from many threads at once.
pub struct ExtensionRegistry {
    pub(super) docs: ExtensionTable<Document>,
    pub(super) spans: ExtensionTable<Span>,
    pub(super) tokens: ExtensionTable<Token>,
    observer: Arc<dyn PipelineObserver>,
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtensionRegistry {
    /// Empty registry reporting to the [`TracingObserver`].
    pub fn new() -> Self {
        Self::with_observer(Arc::new(TracingObserver))
    }

    /// Empty registry reporting additions, replacements and removals to `observer`.
    pub fn with_observer(observer: Arc<dyn PipelineObserver>) -> Self {
        Self {
            docs: ExtensionTable::new(),
            spans: ExtensionTable::new(),
            tokens: ExtensionTable::new(),
            observer,
        }
    }

    /// Register a computed attribute on container kind `C`.
    ///
    /// An existing definition under `name` is removed first and the
    /// replacement is reported to the observer; the new definition takes the
    /// last position in [`list_names`](Self::list_names).
    pub fn register<C, F>(&mut self, name: impl Into<String>, getter: F) -> Registration
    where
        C: Container,
        F: Fn(&C, &Resolver<'_>) -> Value + Send + Sync + 'static,
    {
        self.register_shared::<C>(name, Arc::new(getter))
    }

    /// Like [`register`](Self::register), for an already shared getter.
    pub fn register_shared<C: Container>(
        &mut self,
        name: impl Into<String>,
        getter: Getter<C>,
    ) -> Registration {
        self.define::<C>(name.into(), Extension::Getter(getter))
    }

    /// Declare a stored document attribute that stages fill in per document.
    pub fn declare_doc_value(&mut self, name: impl Into<String>, default: Value) -> Registration {
        self.define::<Document>(name.into(), Extension::Stored { default })
    }

    fn define<C: Container>(&mut self, name: String, ext: Extension<C>) -> Registration {
        self.observer.on_extension_added(C::KIND, &name);
        let outcome = if C::table_mut(self).remove(&name).is_some() {
            self.observer.on_extension_replaced(C::KIND, &name);
            Registration::Replaced
        } else {
            Registration::Added
        };
        C::table_mut(self).insert(name, ext);
        outcome
    }

    /// Whether `name` is defined for kind `C`.
    pub fn has<C: Container>(&self, name: &str) -> bool {
        C::table(self).contains(name)
    }

    /// Remove the definition of `name`; returns `false` if there was none.
    pub fn remove<C: Container>(&mut self, name: &str) -> bool {
        let removed = C::table_mut(self).remove(name).is_some();
        if removed {
            self.observer.on_extension_removed(C::KIND, name);
        }
        removed
    }

    /// Compute `name` for `instance`, which belongs to `doc`.
    ///
    /// Getters run on every call; nothing is cached between accesses.
    /// Returns `None` when `name` is not defined for kind `C`.
    pub fn resolve<C: Container>(&self, name: &str, instance: &C, doc: &Document) -> Option<Value> {
        match C::table(self).get(name)? {
            Extension::Getter(getter) => Some(getter(instance, &Resolver::new(self, doc))),
            Extension::Stored { default } => Some(
                instance
                    .attached_value(name)
                    .cloned()
                    .unwrap_or_else(|| default.clone()),
            ),
        }
    }

    /// Registered names for kind `C`, in registration order.
    pub fn list_names<C: Container>(&self) -> Vec<&str> {
        C::table(self).names().collect()
    }

    /// Number of definitions for kind `C`.
    pub fn len<C: Container>(&self) -> usize {
        C::table(self).len()
    }

    /// Registered names for a kind chosen at runtime.
    pub fn names_of(&self, kind: ContainerKind) -> Vec<&str> {
        match kind {
            ContainerKind::Doc => self.list_names::<Document>(),
            ContainerKind::Span => self.list_names::<Span>(),
            ContainerKind::Token => self.list_names::<Token>(),
        }
    }

    /// Existence check for a kind chosen at runtime.
    pub fn has_kind(&self, kind: ContainerKind, name: &str) -> bool {
        match kind {
            ContainerKind::Doc => self.has::<Document>(name),
            ContainerKind::Span => self.has::<Span>(name),
            ContainerKind::Token => self.has::<Token>(name),
        }
    }

    /// The observer this registry reports to.
    pub fn observer(&self) -> &Arc<dyn PipelineObserver> {
        &self.observer
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("doc", &self.list_names::<Document>())
            .field("span", &self.list_names::<Span>())
            .field("token", &self.list_names::<Token>())
            .finish()
    }
}
