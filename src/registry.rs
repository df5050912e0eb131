//! Name bookkeeping for one compilation run.
//!
//! [`GlobalModelRegistry`] owns the run-wide state: the memoized final name of
//! every nominal node and the deduplicated global definitions. [`Scope`] is the
//! per-branch visited-set: it is cloned, never shared, when the compiler
//! descends into sibling children.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::{GeneratorError, Result};
use crate::schema::SchemaId;

#[derive(Debug, Clone)]
struct GlobalModel {
    owner: SchemaId,
    definition: String,
}

#[derive(Debug, Default)]
pub struct GlobalModelRegistry {
    names: HashMap<SchemaId, String>,
    globals: IndexMap<String, GlobalModel>,
    promoted: HashMap<SchemaId, String>,
}

impl GlobalModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Final name of `id`; the first proposal wins and is remembered.
    pub fn resolve_name(&mut self, id: SchemaId, propose: impl FnOnce() -> String) -> String {
        self.names.entry(id).or_insert_with(propose).clone()
    }

    pub fn name_of(&self, id: SchemaId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Name under which `id` was promoted to global scope, if it was.
    pub fn global_name(&self, id: SchemaId) -> Option<&str> {
        self.promoted.get(&id).map(String::as_str)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.globals.contains_key(name)
    }

    /// Mark `id` as global before its body is compiled, so recursive references
    /// to it resolve to its name.
    pub fn reserve(&mut self, id: SchemaId, name: &str) {
        self.promoted.insert(id, name.to_string());
    }

    /// Undo [`reserve`](Self::reserve) when the body produced no definition.
    pub fn abandon(&mut self, id: SchemaId) {
        self.promoted.remove(&id);
    }

    /// Register a global definition. Re-registering a known name is a no-op when
    /// it is the same node or the same text; anything else is a collision.
    pub fn register(&mut self, id: SchemaId, name: &str, definition: String) -> Result<String> {
        if let Some(existing) = self.globals.get(name) {
            if existing.owner != id && existing.definition != definition {
                self.promoted.remove(&id);
                return Err(GeneratorError::NameCollision(name.to_string()));
            }
        } else {
            tracing::debug!(name, "promoting model to global scope");
            self.globals.insert(
                name.to_string(),
                GlobalModel {
                    owner: id,
                    definition,
                },
            );
        }
        self.promoted.insert(id, name.to_string());
        Ok(name.to_string())
    }

    /// Global definitions in registration order.
    pub fn definitions(&self) -> impl Iterator<Item = &str> {
        self.globals.values().map(|m| m.definition.as_str())
    }

    pub fn len(&self) -> usize {
        self.globals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.globals.is_empty()
    }
}

/// Nodes visible (or being defined) in the current lexical scope.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    visible: HashMap<SchemaId, String>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, id: SchemaId) -> Option<&str> {
        self.visible.get(&id).map(String::as_str)
    }

    pub fn contains(&self, id: SchemaId) -> bool {
        self.visible.contains_key(&id)
    }

    pub fn insert(&mut self, id: SchemaId, name: &str) {
        self.visible.insert(id, name.to_string());
    }

    pub fn remove(&mut self, id: SchemaId) {
        self.visible.remove(&id);
    }
}
