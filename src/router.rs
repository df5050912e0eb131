//! Procedures and the namespace tree built from their dotted paths.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{GeneratorError, Result};
use crate::schema::SchemaId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcedureKind {
    Query,
    Mutation,
    Subscription,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProcedureMeta {
    /// `Some(false)` always excludes; `Some(true)` opts in when procedures are excluded by default
    pub include: Option<bool>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Procedure {
    pub kind: ProcedureKind,
    pub inputs: Vec<SchemaId>,
    pub output: Option<SchemaId>,
    pub meta: ProcedureMeta,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RouterEntry {
    Procedure(Procedure),
    Namespace(RouterTree),
}

/// One namespace level; entries keep the first-seen order of their paths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouterTree {
    pub entries: IndexMap<String, RouterEntry>,
}

impl RouterTree {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn procedures(&self) -> impl Iterator<Item = (&str, &Procedure)> {
        self.entries.iter().filter_map(|(k, v)| match v {
            RouterEntry::Procedure(p) => Some((k.as_str(), p)),
            RouterEntry::Namespace(_) => None,
        })
    }

    pub fn namespaces(&self) -> impl Iterator<Item = (&str, &RouterTree)> {
        self.entries.iter().filter_map(|(k, v)| match v {
            RouterEntry::Namespace(t) => Some((k.as_str(), t)),
            RouterEntry::Procedure(_) => None,
        })
    }
}

/// Split every `a.b.c` key on `.` and nest the procedures accordingly.
pub fn build_structure(procedures: &IndexMap<String, Procedure>) -> Result<RouterTree> {
    let mut root = RouterTree::default();
    for (path, procedure) in procedures {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(GeneratorError::Config(format!(
                "procedure path '{path}' has an empty segment"
            )));
        }
        let Some((leaf, parents)) = segments.split_last() else {
            continue;
        };

        let mut level = &mut root;
        for segment in parents {
            let entry = level
                .entries
                .entry(segment.to_string())
                .or_insert_with(|| RouterEntry::Namespace(RouterTree::default()));
            level = match entry {
                RouterEntry::Namespace(tree) => tree,
                RouterEntry::Procedure(_) => {
                    return Err(GeneratorError::PathConflict(path.clone()));
                }
            };
        }
        if level.entries.contains_key(*leaf) {
            return Err(GeneratorError::PathConflict(path.clone()));
        }
        level
            .entries
            .insert(leaf.to_string(), RouterEntry::Procedure(procedure.clone()));
    }
    Ok(root)
}
