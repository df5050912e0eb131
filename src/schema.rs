// Schema graph for codegen. Nodes live in an arena; a `SchemaId` is the node's
// identity, so two structurally equal nodes are still two different types.

use std::fmt;

/// Handle to a node in a [`SchemaGraph`]. Equality is reference identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(pub(crate) usize);

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    String,
    Integer,
    Float,
    Boolean,
    Timestamp,
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Array,
    Set,
    /// map with string keys
    Map,
}

/// A literal value carried by an enum or single-literal node.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
    Bool(bool),
    Null,
}

impl Literal {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::String(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    Primitive(Primitive),
    /// void / undefined / null / never / nan: no value at all
    Empty,
    Optional(SchemaId),
    Nullable(SchemaId),
    Collection {
        kind: CollectionKind,
        element: SchemaId,
    },
    Object {
        fields: Vec<(String, SchemaId)>, // declaration order
    },
    Enum {
        values: Vec<Literal>,
    },
    Literal(Literal),
    Union {
        options: Vec<SchemaId>,
    },
    /// refinement / default / brand / lazy ...: emitted exactly like `inner`
    Transform(SchemaId),
    /// a variant the compiler has no case for; carries the source discriminant
    Unsupported(String),
}

/// Out-of-band metadata attached to a node by its author.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaMeta {
    pub name: Option<String>,
    pub description: Option<String>,
    pub global: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub kind: SchemaKind,
    pub meta: SchemaMeta,
}

#[derive(Debug, Clone, Default)]
pub struct SchemaGraph {
    nodes: Vec<SchemaNode>,
}

impl SchemaGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: SchemaKind) -> SchemaId {
        self.add_with_meta(kind, SchemaMeta::default())
    }

    pub fn add_with_meta(&mut self, kind: SchemaKind, meta: SchemaMeta) -> SchemaId {
        self.nodes.push(SchemaNode { kind, meta });
        SchemaId(self.nodes.len() - 1)
    }

    /// Allocate a node whose body is filled in later (recursive definitions).
    pub(crate) fn reserve(&mut self) -> SchemaId {
        self.add(SchemaKind::Empty)
    }

    pub(crate) fn fill(&mut self, id: SchemaId, node: SchemaNode) {
        self.nodes[id.0] = node;
    }

    pub fn node(&self, id: SchemaId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    pub fn kind(&self, id: SchemaId) -> &SchemaKind {
        &self.nodes[id.0].kind
    }

    pub fn meta(&self, id: SchemaId) -> &SchemaMeta {
        &self.nodes[id.0].meta
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether this node kind gets a name and a definition of its own.
    pub fn is_nominal(&self, id: SchemaId) -> bool {
        matches!(
            self.kind(id),
            SchemaKind::Object { .. }
                | SchemaKind::Enum { .. }
                | SchemaKind::Literal(_)
                | SchemaKind::Union { .. }
        )
    }
}
