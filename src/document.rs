//! Router Definition Document: the JSON export of a router and its schemas,
//! lowered into a [`SchemaGraph`] plus one procedure map per router.
//!
//! ```json
//! { "schemas": { "User": { "type": "object", "name": "User", "shape": { ... } } },
//!   "routers": { "app": { "procedures": { "user.get": { "kind": "query", "output": { "$ref": "User" } } } } } }
//! ```
//!
//! Every `$ref` to one definition lowers to the same [`SchemaId`]; every inline
//! schema is a node of its own.

use std::collections::HashSet;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{GeneratorError, Result};
use crate::path_de;
use crate::router::{Procedure, ProcedureKind, ProcedureMeta};
use crate::schema::{
    CollectionKind, Literal, Primitive, SchemaGraph, SchemaId, SchemaKind, SchemaMeta, SchemaNode,
};

// ————————————————————————————————————————————————————————————————————————————
// WIRE FORMAT
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    schemas: IndexMap<String, RawSchema>,
    #[serde(default)]
    routers: IndexMap<String, RawRouter>,
}

#[derive(Debug, Deserialize)]
struct RawRouter {
    #[serde(default)]
    procedures: IndexMap<String, RawProcedure>,
}

#[derive(Debug, Deserialize)]
struct RawProcedure {
    kind: ProcedureKind,
    #[serde(default)]
    input: Option<RawSchema>,
    #[serde(default)]
    inputs: Vec<RawSchema>,
    #[serde(default)]
    output: Option<RawSchema>,
    #[serde(default)]
    meta: ProcedureMeta,
}

/// One schema as written: either `{"$ref": id}` or a `type` discriminant with
/// the fields its variant needs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSchema {
    #[serde(rename = "$ref")]
    reference: Option<String>,
    #[serde(rename = "type")]
    type_name: Option<String>,
    name: Option<String>,
    description: Option<String>,
    #[serde(default)]
    global: bool,
    #[serde(default)]
    int: bool,
    inner: Option<Box<RawSchema>>,
    element: Option<Box<RawSchema>>,
    value_type: Option<Box<RawSchema>>,
    shape: Option<IndexMap<String, RawSchema>>,
    values: Option<Vec<Value>>,
    value: Option<Value>,
    options: Option<Vec<RawSchema>>,
}

// ————————————————————————————————————————————————————————————————————————————
// LOWERED DOCUMENT
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Default)]
pub struct RouterDocument {
    pub graph: SchemaGraph,
    /// definition id → node, in document order
    pub definitions: IndexMap<String, SchemaId>,
    pub routers: IndexMap<String, IndexMap<String, Procedure>>,
}

impl RouterDocument {
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| GeneratorError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&source, &path.display().to_string())
    }

    pub fn parse(source: &str, origin: &str) -> Result<Self> {
        let raw: RawDocument = path_de::from_str_with_path(source, origin)?;
        Lowering::new(origin).run(raw)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let raw: RawDocument = path_de::from_value_with_path(value, "<value>")?;
        Lowering::new("<value>").run(raw)
    }

    /// Procedure map of one exported router.
    pub fn router(&self, name: &str) -> Result<&IndexMap<String, Procedure>> {
        self.routers
            .get(name)
            .ok_or_else(|| GeneratorError::UnknownRouter {
                name: name.to_string(),
                available: self
                    .routers
                    .keys()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// LOWERING
// ————————————————————————————————————————————————————————————————————————————

struct Lowering<'a> {
    origin: &'a str,
    graph: SchemaGraph,
    definitions: IndexMap<String, SchemaId>,
}

impl<'a> Lowering<'a> {
    fn new(origin: &'a str) -> Self {
        Self {
            origin,
            graph: SchemaGraph::new(),
            definitions: IndexMap::new(),
        }
    }

    fn run(mut self, raw: RawDocument) -> Result<RouterDocument> {
        // reserve bodies first so definitions can reference each other
        for (key, schema) in &raw.schemas {
            if schema.reference.is_none() {
                let id = self.graph.reserve();
                self.definitions.insert(key.clone(), id);
            }
        }
        for key in raw.schemas.keys() {
            if !self.definitions.contains_key(key) {
                let target = resolve_alias(&raw.schemas, key)?;
                let id = match self.definitions.get(&target) {
                    Some(id) => *id,
                    None => return Err(GeneratorError::UnknownReference(target)),
                };
                self.definitions.insert(key.clone(), id);
            }
        }
        // restore document order after aliases were appended
        let order: IndexMap<String, SchemaId> = raw
            .schemas
            .keys()
            .filter_map(|k| self.definitions.get(k).map(|id| (k.clone(), *id)))
            .collect();
        self.definitions = order;

        for (key, schema) in &raw.schemas {
            if schema.reference.is_some() {
                continue;
            }
            let id = self.definitions[key];
            let node = self.lower_body(schema, &format!("schemas.{key}"))?;
            self.graph.fill(id, node);
        }

        let mut routers = IndexMap::new();
        for (router_name, router) in &raw.routers {
            let mut procedures = IndexMap::new();
            for (path, procedure) in &router.procedures {
                let at = format!("routers.{router_name}.procedures.{path}");
                procedures.insert(path.clone(), self.lower_procedure(procedure, &at)?);
            }
            routers.insert(router_name.clone(), procedures);
        }

        tracing::debug!(
            nodes = self.graph.len(),
            definitions = self.definitions.len(),
            routers = routers.len(),
            "lowered router definition document"
        );

        Ok(RouterDocument {
            graph: self.graph,
            definitions: self.definitions,
            routers,
        })
    }

    fn lower_procedure(&mut self, raw: &RawProcedure, at: &str) -> Result<Procedure> {
        let mut inputs = Vec::new();
        if let Some(input) = &raw.input {
            inputs.push(self.lower(input, &format!("{at}.input"))?);
        }
        for (ix, input) in raw.inputs.iter().enumerate() {
            inputs.push(self.lower(input, &format!("{at}.inputs[{ix}]"))?);
        }
        let output = match &raw.output {
            Some(output) => Some(self.lower(output, &format!("{at}.output"))?),
            None => None,
        };
        Ok(Procedure {
            kind: raw.kind,
            inputs,
            output,
            meta: raw.meta.clone(),
        })
    }

    fn lower(&mut self, raw: &RawSchema, at: &str) -> Result<SchemaId> {
        if let Some(reference) = &raw.reference {
            return self
                .definitions
                .get(reference)
                .copied()
                .ok_or_else(|| GeneratorError::UnknownReference(reference.clone()));
        }
        let node = self.lower_body(raw, at)?;
        Ok(self.graph.add_with_meta(node.kind, node.meta))
    }

    fn lower_body(&mut self, raw: &RawSchema, at: &str) -> Result<SchemaNode> {
        let Some(type_name) = raw.type_name.as_deref() else {
            return Err(self.missing(at, "type"));
        };
        let kind = match type_name {
            "string" | "symbol" => SchemaKind::Primitive(Primitive::String),
            "number" if raw.int => SchemaKind::Primitive(Primitive::Integer),
            "number" => SchemaKind::Primitive(Primitive::Float),
            "integer" | "bigint" => SchemaKind::Primitive(Primitive::Integer),
            "boolean" => SchemaKind::Primitive(Primitive::Boolean),
            "date" => SchemaKind::Primitive(Primitive::Timestamp),
            "any" | "unknown" => SchemaKind::Primitive(Primitive::Any),
            "void" | "undefined" | "null" | "never" | "nan" => SchemaKind::Empty,
            "optional" => SchemaKind::Optional(self.child(raw.inner.as_deref(), at, "inner")?),
            "nullable" => SchemaKind::Nullable(self.child(raw.inner.as_deref(), at, "inner")?),
            "array" | "set" => SchemaKind::Collection {
                kind: if type_name == "set" {
                    CollectionKind::Set
                } else {
                    CollectionKind::Array
                },
                element: self.child(raw.element.as_deref(), at, "element")?,
            },
            "record" | "map" => SchemaKind::Collection {
                kind: CollectionKind::Map,
                element: self.child(raw.value_type.as_deref(), at, "valueType")?,
            },
            "object" => {
                let Some(shape) = &raw.shape else {
                    return Err(self.missing(at, "shape"));
                };
                let mut fields = Vec::with_capacity(shape.len());
                for (key, field) in shape {
                    fields.push((key.clone(), self.lower(field, &format!("{at}.shape.{key}"))?));
                }
                SchemaKind::Object { fields }
            }
            "enum" => {
                let Some(values) = &raw.values else {
                    return Err(self.missing(at, "values"));
                };
                let values = values
                    .iter()
                    .enumerate()
                    .map(|(ix, v)| self.literal(v, &format!("{at}.values[{ix}]")))
                    .collect::<Result<Vec<_>>>()?;
                SchemaKind::Enum { values }
            }
            "literal" => {
                let Some(value) = &raw.value else {
                    return Err(self.missing(at, "value"));
                };
                SchemaKind::Literal(self.literal(value, &format!("{at}.value"))?)
            }
            "union" => {
                let Some(options) = &raw.options else {
                    return Err(self.missing(at, "options"));
                };
                let mut lowered = Vec::with_capacity(options.len());
                for (ix, option) in options.iter().enumerate() {
                    lowered.push(self.lower(option, &format!("{at}.options[{ix}]"))?);
                }
                SchemaKind::Union { options: lowered }
            }
            "effects" | "transform" | "default" | "catch" | "branded" | "readonly" | "lazy"
            | "promise" | "pipeline" => {
                SchemaKind::Transform(self.child(raw.inner.as_deref(), at, "inner")?)
            }
            other => SchemaKind::Unsupported(other.to_string()),
        };
        Ok(SchemaNode {
            kind,
            meta: SchemaMeta {
                name: raw.name.clone(),
                description: raw.description.clone(),
                global: raw.global,
            },
        })
    }

    fn child(&mut self, raw: Option<&RawSchema>, at: &str, field: &str) -> Result<SchemaId> {
        match raw {
            Some(raw) => self.lower(raw, &format!("{at}.{field}")),
            None => Err(self.missing(at, field)),
        }
    }

    fn literal(&self, value: &Value, at: &str) -> Result<Literal> {
        match value {
            Value::String(s) => Ok(Literal::String(s.clone())),
            Value::Bool(b) => Ok(Literal::Bool(*b)),
            Value::Null => Ok(Literal::Null),
            Value::Number(n) => n
                .as_f64()
                .map(Literal::Number)
                .ok_or_else(|| self.invalid(at, "number out of range")),
            Value::Array(_) | Value::Object(_) => Err(self.invalid(at, "literal must be a scalar")),
        }
    }

    fn missing(&self, at: &str, field: &str) -> GeneratorError {
        self.invalid(at, &format!("missing field `{field}`"))
    }

    fn invalid(&self, at: &str, message: &str) -> GeneratorError {
        GeneratorError::Parse {
            origin: self.origin.to_string(),
            path: at.to_string(),
            message: message.to_string(),
        }
    }
}

/// Follow a chain of `$ref`-only definitions to the definition that has a body.
fn resolve_alias(schemas: &IndexMap<String, RawSchema>, start: &str) -> Result<String> {
    let mut seen = HashSet::new();
    let mut current = start.to_string();
    loop {
        if !seen.insert(current.clone()) {
            return Err(GeneratorError::AliasCycle(start.to_string()));
        }
        let Some(schema) = schemas.get(&current) else {
            return Err(GeneratorError::UnknownReference(current));
        };
        match &schema.reference {
            Some(next) => current = next.clone(),
            None => return Ok(current),
        }
    }
}
