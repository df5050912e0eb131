//! Schema Compiler: turns a schema node into a Swift type signature and, for
//! structs, enums and unions, the declaration that defines it.
//!
//! A compile returns `None` when the node denotes no value at all (void,
//! undefined, ...); callers omit the field or parameter. Nominal nodes are
//! named once per run, looked up in the global registry and then in the local
//! [`Scope`], and only defined on a miss. Definitions either go to the
//! registry (global promotion) or travel back to the caller as a
//! [`LocalModel`] to be nested in the enclosing declaration.

mod enumeration;
mod structure;
mod union;

use crate::config::{Configuration, GlobalMode};
use crate::error::{Diagnostic, GeneratorError, Result};
use crate::naming;
use crate::registry::{GlobalModelRegistry, Scope};
use crate::schema::{CollectionKind, Primitive, SchemaGraph, SchemaId, SchemaKind};

/// Deepest nesting of compile calls before a schema is rejected.
pub const MAX_CALL_DEPTH: usize = 512;

// ————————————————————————————————————————————————————————————————————————————
// RESULTS
// ————————————————————————————————————————————————————————————————————————————

/// A declaration that must be placed inside whatever declares the referencing type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalModel {
    pub owner: SchemaId,
    pub name: String,
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeResult {
    pub signature: String,
    pub local: Option<LocalModel>,
}

impl TypeResult {
    fn reference(name: &str) -> Self {
        Self {
            signature: name.to_string(),
            local: None,
        }
    }

    pub fn is_optional(&self) -> bool {
        self.signature.ends_with('?')
    }
}

/// Local definitions collected for one enclosing declaration, one per node.
#[derive(Debug, Clone, Default)]
pub struct LocalModels {
    models: Vec<LocalModel>,
}

impl LocalModels {
    /// Keep `model` unless its node is already defined here. A different node
    /// under an existing name is rejected and nothing is kept.
    pub fn absorb(&mut self, model: LocalModel) -> Result<()> {
        if self.models.iter().any(|m| m.owner == model.owner) {
            return Ok(());
        }
        if self.models.iter().any(|m| m.name == model.name) {
            return Err(GeneratorError::NameCollision(model.name));
        }
        self.models.push(model);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &LocalModel> {
        self.models.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// All definitions, blank-line separated.
    pub fn render(&self) -> String {
        self.models
            .iter()
            .map(|m| m.definition.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CONTEXT
// ————————————————————————————————————————————————————————————————————————————

pub struct CompileContext<'s> {
    /// nodes visible in the enclosing lexical scope, plus those being defined
    pub scope: &'s mut Scope,
    /// 0 at a procedure's input/output, +1 per struct field or union alternative
    pub model_depth: usize,
    /// the enclosing position appends the `?` itself
    pub already_optional: bool,
    pub fallback_name: String,
    /// nearest enclosing wrapper or collection carrying a name or `global`
    pub declared: Option<SchemaId>,
}

impl<'s> CompileContext<'s> {
    pub fn new(scope: &'s mut Scope, fallback_name: impl Into<String>) -> Self {
        Self {
            scope,
            model_depth: 0,
            already_optional: false,
            fallback_name: fallback_name.into(),
            declared: None,
        }
    }

    /// Same position and scope, seen through a wrapper.
    fn descend(&mut self, already_optional: bool, declared: Option<SchemaId>) -> CompileContext<'_> {
        CompileContext {
            scope: &mut *self.scope,
            model_depth: self.model_depth,
            already_optional,
            fallback_name: self.fallback_name.clone(),
            declared,
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// COMPILER
// ————————————————————————————————————————————————————————————————————————————

pub struct Compiler<'a> {
    graph: &'a SchemaGraph,
    config: &'a Configuration,
    registry: GlobalModelRegistry,
    diagnostics: Vec<Diagnostic>,
    call_depth: usize,
}

impl<'a> Compiler<'a> {
    pub fn new(graph: &'a SchemaGraph, config: &'a Configuration) -> Self {
        Self {
            graph,
            config,
            registry: GlobalModelRegistry::new(),
            diagnostics: Vec::new(),
            call_depth: 0,
        }
    }

    pub fn graph(&self) -> &'a SchemaGraph {
        self.graph
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn finish(self) -> (GlobalModelRegistry, Vec<Diagnostic>) {
        (self.registry, self.diagnostics)
    }

    /// Record a recoverable error; the caller drops whatever `location` names.
    pub fn report(&mut self, location: String, error: GeneratorError) {
        if !self.config.quiet {
            tracing::warn!(%location, %error, "left out of the generated client");
        }
        self.diagnostics.push(Diagnostic { location, error });
    }

    pub fn compile(&mut self, id: SchemaId, ctx: &mut CompileContext<'_>) -> Result<Option<TypeResult>> {
        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(GeneratorError::RecursionLimit(MAX_CALL_DEPTH));
        }
        self.call_depth += 1;
        let result = self.compile_node(id, ctx);
        self.call_depth -= 1;
        result
    }

    fn compile_node(&mut self, id: SchemaId, ctx: &mut CompileContext<'_>) -> Result<Option<TypeResult>> {
        let graph = self.graph;
        match graph.kind(id) {
            SchemaKind::Primitive(primitive) => {
                Ok(Some(TypeResult::reference(primitive_signature(*primitive))))
            }
            SchemaKind::Empty => Ok(None),
            SchemaKind::Optional(_) | SchemaKind::Nullable(_) => self.compile_optional(id, ctx),
            SchemaKind::Collection { kind, element } => {
                self.compile_collection(id, *kind, *element, ctx)
            }
            SchemaKind::Transform(inner) => {
                let already_optional = ctx.already_optional;
                let declared = self.declared_by(id, ctx.declared);
                self.compile(*inner, &mut ctx.descend(already_optional, declared))
            }
            SchemaKind::Object { .. }
            | SchemaKind::Enum { .. }
            | SchemaKind::Literal(_)
            | SchemaKind::Union { .. } => self.compile_nominal(id, ctx),
            SchemaKind::Unsupported(type_name) => {
                Err(GeneratorError::UnsupportedSchema(type_name.clone()))
            }
        }
    }

    fn compile_optional(&mut self, id: SchemaId, ctx: &mut CompileContext<'_>) -> Result<Option<TypeResult>> {
        let (base, declared) = self.strip_optionality(id, ctx.declared)?;
        let Some(mut result) = self.compile(base, &mut ctx.descend(true, declared))? else {
            return Ok(None);
        };
        if !ctx.already_optional && !result.is_optional() {
            result.signature.push('?');
        }
        Ok(Some(result))
    }

    /// Follow optional / nullable / transform wrappers down to the wrapped node,
    /// keeping the innermost wrapper that declares a name.
    fn strip_optionality(
        &self,
        id: SchemaId,
        declared: Option<SchemaId>,
    ) -> Result<(SchemaId, Option<SchemaId>)> {
        let mut base = id;
        let mut declared = declared;
        let mut steps = 0;
        while let SchemaKind::Optional(inner)
        | SchemaKind::Nullable(inner)
        | SchemaKind::Transform(inner) = self.graph.kind(base)
        {
            declared = self.declared_by(base, declared);
            base = *inner;
            steps += 1;
            // a chain longer than the graph revisits a node
            if steps > self.graph.len() {
                return Err(GeneratorError::RecursionLimit(self.graph.len()));
            }
        }
        Ok((base, declared))
    }

    /// `wrapper` when it carries a name or `global`, otherwise the one already in effect.
    fn declared_by(&self, wrapper: SchemaId, current: Option<SchemaId>) -> Option<SchemaId> {
        let meta = self.graph.meta(wrapper);
        if meta.name.is_some() || meta.global {
            Some(wrapper)
        } else {
            current
        }
    }

    /// Whether a value of `id` may be absent, looking through transforms.
    fn admits_null(&self, id: SchemaId) -> bool {
        let mut current = id;
        for _ in 0..=self.graph.len() {
            match self.graph.kind(current) {
                SchemaKind::Transform(inner) => current = *inner,
                SchemaKind::Optional(_) | SchemaKind::Nullable(_) | SchemaKind::Empty => return true,
                _ => return false,
            }
        }
        false
    }

    fn compile_collection(
        &mut self,
        id: SchemaId,
        kind: CollectionKind,
        element: SchemaId,
        ctx: &mut CompileContext<'_>,
    ) -> Result<Option<TypeResult>> {
        let declared = self.declared_by(id, ctx.declared);
        let Some(element) = self.compile(element, &mut ctx.descend(false, declared))? else {
            return Ok(None);
        };
        let signature = match kind {
            CollectionKind::Array => format!("[{}]", element.signature),
            CollectionKind::Set => format!("Set<{}>", element.signature),
            CollectionKind::Map => format!("[String: {}]", element.signature),
        };
        Ok(Some(TypeResult {
            signature,
            local: element.local,
        }))
    }

    // ---- nominal nodes ----

    fn compile_nominal(&mut self, id: SchemaId, ctx: &mut CompileContext<'_>) -> Result<Option<TypeResult>> {
        let graph = self.graph;
        let meta = graph.meta(id);
        let wrapper = ctx.declared.map(|w| graph.meta(w));
        let fallback = &ctx.fallback_name;
        let name = self.registry.resolve_name(id, || {
            let declared = meta.name.as_deref().or(wrapper.and_then(|w| w.name.as_deref()));
            naming::type_name(declared.unwrap_or(fallback))
        });
        let description = meta
            .description
            .as_deref()
            .or(wrapper.and_then(|w| w.description.as_deref()));

        if let Some(global) = self.registry.global_name(id) {
            return Ok(Some(TypeResult::reference(global)));
        }
        if let Some(local) = ctx.scope.lookup(id) {
            return Ok(Some(TypeResult::reference(local)));
        }

        if self.is_global(id, ctx.declared, ctx.model_depth) {
            self.registry.reserve(id, &name);
            let mut own = Scope::new();
            own.insert(id, &name);
            return match self.define(id, &name, description, &own, ctx.model_depth) {
                Ok(Some(definition)) => {
                    let name = self.registry.register(id, &name, definition)?;
                    Ok(Some(TypeResult::reference(&name)))
                }
                Ok(None) => {
                    self.registry.abandon(id);
                    Ok(None)
                }
                Err(error) => {
                    self.registry.abandon(id);
                    Err(error)
                }
            };
        }

        ctx.scope.insert(id, &name);
        match self.define(id, &name, description, ctx.scope, ctx.model_depth) {
            Ok(Some(definition)) => Ok(Some(TypeResult {
                signature: name.clone(),
                local: Some(LocalModel {
                    owner: id,
                    name,
                    definition,
                }),
            })),
            Ok(None) => {
                ctx.scope.remove(id);
                Ok(None)
            }
            Err(error) => {
                ctx.scope.remove(id);
                Err(error)
            }
        }
    }

    /// Named (by the node or the wrapper declaring it) and promoted by the
    /// `global` flag of either or by the configured mode.
    fn is_global(&self, id: SchemaId, declared: Option<SchemaId>, model_depth: usize) -> bool {
        let meta = self.graph.meta(id);
        let wrapper = declared.map(|w| self.graph.meta(w));
        if meta.name.is_none() && wrapper.is_none_or(|w| w.name.is_none()) {
            return false;
        }
        meta.global
            || wrapper.is_some_and(|w| w.global)
            || match self.config.models.make_global {
                GlobalMode::All => true,
                GlobalMode::Top => model_depth == 0,
                GlobalMode::None => false,
            }
    }

    fn define(
        &mut self,
        id: SchemaId,
        name: &str,
        description: Option<&str>,
        scope: &Scope,
        model_depth: usize,
    ) -> Result<Option<String>> {
        let graph = self.graph;
        match graph.kind(id) {
            SchemaKind::Object { fields } => self
                .define_struct(name, description, fields, scope, model_depth)
                .map(Some),
            SchemaKind::Enum { values } => Ok(self.define_enum(name, description, values)),
            SchemaKind::Literal(literal) => {
                Ok(self.define_enum(name, description, std::slice::from_ref(literal)))
            }
            SchemaKind::Union { options } => {
                self.define_union(name, description, options, scope, model_depth)
            }
            _ => Ok(None),
        }
    }

    /// Context for a struct field or union alternative: its own copy of the scope.
    fn member_context<'s>(
        scope: &'s mut Scope,
        model_depth: usize,
        already_optional: bool,
        fallback_name: String,
    ) -> CompileContext<'s> {
        CompileContext {
            scope,
            model_depth: model_depth + 1,
            already_optional,
            fallback_name,
            declared: None,
        }
    }

    fn access(&self) -> &'static str {
        self.config.access_prefix()
    }
}

pub fn primitive_signature(primitive: Primitive) -> &'static str {
    match primitive {
        Primitive::String => "String",
        Primitive::Integer => "Int",
        Primitive::Float => "Double",
        Primitive::Boolean => "Bool",
        Primitive::Timestamp => "Date",
        Primitive::Any => "TRPCJSONValue",
    }
}
