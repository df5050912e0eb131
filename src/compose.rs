//! Router Namespace Composer: renders the router tree as nested client classes.
//!
//! The root class owns the base URL and middlewares; every namespace below it
//! becomes a `<Segment>Route` class nested in its parent and reached through a
//! lazy accessor. Each procedure is one `async throws` method delegating to the
//! runtime `TRPCClient`. Types defined locally by a procedure are nested in the
//! class that declares the method.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::compile::{CompileContext, Compiler, LocalModels, TypeResult};
use crate::config::{Configuration, ModelInclusion, ProcedureInclusion};
use crate::error::{Diagnostic, GeneratorError, Result};
use crate::naming;
use crate::registry::{GlobalModelRegistry, Scope};
use crate::router::{Procedure, ProcedureKind, RouterEntry, RouterTree};
use crate::schema::{SchemaGraph, SchemaId};

/// Everything the assembler needs once the root class is rendered.
pub struct ComposedClient {
    pub root: String,
    pub registry: GlobalModelRegistry,
    pub aliases: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// A procedure-level local type and where it lives.
struct AliasCandidate {
    alias: String,
    target: String,
}

/// Where a class sits in the router tree.
#[derive(Clone, Default)]
struct ClassPath {
    /// raw segments below the root, for locations and URLs
    segments: Vec<String>,
    /// Swift class names from the root down, for qualified type paths
    classes: Vec<String>,
}

pub struct Composer<'a> {
    compiler: Compiler<'a>,
    config: &'a Configuration,
    aliases: Vec<AliasCandidate>,
}

impl<'a> Composer<'a> {
    pub fn new(graph: &'a SchemaGraph, config: &'a Configuration) -> Self {
        Self {
            compiler: Compiler::new(graph, config),
            config,
            aliases: Vec::new(),
        }
    }

    /// Render the root class `router_name` and everything below it.
    pub fn compose(
        mut self,
        router_name: &str,
        tree: &RouterTree,
        definitions: &IndexMap<String, SchemaId>,
    ) -> Result<ComposedClient> {
        let mut scope = Scope::new();
        let models = match self.config.models.include {
            ModelInclusion::All => self.compile_definitions(definitions, &mut scope)?,
            ModelInclusion::Referenced => LocalModels::default(),
        };
        let root_name = naming::type_name(router_name);
        let path = ClassPath {
            segments: Vec::new(),
            classes: vec![root_name.clone()],
        };
        let root = self.compose_class(&root_name, router_name, tree, scope, models, &path)?;

        let aliases = self.render_aliases(&root_name);
        let (registry, diagnostics) = self.compiler.finish();
        let aliases = aliases
            .into_iter()
            .filter(|(alias, _)| !registry.contains_name(alias))
            .map(|(_, line)| line)
            .collect();
        Ok(ComposedClient {
            root,
            registry,
            aliases,
            diagnostics,
        })
    }

    /// Compile every named definition of the document at root scope.
    fn compile_definitions(
        &mut self,
        definitions: &IndexMap<String, SchemaId>,
        scope: &mut Scope,
    ) -> Result<LocalModels> {
        let graph = self.compiler.graph();
        let mut models = LocalModels::default();
        for (key, id) in definitions {
            if graph.meta(*id).name.is_none() || !graph.is_nominal(*id) {
                continue;
            }
            let mut trial = scope.clone();
            let compiled = self
                .compiler
                .compile(*id, &mut CompileContext::new(&mut trial, naming::type_name(key)));
            let local = match compiled {
                Ok(result) => result.and_then(|r| r.local),
                Err(error) if error.is_fatal_in_procedure() => return Err(error),
                Err(error) => {
                    self.compiler.report(format!("schemas.{key}"), error);
                    continue;
                }
            };
            if let Some(local) = local {
                if let Err(error) = models.absorb(local) {
                    self.compiler.report(format!("schemas.{key}"), error);
                    continue;
                }
            }
            *scope = trial;
        }
        Ok(models)
    }

    // ---- classes ----

    fn compose_class(
        &mut self,
        class_name: &str,
        segment: &str,
        tree: &RouterTree,
        mut scope: Scope,
        mut models: LocalModels,
        path: &ClassPath,
    ) -> Result<String> {
        let depth = path.segments.len();
        let access = self.config.access_prefix();
        let mut methods = Vec::new();
        let mut children = Vec::new();
        let mut accessors = String::new();

        for (key, entry) in &tree.entries {
            match entry {
                RouterEntry::Procedure(procedure) => {
                    let location = path
                        .segments
                        .iter()
                        .map(String::as_str)
                        .chain([key.as_str()])
                        .collect::<Vec<_>>()
                        .join(".");
                    if !self.is_included(procedure) {
                        tracing::debug!(procedure = %location, "excluded from the client");
                        continue;
                    }
                    match self.compose_method(key, procedure, depth, &mut scope, &mut models, path) {
                        Ok(method) => {
                            tracing::debug!(procedure = %location, "composed procedure");
                            methods.push(method);
                        }
                        Err(error) if error.is_fatal_in_procedure() => {
                            tracing::error!(procedure = %location, %error, "cannot compile procedure");
                            return Err(error);
                        }
                        Err(error) => self.compiler.report(location, error),
                    }
                }
                RouterEntry::Namespace(subtree) => {
                    let field = naming::field_name(key);
                    let child_name = format!("{}Route", naming::type_name(key));
                    let mut child_path = path.clone();
                    child_path.segments.push(key.clone());
                    child_path.classes.push(child_name.clone());
                    let child = self.compose_class(
                        &child_name,
                        key,
                        subtree,
                        scope.clone(),
                        LocalModels::default(),
                        &child_path,
                    )?;
                    accessors.push_str(&format!(
                        "private lazy var _{field} = {child_name}(clientData: self)\n\
                         {access}var {field}: {child_name} {{\n_{field}\n}}\n"
                    ));
                    children.push(child);
                }
            }
        }

        let mut out = format!("{access}class {class_name}: TRPCClientData {{\n");
        if !accessors.is_empty() {
            out.push_str(&accessors);
            out.push('\n');
        }
        if depth == 0 {
            out.push_str(&self.root_plumbing(class_name));
        } else {
            out.push_str(&child_plumbing(segment, depth));
        }
        if !models.is_empty() {
            out.push('\n');
            out.push_str(&models.render());
        }
        for method in &methods {
            out.push('\n');
            out.push_str(method);
        }
        for child in &children {
            out.push('\n');
            out.push_str(child);
        }
        out.push_str("}\n");
        Ok(out)
    }

    fn root_plumbing(&self, class_name: &str) -> String {
        let access = self.config.access_prefix();
        let shared = self.config.create_shared;
        let mut out = String::new();
        if shared {
            out.push_str(&format!("{access}static let shared = {class_name}()\n\n"));
            out.push_str(&format!("{access}var baseUrl: URL!\n"));
        } else {
            out.push_str("private var baseUrl: URL\n");
        }
        out.push_str("private var baseMiddlewares: [TRPCMiddleware] = []\n\n");
        out.push_str("fileprivate var url: URL {\nbaseUrl\n}\n\n");
        out.push_str("fileprivate var middlewares: [TRPCMiddleware] {\nbaseMiddlewares\n}\n\n");
        out.push_str(&format!(
            "{access}init(baseUrl: URL{}, middlewares: [TRPCMiddleware] = []) {{\n",
            if shared { "? = nil" } else { "" }
        ));
        out.push_str("self.baseUrl = baseUrl\nself.baseMiddlewares = middlewares\n}\n");
        out
    }

    // ---- procedures ----

    fn is_included(&self, procedure: &Procedure) -> bool {
        match procedure.meta.include {
            Some(include) => include,
            None => self.config.procedures.include == ProcedureInclusion::All,
        }
    }

    /// Compile one procedure's types against a copy of the class scope and
    /// commit them only when the whole procedure succeeds.
    fn compose_method(
        &mut self,
        key: &str,
        procedure: &Procedure,
        depth: usize,
        scope: &mut Scope,
        models: &mut LocalModels,
        path: &ClassPath,
    ) -> Result<String> {
        if procedure.inputs.len() > 1 {
            return Err(GeneratorError::MultipleInputs);
        }
        let base = naming::type_name(key);
        let mut trial = scope.clone();
        let input = self.compile_top(procedure.inputs.first().copied(), &mut trial, format!("{base}Input"))?;
        let output = self.compile_top(procedure.output, &mut trial, format!("{base}Output"))?;

        let mut trial_models = models.clone();
        let mut introduced = Vec::new();
        for result in [&input, &output].into_iter().flatten() {
            if let Some(local) = &result.local {
                if !trial_models.iter().any(|m| m.owner == local.owner) {
                    introduced.push(local.name.clone());
                }
                trial_models.absorb(local.clone())?;
            }
        }
        *scope = trial;
        *models = trial_models;

        for name in introduced {
            let alias = path.segments.iter().map(|s| naming::type_name(s)).collect::<String>() + &name;
            let target = format!("{}.{name}", path.classes.join("."));
            self.aliases.push(AliasCandidate { alias, target });
        }

        Ok(self.render_method(key, procedure, depth, input.as_ref(), output.as_ref()))
    }

    fn compile_top(
        &mut self,
        id: Option<SchemaId>,
        scope: &mut Scope,
        fallback: String,
    ) -> Result<Option<TypeResult>> {
        match id {
            Some(id) => self.compiler.compile(id, &mut CompileContext::new(scope, fallback)),
            None => Ok(None),
        }
    }

    fn render_method(
        &self,
        key: &str,
        procedure: &Procedure,
        depth: usize,
        input: Option<&TypeResult>,
        output: Option<&TypeResult>,
    ) -> String {
        let access = self.config.access_prefix();
        let mut out = String::new();
        if let Some(description) = &procedure.meta.description {
            out.push_str(&naming::doc_comment(description));
        }

        let parameter = match input {
            Some(input) if input.is_optional() => format!("input: {} = nil", input.signature),
            Some(input) => format!("input: {}", input.signature),
            None => String::new(),
        };
        let url_method = if depth == 0 {
            "appendingPathComponent"
        } else {
            "appendingPathExtension"
        };
        let arguments = format!(
            "url: url.{url_method}({}), middlewares: middlewares, input: {}",
            naming::string_literal(key),
            if input.is_some() { "input" } else { "TRPCClient.EmptyObject()" }
        );
        let method = naming::field_name(key);

        match procedure.kind {
            ProcedureKind::Subscription => {
                let element = output.map_or("TRPCClient.EmptyObject", |o| o.signature.as_str());
                out.push_str(&format!(
                    "{access}func {method}({parameter}) -> AsyncThrowingStream<{element}, Error> {{\n"
                ));
                out.push_str(&format!("TRPCClient.shared.sendSubscription({arguments})\n}}\n"));
            }
            ProcedureKind::Query | ProcedureKind::Mutation => {
                let send = if procedure.kind == ProcedureKind::Query {
                    "sendQuery"
                } else {
                    "sendMutation"
                };
                match output {
                    Some(output) => {
                        out.push_str(&format!(
                            "{access}func {method}({parameter}) async throws -> {} {{\n",
                            output.signature
                        ));
                        out.push_str(&format!("return try await TRPCClient.shared.{send}({arguments})\n}}\n"));
                    }
                    None => {
                        out.push_str(&format!("{access}func {method}({parameter}) async throws {{\n"));
                        out.push_str(&format!(
                            "let _: TRPCClient.EmptyObject = try await TRPCClient.shared.{send}({arguments})\n}}\n"
                        ));
                    }
                }
            }
        }
        out
    }

    // ---- aliases ----

    /// `(alias, line)` pairs, skipping aliases that clash with each other or the root.
    fn render_aliases(&mut self, root_name: &str) -> Vec<(String, String)> {
        if !self.config.create_type_aliases {
            return Vec::new();
        }
        let access = self.config.access_prefix();
        let mut seen: HashSet<String> = HashSet::from([root_name.to_string()]);
        self.aliases
            .drain(..)
            .filter(|candidate| seen.insert(candidate.alias.clone()))
            .map(|c| {
                let line = format!("{access}typealias {} = {}", c.alias, c.target);
                (c.alias, line)
            })
            .collect()
    }
}

fn child_plumbing(segment: &str, depth: usize) -> String {
    let url_method = if depth == 1 {
        "appendingPathComponent"
    } else {
        "appendingPathExtension"
    };
    format!(
        "fileprivate let clientData: TRPCClientData\n\n\
         fileprivate var url: URL {{\nclientData.url.{url_method}({})\n}}\n\n\
         fileprivate var middlewares: [TRPCMiddleware] {{\nclientData.middlewares\n}}\n\n\
         fileprivate init(clientData: TRPCClientData) {{\nself.clientData = clientData\n}}\n",
        naming::string_literal(segment)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GlobalMode;
    use crate::document::RouterDocument;
    use crate::router::build_structure;
    use serde_json::{json, Value};

    fn compose(value: Value, config: &Configuration) -> Result<ComposedClient> {
        let document = RouterDocument::from_value(value).unwrap();
        let tree = build_structure(document.router("app").unwrap()).unwrap();
        Composer::new(&document.graph, config).compose("app", &tree, &document.definitions)
    }

    fn hello() -> Value {
        json!({ "routers": { "app": { "procedures": {
            "hello": {
                "kind": "query",
                "input": { "type": "object", "shape": { "name": { "type": "optional", "inner": { "type": "string" } } } },
                "output": { "type": "object", "shape": { "message": { "type": "string" } } }
            }
        } } } })
    }

    #[test]
    fn hello_procedure_becomes_one_method_with_local_models() {
        let client = compose(hello(), &Configuration::default()).unwrap();
        let root = &client.root;
        assert!(root.starts_with("class App: TRPCClientData {\n"));
        assert!(root.contains("func hello(input: HelloInput) async throws -> HelloOutput {\n"));
        assert!(root.contains(
            "return try await TRPCClient.shared.sendQuery(url: url.appendingPathComponent(\"hello\"), middlewares: middlewares, input: input)\n"
        ));
        assert!(root.contains("struct HelloInput: Codable, Equatable {\nvar name: String?\n"));
        assert!(root.contains("struct HelloOutput: Codable, Equatable {\nvar message: String\n"));
        assert_eq!(root.matches("func ").count(), 1);
        assert!(client.registry.is_empty());
        assert!(client.diagnostics.is_empty());
    }

    #[test]
    fn dotted_paths_nest_route_classes() {
        let value = json!({ "routers": { "app": { "procedures": {
            "a.b.three": { "kind": "query", "output": { "type": "string" } },
            "a.b.four": { "kind": "mutation", "input": { "type": "number" } }
        } } } });
        let root = compose(value, &Configuration::default()).unwrap().root;

        assert!(root.contains("private lazy var _a = ARoute(clientData: self)\nvar a: ARoute {\n_a\n}\n"));
        assert!(root.contains("class ARoute: TRPCClientData {"));
        assert!(root.contains("clientData.url.appendingPathComponent(\"a\")"));
        assert!(root.contains("class BRoute: TRPCClientData {"));
        assert!(root.contains("clientData.url.appendingPathExtension(\"b\")"));
        assert!(root.contains("func three() async throws -> String {\n"));
        assert!(root.contains("url: url.appendingPathExtension(\"three\"), middlewares: middlewares, input: TRPCClient.EmptyObject()"));
        assert!(root.contains(
            "func four(input: Double) async throws {\nlet _: TRPCClient.EmptyObject = try await TRPCClient.shared.sendMutation("
        ));
        let b_class = root.find("class BRoute").unwrap();
        assert!(root.find("func three").unwrap() > b_class);
        assert!(root.find("func four").unwrap() > b_class);
    }

    #[test]
    fn shared_root_gets_a_singleton_and_optional_base_url() {
        let mut config = Configuration::default();
        config.create_shared = true;
        let root = compose(hello(), &config).unwrap().root;
        assert!(root.contains("static let shared = App()\n"));
        assert!(root.contains("var baseUrl: URL!\n"));
        assert!(root.contains("init(baseUrl: URL? = nil, middlewares: [TRPCMiddleware] = []) {"));

        let root = compose(hello(), &Configuration::default()).unwrap().root;
        assert!(!root.contains("static let shared"));
        assert!(root.contains("init(baseUrl: URL, middlewares: [TRPCMiddleware] = []) {"));
    }

    #[test]
    fn recoverable_procedure_errors_skip_only_that_procedure() {
        let value = json!({ "routers": { "app": { "procedures": {
            "multi": { "kind": "query", "inputs": [{ "type": "string" }, { "type": "string" }] },
            "ok": { "kind": "query" }
        } } } });
        let client = compose(value, &Configuration::default()).unwrap();
        assert!(!client.root.contains("func multi"));
        assert!(client.root.contains("func ok() async throws {"));
        assert_eq!(client.diagnostics.len(), 1);
        assert_eq!(client.diagnostics[0].location, "multi");
        assert_eq!(client.diagnostics[0].error.to_string(), "Multiple inputs not supported.");
    }

    #[test]
    fn unsupported_top_level_schemas_abort() {
        let value = json!({ "routers": { "app": { "procedures": {
            "a.weird": { "kind": "query", "output": { "type": "tuple" } }
        } } } });
        let err = compose(value, &Configuration::default()).err().unwrap();
        assert!(matches!(err, GeneratorError::UnsupportedSchema(t) if t == "tuple"));
    }

    #[test]
    fn inclusion_follows_meta_and_policy() {
        let value = json!({ "routers": { "app": { "procedures": {
            "hidden": { "kind": "query", "meta": { "include": false } },
            "plain": { "kind": "query" },
            "chosen": { "kind": "query", "meta": { "include": true, "description": "Picked" } }
        } } } });
        let root = compose(value.clone(), &Configuration::default()).unwrap().root;
        assert!(!root.contains("func hidden"));
        assert!(root.contains("func plain"));
        assert!(root.contains("/// Picked\nfunc chosen"));

        let mut config = Configuration::default();
        config.procedures.include = ProcedureInclusion::None;
        let root = compose(value, &config).unwrap().root;
        assert!(!root.contains("func plain"));
        assert!(root.contains("func chosen"));
    }

    #[test]
    fn subscriptions_return_streams() {
        let value = json!({ "routers": { "app": { "procedures": {
            "events": { "kind": "subscription", "input": { "type": "optional", "inner": { "type": "string" } }, "output": { "type": "integer" } }
        } } } });
        let root = compose(value, &Configuration::default()).unwrap().root;
        assert!(root.contains("func events(input: String? = nil) -> AsyncThrowingStream<Int, Error> {\n"));
        assert!(root.contains("TRPCClient.shared.sendSubscription(url: url.appendingPathComponent(\"events\")"));
    }

    #[test]
    fn public_streams_without_output_use_the_public_empty_object() {
        let value = json!({ "routers": { "app": { "procedures": {
            "ticks": { "kind": "subscription" }
        } } } });
        let mut config = Configuration::default();
        config.permission_scope = crate::config::PermissionScope::Public;
        let root = compose(value, &config).unwrap().root;
        assert!(root.contains("public func ticks() -> AsyncThrowingStream<TRPCClient.EmptyObject, Error> {\n"));
        assert!(crate::CLIENT_TEMPLATE.contains("public class TRPCClient {"));
        assert!(crate::CLIENT_TEMPLATE.contains("public struct EmptyObject: Codable {"));
    }

    #[test]
    fn local_models_are_shared_within_a_class() {
        let value = json!({
            "schemas": { "Person": { "type": "object", "name": "Person", "shape": { "name": { "type": "string" } } } },
            "routers": { "app": { "procedures": {
                "get": { "kind": "query", "output": { "$ref": "Person" } },
                "save": { "kind": "mutation", "input": { "$ref": "Person" } },
                "admin.get": { "kind": "query", "output": { "$ref": "Person" } }
            } } }
        });
        let mut config = Configuration::default();
        config.models.make_global = GlobalMode::None;
        let client = compose(value, &config).unwrap();
        assert!(client.registry.is_empty());
        // once in the root class; the nested route sees it through the enclosing scope
        assert_eq!(client.root.matches("struct Person:").count(), 1);
        assert!(client.root.contains("func save(input: Person) async throws {"));
    }

    #[test]
    fn type_aliases_point_into_route_classes() {
        let value = json!({ "routers": { "app": { "procedures": {
            "user.get": { "kind": "query", "output": { "type": "object", "shape": { "id": { "type": "string" } } } },
            "ping": { "kind": "query", "output": { "type": "object", "shape": {} } }
        } } } });
        let mut config = Configuration::default();
        config.create_type_aliases = true;
        let client = compose(value, &config).unwrap();
        assert_eq!(
            client.aliases,
            [
                "typealias UserGetOutput = App.UserRoute.GetOutput",
                "typealias PingOutput = App.PingOutput",
            ]
        );
    }

    #[test]
    fn include_all_compiles_unreferenced_named_models() {
        let value = json!({
            "schemas": {
                "Role": { "type": "enum", "name": "Role", "values": ["admin", "user"] },
                "Unnamed": { "type": "object", "shape": {} }
            },
            "routers": { "app": { "procedures": { "ping": { "kind": "query" } } } }
        });
        let mut config = Configuration::default();
        config.models.include = ModelInclusion::All;
        let client = compose(value.clone(), &config).unwrap();
        assert_eq!(client.registry.len(), 1);

        config.models.make_global = GlobalMode::None;
        let client = compose(value, &config).unwrap();
        assert!(client.registry.is_empty());
        assert!(client.root.contains("enum Role: String, Codable, Equatable {"));
        assert!(!client.root.contains("Unnamed"));
    }
}
