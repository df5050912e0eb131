//! Object schemas → Swift structs.

use super::{CompileContext, Compiler, LocalModels, TypeResult};
use crate::error::{GeneratorError, Result};
use crate::naming;
use crate::registry::Scope;
use crate::schema::{Literal, SchemaId, SchemaKind};

struct Property {
    /// key on the wire
    key: String,
    name: String,
    signature: String,
    description: Option<String>,
    /// initializer default for non-optional literal fields
    default: Option<String>,
}

impl Compiler<'_> {
    pub(super) fn define_struct(
        &mut self,
        name: &str,
        description: Option<&str>,
        fields: &[(String, SchemaId)],
        scope: &Scope,
        model_depth: usize,
    ) -> Result<String> {
        let mut properties: Vec<Property> = Vec::with_capacity(fields.len());
        let mut locals = LocalModels::default();

        for (key, field) in fields {
            let location = format!("{name}.{key}");
            let mut branch = scope.clone();
            let mut ctx: CompileContext<'_> =
                Self::member_context(&mut branch, model_depth, false, naming::type_name(key));
            let result = match self.compile(*field, &mut ctx) {
                Ok(Some(result)) => result,
                Ok(None) => continue,
                Err(error) => {
                    self.report(location, error);
                    continue;
                }
            };

            let property = naming::field_name(key);
            if properties.iter().any(|p| p.name == property) {
                self.report(location, GeneratorError::NameCollision(property));
                continue;
            }
            let default = self.literal_default(*field, &result);
            let TypeResult { signature, local } = result;
            if let Some(local) = local {
                if let Err(error) = locals.absorb(local) {
                    self.report(location, error);
                    continue;
                }
            }
            properties.push(Property {
                key: key.clone(),
                name: property,
                signature,
                description: self.graph.meta(*field).description.clone(),
                default,
            });
        }

        Ok(self.render_struct(name, description, &properties, &locals))
    }

    /// `.case` for a required field whose type is a single string literal.
    fn literal_default(&self, field: SchemaId, result: &TypeResult) -> Option<String> {
        if !self.config.literals.auto_assign_in_initializers || result.is_optional() {
            return None;
        }
        let mut current = field;
        for _ in 0..=self.graph.len() {
            match self.graph.kind(current) {
                SchemaKind::Transform(inner) => current = *inner,
                SchemaKind::Literal(Literal::String(value)) => {
                    let label = super::enumeration::case_labels(&[value.as_str()]);
                    return label.into_iter().next().map(|l| format!(".{l}"));
                }
                _ => return None,
            }
        }
        None
    }

    fn render_struct(
        &self,
        name: &str,
        description: Option<&str>,
        properties: &[Property],
        locals: &LocalModels,
    ) -> String {
        let access = self.access();
        let mut out = String::new();
        if let Some(description) = description {
            out.push_str(&naming::doc_comment(description));
        }
        out.push_str(&format!(
            "{access}struct {name}: {} {{\n",
            self.config.conformance.struct_clause()
        ));

        for p in properties {
            if let Some(description) = &p.description {
                out.push_str(&naming::doc_comment(description));
            }
            out.push_str(&format!("{access}var {}: {}\n", p.name, p.signature));
        }

        if !locals.is_empty() {
            out.push('\n');
            out.push_str(&locals.render());
        }

        if properties.iter().any(|p| p.name != p.key) {
            out.push_str("\nenum CodingKeys: String, CodingKey {\n");
            for p in properties {
                if p.name == p.key {
                    out.push_str(&format!("case {}\n", p.name));
                } else {
                    out.push_str(&format!(
                        "case {} = {}\n",
                        p.name,
                        naming::string_literal(&p.key)
                    ));
                }
            }
            out.push_str("}\n");
        }

        let params = properties
            .iter()
            .map(|p| match (&p.default, p.signature.ends_with('?')) {
                (_, true) => format!("{}: {} = nil", p.name, p.signature),
                (Some(default), false) => format!("{}: {} = {default}", p.name, p.signature),
                (None, false) => format!("{}: {}", p.name, p.signature),
            })
            .collect::<Vec<_>>()
            .join(", ");
        if properties.is_empty() {
            out.push_str(&format!("\n{access}init() {{}}\n"));
        } else {
            out.push_str(&format!("\n{access}init({params}) {{\n"));
            for p in properties {
                out.push_str(&format!("self.{0} = {0}\n", p.name));
            }
            out.push_str("}\n");
        }

        out.push_str("}\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::compile::{CompileContext, Compiler};
    use crate::config::{Configuration, PermissionScope};
    use crate::registry::Scope;
    use crate::schema::{Literal, Primitive, SchemaGraph, SchemaId, SchemaKind, SchemaMeta};

    fn definition(graph: &SchemaGraph, config: &Configuration, id: SchemaId) -> String {
        let mut compiler = Compiler::new(graph, config);
        let mut scope = Scope::new();
        let result = compiler
            .compile(id, &mut CompileContext::new(&mut scope, "HelloInput"))
            .unwrap()
            .unwrap();
        result.local.unwrap().definition
    }

    #[test]
    fn optional_fields_default_to_nil() {
        let mut g = SchemaGraph::new();
        let s = g.add(SchemaKind::Primitive(Primitive::String));
        let name = g.add(SchemaKind::Optional(s));
        let age = g.add(SchemaKind::Primitive(Primitive::Integer));
        let obj = g.add(SchemaKind::Object {
            fields: vec![("name".into(), name), ("age".into(), age)],
        });
        let def = definition(&g, &Configuration::default(), obj);
        assert_eq!(
            def,
            "struct HelloInput: Codable, Equatable {\n\
             var name: String?\n\
             var age: Int\n\
             \n\
             init(name: String? = nil, age: Int) {\n\
             self.name = name\n\
             self.age = age\n\
             }\n\
             }\n"
        );
    }

    #[test]
    fn renamed_keys_get_coding_keys() {
        let mut g = SchemaGraph::new();
        let s = g.add(SchemaKind::Primitive(Primitive::String));
        let obj = g.add(SchemaKind::Object {
            fields: vec![("full_name".into(), s), ("default".into(), s), ("id".into(), s)],
        });
        let def = definition(&g, &Configuration::default(), obj);
        assert!(def.contains("var fullName: String\n"));
        assert!(def.contains("var _default: String\n"));
        assert!(def.contains(
            "enum CodingKeys: String, CodingKey {\ncase fullName = \"full_name\"\ncase _default = \"default\"\ncase id\n}\n"
        ));
    }

    #[test]
    fn keyword_keys_are_escaped_and_mapped_back() {
        let mut g = SchemaGraph::new();
        let s = g.add(SchemaKind::Primitive(Primitive::String));
        let obj = g.add(SchemaKind::Object {
            fields: vec![("as".into(), s), ("Self".into(), s)],
        });
        let def = definition(&g, &Configuration::default(), obj);
        assert!(def.contains("var _as: String\nvar _Self: String\n"));
        assert!(def.contains("case _as = \"as\"\ncase _Self = \"Self\"\n"));
        assert!(def.contains("init(_as: String, _Self: String) {"));
    }

    #[test]
    fn colliding_property_names_drop_the_later_field() {
        let mut g = SchemaGraph::new();
        let s = g.add(SchemaKind::Primitive(Primitive::String));
        let obj = g.add(SchemaKind::Object {
            fields: vec![("fullName".into(), s), ("full_name".into(), s)],
        });
        let config = Configuration::default();
        let mut compiler = Compiler::new(&g, &config);
        let mut scope = Scope::new();
        let result = compiler
            .compile(obj, &mut CompileContext::new(&mut scope, "Person"))
            .unwrap()
            .unwrap();
        assert_eq!(result.local.unwrap().definition.matches("var fullName").count(), 1);
        assert_eq!(compiler.diagnostics()[0].location, "Person.full_name");
    }

    #[test]
    fn descriptions_become_doc_comments() {
        let mut g = SchemaGraph::new();
        let s = g.add_with_meta(
            SchemaKind::Primitive(Primitive::String),
            SchemaMeta {
                description: Some("The greeting".into()),
                ..SchemaMeta::default()
            },
        );
        let obj = g.add_with_meta(
            SchemaKind::Object { fields: vec![("message".into(), s)] },
            SchemaMeta {
                description: Some("Reply".into()),
                ..SchemaMeta::default()
            },
        );
        let def = definition(&g, &Configuration::default(), obj);
        assert!(def.starts_with("/// Reply\nstruct HelloInput"));
        assert!(def.contains("/// The greeting\nvar message: String\n"));
    }

    #[test]
    fn shared_sibling_models_are_defined_once() {
        let mut g = SchemaGraph::new();
        let s = g.add(SchemaKind::Primitive(Primitive::String));
        let address = g.add(SchemaKind::Object { fields: vec![("street".into(), s)] });
        let obj = g.add(SchemaKind::Object {
            fields: vec![("home".into(), address), ("work".into(), address)],
        });
        let def = definition(&g, &Configuration::default(), obj);
        assert_eq!(def.matches("struct Home:").count(), 1);
        assert!(def.contains("var home: Home\n"));
        assert!(def.contains("var work: Home\n"));
    }

    #[test]
    fn literal_fields_can_default_in_the_initializer() {
        let mut g = SchemaGraph::new();
        let kind = g.add(SchemaKind::Literal(Literal::String("user".into())));
        let obj = g.add(SchemaKind::Object { fields: vec![("kind".into(), kind)] });
        let mut config = Configuration::default();
        config.literals.auto_assign_in_initializers = true;
        config.permission_scope = PermissionScope::Public;
        let def = definition(&g, &config, obj);
        assert!(def.contains("public init(kind: Kind = .user) {"));
        assert!(def.contains("public enum Kind: String, Codable, Equatable {\ncase user = \"user\"\n}"));
    }

    #[test]
    fn empty_objects_still_get_an_initializer() {
        let mut g = SchemaGraph::new();
        let obj = g.add(SchemaKind::Object { fields: Vec::new() });
        let def = definition(&g, &Configuration::default(), obj);
        assert_eq!(def, "struct HelloInput: Codable, Equatable {\n\ninit() {}\n}\n");
    }
}
