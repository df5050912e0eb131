//! Union schemas → one-of structs.
//!
//! Swift has no closed union with payload that survives a JSON round trip, so
//! a union becomes a struct with one optional property per alternative.
//! Decoding tries the alternatives in declaration order and keeps the first
//! that parses; encoding writes the first property that is set.

use super::{Compiler, LocalModels};
use crate::error::Result;
use crate::naming;
use crate::registry::Scope;
use crate::schema::SchemaId;

struct Alternative {
    property: String,
    /// non-optional payload type
    signature: String,
}

/// One attempt in the decoder, in declaration order.
enum Step {
    Null,
    Decode(usize),
}

impl Compiler<'_> {
    pub(super) fn define_union(
        &mut self,
        name: &str,
        description: Option<&str>,
        options: &[SchemaId],
        scope: &Scope,
        model_depth: usize,
    ) -> Result<Option<String>> {
        let mut alternatives: Vec<Alternative> = Vec::with_capacity(options.len());
        let mut steps: Vec<Step> = Vec::with_capacity(options.len());
        let mut locals = LocalModels::default();

        for (ix, option) in options.iter().enumerate() {
            let n = ix + 1;
            let location = format!("{name}.option{n}");
            let nullable = self.admits_null(*option);
            if nullable && !steps.iter().any(|s| matches!(s, Step::Null)) {
                steps.push(Step::Null);
            }

            let mut branch = scope.clone();
            let mut ctx = Self::member_context(&mut branch, model_depth, true, format!("Option{n}"));
            let result = match self.compile(*option, &mut ctx) {
                Ok(Some(result)) => result,
                Ok(None) => continue,
                Err(error) => {
                    self.report(location, error);
                    continue;
                }
            };
            if let Some(local) = result.local {
                if let Err(error) = locals.absorb(local) {
                    self.report(location, error);
                    continue;
                }
            }

            let signature = result.signature.trim_end_matches('?').to_string();
            let taken = |p: &str| alternatives.iter().any(|a| a.property == p);
            let mut property = naming::alternative_name(&signature)
                .filter(|p| !taken(p.as_str()))
                .unwrap_or_else(|| format!("option{n}"));
            while taken(property.as_str()) {
                property.push('_');
            }
            steps.push(Step::Decode(alternatives.len()));
            alternatives.push(Alternative {
                property,
                signature,
            });
        }

        if alternatives.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.render_union(name, description, &alternatives, &steps, &locals)))
    }

    fn render_union(
        &self,
        name: &str,
        description: Option<&str>,
        alternatives: &[Alternative],
        steps: &[Step],
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
        for a in alternatives {
            out.push_str(&format!("{access}var {}: {}?\n", a.property, a.signature));
        }

        if !locals.is_empty() {
            out.push('\n');
            out.push_str(&locals.render());
        }

        for a in alternatives {
            out.push_str(&format!(
                "\n{access}init({0}: {1}) {{\nself.{0} = {0}\n}}\n",
                a.property, a.signature
            ));
        }

        out.push_str(&format!("\n{access}init(from decoder: Decoder) throws {{\n"));
        out.push_str("let container = try decoder.singleValueContainer()\n");
        for step in steps {
            match step {
                Step::Null => out.push_str("if container.decodeNil() {\nreturn\n}\n"),
                Step::Decode(ix) => {
                    let a = &alternatives[*ix];
                    out.push_str(&format!(
                        "if let value = try? container.decode({}.self) {{\nself.{} = value\nreturn\n}}\n",
                        a.signature, a.property
                    ));
                }
            }
        }
        out.push_str(&format!(
            "throw DecodingError.dataCorruptedError(in: container, debugDescription: {})\n}}\n",
            naming::string_literal(&format!("No alternative of {name} matched the payload"))
        ));

        out.push_str(&format!("\n{access}func encode(to encoder: Encoder) throws {{\n"));
        out.push_str("var container = encoder.singleValueContainer()\n");
        for a in alternatives {
            out.push_str(&format!(
                "if let value = {} {{\ntry container.encode(value)\nreturn\n}}\n",
                a.property
            ));
        }
        out.push_str("try container.encodeNil()\n}\n");

        out.push_str("}\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::compile::{CompileContext, Compiler};
    use crate::config::Configuration;
    use crate::registry::Scope;
    use crate::schema::{Primitive, SchemaGraph, SchemaId, SchemaKind, SchemaMeta};

    fn compile(graph: &SchemaGraph, id: SchemaId) -> (String, Vec<String>) {
        let config = Configuration::default();
        let mut compiler = Compiler::new(graph, &config);
        let mut scope = Scope::new();
        let result = compiler
            .compile(id, &mut CompileContext::new(&mut scope, "Value"))
            .unwrap()
            .unwrap();
        let (registry, _) = compiler.finish();
        let definition = match result.local {
            Some(local) => local.definition,
            None => String::new(),
        };
        (definition, registry.definitions().map(String::from).collect())
    }

    fn person(g: &mut SchemaGraph) -> SchemaId {
        let s = g.add(SchemaKind::Primitive(Primitive::String));
        let i = g.add(SchemaKind::Primitive(Primitive::Integer));
        g.add_with_meta(
            SchemaKind::Object {
                fields: vec![("name".into(), s), ("age".into(), i)],
            },
            SchemaMeta {
                name: Some("Person".into()),
                ..SchemaMeta::default()
            },
        )
    }

    #[test]
    fn alternatives_decode_in_declaration_order() {
        let mut g = SchemaGraph::new();
        let s = g.add(SchemaKind::Primitive(Primitive::String));
        let i = g.add(SchemaKind::Primitive(Primitive::Integer));
        let p = person(&mut g);
        let union = g.add(SchemaKind::Union { options: vec![s, i, p] });
        let (def, globals) = compile(&g, union);

        assert!(def.starts_with("struct Value: Codable, Equatable {\nvar string: String?\nvar int: Int?\nvar person: Person?\n"));
        let string = def.find("try? container.decode(String.self)").unwrap();
        let int = def.find("try? container.decode(Int.self)").unwrap();
        let person = def.find("try? container.decode(Person.self)").unwrap();
        assert!(string < int && int < person);
        assert!(def.contains("init(person: Person) {\nself.person = person\n}\n"));
        assert!(def.contains("if let value = person {\ntry container.encode(value)\nreturn\n}\n"));
        assert!(!def.contains("decodeNil"));
        assert_eq!(globals.len(), 1);
    }

    #[test]
    fn non_identifier_and_duplicate_signatures_use_positions() {
        let mut g = SchemaGraph::new();
        let s = g.add(SchemaKind::Primitive(Primitive::String));
        let s2 = g.add(SchemaKind::Primitive(Primitive::String));
        let arr = g.add(SchemaKind::Collection {
            kind: crate::schema::CollectionKind::Array,
            element: s,
        });
        let union = g.add(SchemaKind::Union { options: vec![s, s2, arr] });
        let (def, _) = compile(&g, union);
        assert!(def.contains("var string: String?\nvar option2: String?\nvar option3: [String]?\n"));
    }

    #[test]
    fn nullable_alternatives_accept_null_in_position() {
        let mut g = SchemaGraph::new();
        let i = g.add(SchemaKind::Primitive(Primitive::Integer));
        let null = g.add(SchemaKind::Empty);
        let s = g.add(SchemaKind::Primitive(Primitive::String));
        let opt = g.add(SchemaKind::Optional(s));
        let union = g.add(SchemaKind::Union { options: vec![i, null, opt] });
        let (def, _) = compile(&g, union);
        assert!(def.contains("var int: Int?\nvar string: String?\n"));
        let int = def.find("decode(Int.self)").unwrap();
        let nil = def.find("container.decodeNil()").unwrap();
        let string = def.find("decode(String.self)").unwrap();
        assert!(int < nil && nil < string);
        assert_eq!(def.matches("decodeNil").count(), 1);
    }

    #[test]
    fn anonymous_alternatives_are_nested_with_positional_names() {
        let mut g = SchemaGraph::new();
        let s = g.add(SchemaKind::Primitive(Primitive::String));
        let obj = g.add(SchemaKind::Object { fields: vec![("id".into(), s)] });
        let union = g.add(SchemaKind::Union { options: vec![s, obj] });
        let (def, globals) = compile(&g, union);
        assert!(def.contains("var option2: Option2?\n"));
        assert!(def.contains("struct Option2: Codable, Equatable {"));
        assert!(globals.is_empty());
    }

    #[test]
    fn unions_of_nothing_are_omitted() {
        let mut g = SchemaGraph::new();
        let void = g.add(SchemaKind::Empty);
        let union = g.add(SchemaKind::Union { options: vec![void] });
        let config = Configuration::default();
        let mut compiler = Compiler::new(&g, &config);
        let mut scope = Scope::new();
        let result = compiler
            .compile(union, &mut CompileContext::new(&mut scope, "Value"))
            .unwrap();
        assert!(result.is_none());
        assert!(!scope.contains(union));
    }
}
