//! Enum and literal schemas → `String`-backed Swift enums.

use std::collections::HashSet;

use super::Compiler;
use crate::naming;
use crate::schema::Literal;

/// Case labels for raw values, in order. Labels that would collide get a
/// numeric suffix.
pub(super) fn case_labels(raws: &[&str]) -> Vec<String> {
    let mut taken = HashSet::new();
    raws.iter()
        .enumerate()
        .map(|(ix, raw)| {
            let mut base = naming::field_name(raw);
            if base == "_" {
                base = format!("value{}", ix + 1);
            }
            let mut label = base.clone();
            let mut n = 2;
            while taken.contains(&label) {
                label = format!("{base}{n}");
                n += 1;
            }
            taken.insert(label.clone());
            label
        })
        .collect()
}

impl Compiler<'_> {
    /// `None` when no value is a string: there is nothing to declare.
    pub(super) fn define_enum(
        &self,
        name: &str,
        description: Option<&str>,
        values: &[Literal],
    ) -> Option<String> {
        let mut raws: Vec<&str> = Vec::with_capacity(values.len());
        for raw in values.iter().filter_map(Literal::as_str) {
            if !raws.contains(&raw) {
                raws.push(raw);
            }
        }
        if raws.is_empty() {
            return None;
        }

        let mut out = String::new();
        if let Some(description) = description {
            out.push_str(&naming::doc_comment(description));
        }
        out.push_str(&format!(
            "{}enum {name}: String, {} {{\n",
            self.access(),
            self.config.conformance.enum_clause()
        ));
        for (label, raw) in case_labels(&raws).iter().zip(&raws) {
            out.push_str(&format!("case {label} = {}\n", naming::string_literal(raw)));
        }
        out.push_str("}\n");
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Conformance, Configuration};
    use crate::schema::SchemaGraph;

    #[test]
    fn labels_are_escaped_and_deduplicated() {
        assert_eq!(
            case_labels(&["active", "in-progress", "default", "in_progress", "", "2fa"]),
            ["active", "inProgress", "_default", "inProgress2", "value5", "_2fa"]
        );
        assert_eq!(case_labels(&["as", "Self", "Type"]), ["_as", "_Self", "_Type"]);
    }

    #[test]
    fn enums_keep_string_values_in_order() {
        let graph = SchemaGraph::new();
        let mut config = Configuration::default();
        config.conformance = Conformance::from_list("Hashable");
        let compiler = Compiler::new(&graph, &config);
        let values = [
            Literal::String("b\"q".into()),
            Literal::Number(1.0),
            Literal::String("a".into()),
            Literal::String("a".into()),
        ];
        assert_eq!(
            compiler.define_enum("Letter", Some("Letters"), &values).unwrap(),
            "/// Letters\nenum Letter: String, Codable, Hashable {\ncase bQ = \"b\\\"q\"\ncase a = \"a\"\n}\n"
        );
    }

    #[test]
    fn enums_without_strings_are_not_declared() {
        let graph = SchemaGraph::new();
        let config = Configuration::default();
        let compiler = Compiler::new(&graph, &config);
        assert_eq!(compiler.define_enum("N", None, &[Literal::Null, Literal::Bool(true)]), None);
    }
}
