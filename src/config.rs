//! Generator configuration. Every section has a default, so a partial file
//! merges with the defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{GeneratorError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PermissionScope {
    #[default]
    Internal,
    Public,
}

/// Which named models are hoisted to global scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GlobalMode {
    #[default]
    All,
    /// only named models referenced directly by a procedure input/output
    Top,
    None,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcedureInclusion {
    #[default]
    All,
    None,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelInclusion {
    All,
    #[default]
    Referenced,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Conformance {
    pub structs: Vec<String>,
    pub enums: Vec<String>,
}

impl Default for Conformance {
    fn default() -> Self {
        Self {
            structs: vec!["Equatable".to_string()],
            enums: vec!["Equatable".to_string()],
        }
    }
}

impl Conformance {
    /// Same protocol list for structs and enums, from `"Equatable, Hashable"`.
    pub fn from_list(list: &str) -> Self {
        let protocols: Vec<String> = list
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            structs: protocols.clone(),
            enums: protocols,
        }
    }

    fn render(extra: &[String]) -> String {
        let mut protocols = vec!["Codable"];
        for p in extra {
            if !protocols.contains(&p.as_str()) {
                protocols.push(p);
            }
        }
        protocols.join(", ")
    }

    /// `Codable, Equatable, ...`
    pub fn struct_clause(&self) -> String {
        Self::render(&self.structs)
    }

    pub fn enum_clause(&self) -> String {
        Self::render(&self.enums)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProcedurePolicy {
    pub include: ProcedureInclusion,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelPolicy {
    pub include: ModelInclusion,
    pub make_global: GlobalMode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LiteralPolicy {
    pub auto_assign_in_initializers: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Configuration {
    pub permission_scope: PermissionScope,
    pub conformance: Conformance,
    pub procedures: ProcedurePolicy,
    pub models: ModelPolicy,
    pub literals: LiteralPolicy,
    pub create_type_aliases: bool,
    pub create_shared: bool,
    pub quiet: bool,
    /// router to export from the definition document
    pub router: Option<String>,
    /// definition document path
    pub input: Option<PathBuf>,
    pub out_file: Option<PathBuf>,
    /// replaces the bundled runtime client text
    pub template: Option<PathBuf>,
}

impl Configuration {
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| GeneratorError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&source, &path.display().to_string())
    }

    pub fn from_json_str(source: &str, origin: &str) -> Result<Self> {
        crate::path_de::from_str_with_path(source, origin)
    }

    /// `"public "` or nothing, prefixed to every declaration.
    pub fn access_prefix(&self) -> &'static str {
        match self.permission_scope {
            PermissionScope::Public => "public ",
            PermissionScope::Internal => "",
        }
    }

    pub fn is_public(&self) -> bool {
        self.permission_scope == PermissionScope::Public
    }
}
