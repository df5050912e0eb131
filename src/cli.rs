//! CLI: router definition document → Swift client file
use std::path::{Path, PathBuf};

use clap::Parser;

use crate::config::{Conformance, Configuration, GlobalMode, PermissionScope};
use crate::error::{GeneratorError, Result};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate a typed Swift client from a tRPC router definition document
#[derive(Parser, Debug)]
#[command(name = "trpc-swift", version)]
pub struct CommandLineInterface {
    /// name of the router to export, as listed under `routers` in the document
    #[arg(short = 'n', long = "router-name")]
    router_name: Option<String>,

    /// router definition document (.json)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// output .swift file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// emit top-level type aliases for types nested in route classes
    #[arg(short = 'a', long, default_value_t = false)]
    create_type_aliases: bool,

    /// add a `shared` singleton to the root class
    #[arg(short = 's', long, default_value_t = false)]
    create_shared: bool,

    /// which named models are hoisted to global scope
    #[arg(short = 'g', long, value_enum)]
    global_mode: Option<GlobalMode>,

    /// protocols every generated model conforms to, comma separated (e.g. "Equatable, Hashable")
    #[arg(short = 'c', long)]
    conformance: Option<String>,

    /// access level of the generated declarations
    #[arg(long, value_enum)]
    permission_scope: Option<PermissionScope>,

    /// JSON configuration file; flags given here take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Swift runtime client text to use instead of the bundled one
    #[arg(long)]
    template: Option<PathBuf>,

    /// only print fatal errors
    #[arg(short, long, default_value_t = false)]
    quiet: bool,
}

/// What a successful run produced.
#[derive(Debug)]
pub struct Summary {
    pub out_file: PathBuf,
    /// procedures and fields left out of the client
    pub skipped: usize,
    pub quiet: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Configuration file (or defaults) with the command line applied on top.
    pub fn configuration(&self) -> Result<Configuration> {
        let mut config = match &self.config {
            Some(path) => Configuration::load(path)?,
            None => Configuration::default(),
        };
        if let Some(router) = &self.router_name {
            config.router = Some(router.clone());
        }
        if let Some(input) = &self.input {
            config.input = Some(input.clone());
        }
        if let Some(output) = &self.output {
            config.out_file = Some(output.clone());
        }
        if let Some(template) = &self.template {
            config.template = Some(template.clone());
        }
        if let Some(mode) = self.global_mode {
            config.models.make_global = mode;
        }
        if let Some(list) = &self.conformance {
            config.conformance = Conformance::from_list(list);
        }
        if let Some(scope) = self.permission_scope {
            config.permission_scope = scope;
        }
        config.create_type_aliases |= self.create_type_aliases;
        config.create_shared |= self.create_shared;
        config.quiet |= self.quiet;
        Ok(config)
    }

    /// Generate the whole file in memory, then write it; nothing is written on error.
    pub fn run(&self) -> Result<Summary> {
        let config = self.configuration()?;
        let router = required(config.router.as_deref(), "router name (--router-name)")?;
        let input = required(config.input.as_deref(), "input document (--input)")?;
        let out_file = required(config.out_file.as_deref(), "output file (--output)")?;

        let template = match &config.template {
            Some(path) => read(path)?,
            None => crate::CLIENT_TEMPLATE.to_string(),
        };
        let document = crate::RouterDocument::load(input)?;
        let generation = crate::generate(&document, router, &config, &template)?;

        if let Some(parent) = out_file.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
            }
        }
        std::fs::write(out_file, &generation.source).map_err(|source| io_error(out_file, source))?;
        tracing::debug!(out_file = %out_file.display(), bytes = generation.source.len(), "wrote client");

        Ok(Summary {
            out_file: out_file.to_path_buf(),
            skipped: generation.diagnostics.len(),
            quiet: config.quiet,
        })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn required<'a, T: ?Sized>(value: Option<&'a T>, what: &str) -> Result<&'a T> {
    value.ok_or_else(|| GeneratorError::Config(format!("missing {what}")))
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| io_error(path, source))
}

fn io_error(path: &Path, source: std::io::Error) -> GeneratorError {
    GeneratorError::Io {
        path: path.display().to_string(),
        source,
    }
}
