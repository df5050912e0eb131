//! Generate a typed Swift client from a tRPC router definition.
//!
//! The pipeline runs one way: [`document`] loads the router definition
//! document, [`router::build_structure`] nests the procedures by path,
//! [`compose::Composer`] renders the route classes (calling the
//! [`compile::Compiler`] for every input and output), and [`generate`]
//! assembles the runtime client, the global models and the root class into a
//! single re-indented Swift file.

pub mod cli;
pub mod compile;
pub mod compose;
pub mod config;
pub mod document;
pub mod error;
pub mod format;
pub mod naming;
mod path_de;
pub mod registry;
pub mod router;
pub mod schema;

pub use config::Configuration;
pub use document::RouterDocument;
pub use error::{Diagnostic, GeneratorError, Result};

use compose::Composer;

/// Runtime client text placed at the top of every generated file.
pub const CLIENT_TEMPLATE: &str = include_str!("../templates/TRPCClient.swift");

/// A generated Swift source file and the recoverable errors met on the way.
#[derive(Debug)]
pub struct Generation {
    pub source: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Generate the client for `router` exported by `document`.
///
/// The output holds, in order: `template`, every globally promoted model, the
/// type aliases (when enabled) and the root route class. Fatal errors return
/// `Err`; anything that was only left out is listed in
/// [`Generation::diagnostics`].
pub fn generate(
    document: &RouterDocument,
    router: &str,
    config: &Configuration,
    template: &str,
) -> Result<Generation> {
    let procedures = document.router(router)?;
    let tree = router::build_structure(procedures)?;
    tracing::debug!(router, procedures = procedures.len(), "composing client");

    let client = Composer::new(&document.graph, config).compose(router, &tree, &document.definitions)?;

    let mut out = String::with_capacity(template.len() + client.root.len() * 2);
    out.push_str(template);
    out.push_str("\n\n");
    for definition in client.registry.definitions() {
        out.push_str(definition);
        out.push('\n');
    }
    if !client.aliases.is_empty() {
        for alias in &client.aliases {
            out.push_str(alias);
            out.push('\n');
        }
        out.push('\n');
    }
    out.push_str(&client.root);

    Ok(Generation {
        source: format::indent(&out),
        diagnostics: client.diagnostics,
    })
}
