//! hack-slicer — extract a self-contained, type-checkable slice of a Hack
//! codebase around a single entry point.
//!
//! Given a top-level function or a method, the pipeline drives the external
//! type-checker to record dependency edges, closes the set under signature
//! walks, synthesizes throwing stubs for every dependency with all type
//! signatures preserved, lays them out by namespace, and returns source text
//! that type-checks on its own next to the entry point's literal body.
//!
//! # Quick start
//!
//! Extract from a JSON project description (suitable for scripting):
//!
//! ```no_run
//! use std::path::Path;
//!
//! let slice = hack_slicer::run(Path::new("project.json"), "\\N\\foo").unwrap();
//! println!("{slice}");
//! ```
//!
//! Or bring your own collaborators and drive the pipeline directly:
//!
//! ```no_run
//! use hack_slicer::project::{Program, ProgramDb};
//!
//! let db = ProgramDb::new(Program::default());
//! let result = hack_slicer::extract(db.services(), "\\N\\Cls::method");
//! ```

use std::path::Path;

use tracing::info;

pub mod collect;
pub mod dep;
pub mod error;
pub mod init;
pub mod layout;
pub mod names;
pub mod printer;
pub mod project;
pub mod provider;
pub mod synth;
pub mod ty;

pub use dep::{Dep, EntryPoint, MemberKind};
pub use error::{Error, Result};
pub use provider::Services;

/// The malformed-request diagnostic, verbatim.
const UNRECOGNIZED_INPUT: &str = "Unrecognized input. Expected: fully qualified function name \
     or [fully qualified class name]::[method_name]";

/// Load a JSON program description and extract `request` from it.
///
/// This is the complete load-and-extract workflow in a single call, intended
/// for the CLI and other scripted callers.
pub fn run(program_path: &Path, request: &str) -> anyhow::Result<String> {
    let db = project::ProgramDb::load(program_path)?;
    Ok(extract(db.services(), request))
}

/// Extract `request` and translate every failure into its user-visible
/// string. This never fails: diagnostics are part of the result surface.
pub fn extract(services: Services<'_>, request: &str) -> String {
    info!(request, "extracting standalone slice");
    match EntryPoint::parse(request).and_then(|entry| try_extract(services, &entry)) {
        Ok(text) => text,
        Err(err) => render_error(&err),
    }
}

/// Extract a parsed entry point, surfacing structured errors.
pub fn try_extract(services: Services<'_>, entry: &EntryPoint) -> Result<String> {
    ensure_entry_exists(services, entry)?;
    let collected = collect::collect(services, entry)?;
    let table = synth::synthesize(services, entry, &collected)?;
    Ok(layout::emit(services.formatter, &table))
}

fn ensure_entry_exists(services: Services<'_>, entry: &EntryPoint) -> Result<()> {
    match entry {
        EntryPoint::Function(name) => match services.decls.get_fun(name) {
            Some(_) => Ok(()),
            None => Err(Error::NotFound),
        },
        EntryPoint::Member(class, MemberKind::Method(method)) => {
            let cls = services.decls.get_class(class).ok_or(Error::NotFound)?;
            if cls.method(method).is_some() || cls.smethod(method).is_some() {
                Ok(())
            } else {
                Err(Error::NotFound)
            }
        }
        EntryPoint::Member(..) => Err(Error::InvalidInput),
    }
}

fn render_error(err: &Error) -> String {
    match err {
        Error::NotFound => "Not found!".to_string(),
        Error::InvalidInput => UNRECOGNIZED_INPUT.to_string(),
        Error::DependencyNotFound(desc) => format!("Dependency not found: {desc}"),
        Error::Unsupported { message, backtrace }
        | Error::UnexpectedDependency { message, backtrace } => {
            format!("{message}\n{backtrace}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{Program, ProgramDb};

    #[test]
    fn missing_entry_point_reports_not_found() {
        let db = ProgramDb::new(Program::default());
        assert_eq!(extract(db.services(), "\\nowhere"), "Not found!");
        assert_eq!(extract(db.services(), "\\No\\Cls::m"), "Not found!");
    }

    #[test]
    fn malformed_request_reports_unrecognized_input() {
        let db = ProgramDb::new(Program::default());
        let out = extract(db.services(), "not a request");
        assert!(out.starts_with("Unrecognized input."), "got: {out}");
    }

    #[test]
    fn property_entry_point_is_rejected() {
        let db = ProgramDb::new(Program::default());
        let out = extract(db.services(), "\\C::$p");
        assert!(out.starts_with("Unrecognized input."), "got: {out}");
    }
}
