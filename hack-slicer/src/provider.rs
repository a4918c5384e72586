//! Collaborator traits.
//!
//! The type-checker, decl provider, source reader and output formatter are
//! external services; the pipeline only ever talks to them through these
//! traits. Dependency edges are delivered through a callback passed to each
//! `type_*` call — the scoped equivalent of the checker's named callback
//! registry, with no global state to collide on.

use crate::dep::Dep;
use crate::error::{Error, Result};
use crate::names;
use crate::printer::TypePrinter;
use crate::ty::{ClassDecl, FunDecl, GConstDecl, Pos, TypedefDecl};

/// Read-only access to the program's declarations.
pub trait DeclProvider {
    fn get_class(&self, name: &str) -> Option<&ClassDecl>;
    fn get_typedef(&self, name: &str) -> Option<&TypedefDecl>;
    fn get_fun(&self, name: &str) -> Option<&FunDecl>;
    fn get_gconst(&self, name: &str) -> Option<&GConstDecl>;
}

/// The external type-checker. Checking a declaration reports every
/// dependency edge it records through `on_edge(source, target)`.
pub trait TypeChecker {
    fn type_fun(&self, file: &str, name: &str, on_edge: &mut dyn FnMut(&Dep, &Dep));
    fn type_class(&self, file: &str, name: &str, on_edge: &mut dyn FnMut(&Dep, &Dep));
}

/// Whole-file reads plus span slicing, for inlining entry-point bodies.
pub trait SourceReader {
    fn read(&self, file: &str) -> Option<String>;

    fn text_at(&self, pos: &Pos) -> Option<String> {
        let text = self.read(&pos.file)?;
        text.get(pos.start..pos.end).map(str::to_string)
    }
}

/// Best-effort source formatter. On failure the raw text is used.
pub trait Formatter {
    fn format(&self, text: &str) -> anyhow::Result<String>;
}

/// The collaborator bundle threaded through the pipeline.
#[derive(Copy, Clone)]
pub struct Services<'a> {
    pub decls: &'a dyn DeclProvider,
    pub checker: &'a dyn TypeChecker,
    pub source: &'a dyn SourceReader,
    pub printer: &'a dyn TypePrinter,
    pub formatter: &'a dyn Formatter,
}

fn is_hhi(file: &str) -> bool {
    file.ends_with(names::HHI_SUFFIX)
}

/// Does `name` denote a standard-library type? Classes and typedefs share
/// one namespace, so both tables are consulted.
fn type_is_builtin(decls: &dyn DeclProvider, name: &str) -> Result<bool> {
    if let Some(cls) = decls.get_class(name) {
        return Ok(is_hhi(&cls.pos.file));
    }
    if let Some(td) = decls.get_typedef(name) {
        return Ok(is_hhi(&td.pos.file));
    }
    Err(Error::DependencyNotFound(name.to_string()))
}

/// Resolves a node against the provider and reports whether its declaring
/// file is a header-interface stub. Builtins are never added to the graph
/// and never synthesized.
pub fn is_builtin(decls: &dyn DeclProvider, dep: &Dep) -> Result<bool> {
    match dep {
        Dep::Class(name) | Dep::Extends(name) => type_is_builtin(decls, name),
        Dep::Cstr(class) | Dep::AllMembers(class) => type_is_builtin(decls, class),
        Dep::Method { class, .. }
        | Dep::SMethod { class, .. }
        | Dep::Prop { class, .. }
        | Dep::SProp { class, .. }
        | Dep::Const { class, .. } => type_is_builtin(decls, class),
        Dep::Fun(name) | Dep::FunName(name) => match decls.get_fun(name) {
            Some(f) => Ok(is_hhi(&f.pos.file)),
            None => Err(Error::DependencyNotFound(name.to_string())),
        },
        Dep::GConst(name) | Dep::GConstName(name) => {
            if names::is_pseudo_const(name) {
                return Ok(true);
            }
            match decls.get_gconst(name) {
                Some(c) => Ok(is_hhi(&c.pos.file)),
                None => Err(Error::DependencyNotFound(name.to_string())),
            }
        }
        Dep::RecordDef(name) => {
            Err(Error::unsupported(format!("record definition {name}")))
        }
    }
}
